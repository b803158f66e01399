//! # Conduit Config
//!
//! Loads service settings from a file, then overlays `CONDUIT__*` environment
//! variables. [`ConduitConfig`] describes the settings the hub and logger read;
//! [`load_config`] works for any deserializable type.

mod loader;
mod model;

pub use loader::{ConfigError, ConfigErrorExt, ENV_PREFIX, load_config};
pub use model::{ConduitConfig, EventsConfig, LoggingConfig};
