//! Facade crate for conduit.
//! Re-exports the hub, pipeline, config and logger crates and adds the transport
//! seam plus the connectors that join transports, pipelines and channels.
//! Keep this crate thin: hub and pipeline semantics live in their own crates.
//!
//! ## Usage
//!
//! ```rust
//! use conduit::config::ConduitConfig;
//! use conduit::pipeline::{ParseInt, Pipeline};
//! use conduit::{Conduit, Ingest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), conduit::ConnectorError> {
//! let conduit = Conduit::<i64>::from_config(&ConduitConfig::default());
//! let source = conduit.source("temp", Pipeline::<String>::new().add(ParseInt))?;
//!
//! assert_eq!(source.ingest("72".to_owned()).await?, Ingest::Published { issued: 0 });
//! assert_eq!(conduit.hub().last_event("temp")?.as_deref(), Some(&72));
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod connector;
mod transport;

pub use conduit_config as config;
pub use conduit_events as events;
#[cfg(feature = "logging")]
pub use conduit_logger as logger;
pub use conduit_pipeline as pipeline;

#[cfg(feature = "logging")]
pub use bootstrap::init_logging;
pub use bootstrap::Conduit;
pub use connector::{ConnectorError, ConnectorErrorExt, Ingest, SinkConnector, SourceConnector};
pub use transport::{MemoryTransport, Transport, TransportError, TransportErrorExt};

/// Build-time enabled features (by Cargo feature).
pub mod features {
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "json")]
        "json",
        #[cfg(feature = "logging")]
        "logging",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}
