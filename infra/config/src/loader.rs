use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable prefix; nested keys are joined with `__`.
pub const ENV_PREFIX: &str = "CONDUIT";

const DEFAULT_FILE: &str = "conduit";

#[conduit_derive::conduit_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Builds `T` from a settings file overlaid with environment variables.
///
/// 1. **File**: `path`, or `conduit` in the working directory. The extension may be
///    omitted; any format the `config` crate understands is accepted. The file is
///    required.
/// 2. **Environment**: variables prefixed with `CONDUIT__`. Nested keys use double
///    underscores, so `CONDUIT__EVENTS__WAIT_FOR_SUBSCRIBERS=false` sets
///    `events.wait_for_subscribers`.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or malformed, or the merged
/// values do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use conduit_config::{ConduitConfig, load_config};
///
/// let config: ConduitConfig = load_config(Some("config/hub")).unwrap_or_default();
/// assert!(config.events.wait_for_subscribers);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_FILE), |p| p.as_ref().to_path_buf());
    load_layered(&path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

fn load_layered<T: DeserializeOwned>(path: &Path, environment: Environment) -> Result<T, ConfigError> {
    info!(path = %path.display(), "Loading configuration");

    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(environment)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
