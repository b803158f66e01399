use serde::Deserialize;
use std::path::PathBuf;

/// Root settings of a conduit service.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConduitConfig {
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

/// Hub delivery behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Await every subscriber before `publish` resolves.
    pub wait_for_subscribers: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { wait_for_subscribers: true }
    }
}

/// Subscriber setup. `directory` enables rolling files; `json` and `max_files`
/// only apply to them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub name: String,
    pub level: String,
    pub console: bool,
    pub directory: Option<PathBuf>,
    pub json: bool,
    pub max_files: usize,
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            name: "conduit".to_owned(),
            level: "info".to_owned(),
            console: true,
            directory: None,
            json: false,
            max_files: 10,
            filter: None,
        }
    }
}
