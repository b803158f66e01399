use crate::connector::{ConnectorError, SinkConnector, SourceConnector};
use crate::transport::Transport;
use conduit_config::{ConduitConfig, ConfigError, load_config};
use conduit_events::{Event, EventHub};
use conduit_pipeline::Pipeline;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A configured hub plus factories for the connectors that feed and drain it.
#[derive(Debug)]
pub struct Conduit<T> {
    hub: EventHub<T>,
    config: Arc<ConduitConfig>,
}

impl<T> Clone for Conduit<T> {
    fn clone(&self) -> Self {
        Self { hub: self.hub.clone(), config: Arc::clone(&self.config) }
    }
}

impl<T: Event> Conduit<T> {
    /// Builds the hub described by `config`.
    #[must_use]
    pub fn from_config(config: &ConduitConfig) -> Self {
        let hub = EventHub::builder()
            .wait_for_subscribers(config.events.wait_for_subscribers)
            .build();
        info!(wait_for_subscribers = config.events.wait_for_subscribers, "Conduit hub ready");
        Self { hub, config: Arc::new(config.clone()) }
    }

    /// Reads settings with [`load_config`] and builds the hub from them.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the settings cannot be loaded.
    pub fn load(path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let config: ConduitConfig = load_config(path)?;
        Ok(Self::from_config(&config))
    }

    #[must_use]
    pub const fn hub(&self) -> &EventHub<T> {
        &self.hub
    }

    #[must_use]
    pub fn config(&self) -> &ConduitConfig {
        &self.config
    }

    /// An inbound connector publishing to `channel`.
    ///
    /// # Errors
    /// Returns [`ConnectorError::Hub`] if `channel` is not a valid name.
    pub fn source<In: Send + 'static>(
        &self,
        channel: &str,
        pipeline: Pipeline<In, T>,
    ) -> Result<SourceConnector<In, T>, ConnectorError> {
        SourceConnector::new(self.hub.clone(), channel, pipeline)
    }

    /// An outbound connector draining `channel` into `transport`. Call
    /// [`SinkConnector::connect`] to start it.
    ///
    /// # Errors
    /// Returns [`ConnectorError::Hub`] if `channel` is not a valid name.
    pub fn sink<Tr: Transport>(
        &self,
        channel: &str,
        pipeline: Pipeline<Arc<T>, Vec<u8>>,
        transport: Tr,
    ) -> Result<SinkConnector<Tr, T>, ConnectorError> {
        SinkConnector::new(self.hub.clone(), channel, pipeline, transport)
    }
}

/// Installs the global subscriber from `config`.
///
/// # Errors
/// Returns [`LoggerError`](conduit_logger::LoggerError) for an unknown level, a bad
/// filter, or if a subscriber is already installed.
#[cfg(feature = "logging")]
pub fn init_logging(
    config: &conduit_config::LoggingConfig,
) -> Result<conduit_logger::Logger, conduit_logger::LoggerError> {
    conduit_logger::Logger::from_config(config)
}
