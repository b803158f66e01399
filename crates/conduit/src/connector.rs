use crate::transport::{Transport, TransportError};
use conduit_events::{Event, EventHub, EventHubError, HandlerResult, SubscribeOptions, Subscription};
use conduit_pipeline::{Pipeline, PipelineError};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

#[conduit_derive::conduit_error]
pub enum ConnectorError {
    #[error("Pipeline rejected the value{}: {source}", format_context(.context))]
    Pipeline { source: PipelineError, context: Option<Cow<'static, str>> },

    #[error("Hub error{}: {source}", format_context(.context))]
    Hub { source: EventHubError, context: Option<Cow<'static, str>> },

    #[error("Transport error{}: {source}", format_context(.context))]
    Transport { source: TransportError, context: Option<Cow<'static, str>> },

    /// `connect` on a connected sink, or `disconnect` on a disconnected one.
    #[error("Invalid connector state{}: {message}", format_context(.context))]
    State { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// What [`SourceConnector::ingest`] did with a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The pipeline produced an event; `issued` deliveries were started.
    Published { issued: usize },
    /// A stage dropped the value on purpose; nothing was published.
    Filtered,
}

/// Inbound glue: raw transport data, through a pipeline, onto a hub channel.
pub struct SourceConnector<In, T> {
    hub: EventHub<T>,
    channel: Arc<str>,
    pipeline: Pipeline<In, T>,
}

impl<In, T> fmt::Debug for SourceConnector<In, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConnector")
            .field("channel", &self.channel)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl<In, T> SourceConnector<In, T>
where
    In: Send + 'static,
    T: Event,
{
    /// Binds `pipeline` to `channel` on `hub`. The channel is created if needed.
    ///
    /// # Errors
    /// Returns [`ConnectorError::Hub`] if `channel` is not a valid name.
    pub fn new(
        hub: EventHub<T>,
        channel: &str,
        pipeline: Pipeline<In, T>,
    ) -> Result<Self, ConnectorError> {
        hub.channel(channel)?;
        Ok(Self { hub, channel: Arc::from(channel), pipeline })
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Runs `raw` through the pipeline and publishes the result.
    ///
    /// # Errors
    /// Returns [`ConnectorError::Pipeline`] when a stage fails or panics. The hub is
    /// not touched in that case.
    pub async fn ingest(&self, raw: In) -> Result<Ingest, ConnectorError> {
        let Some(event) = self.pipeline.process(raw).await? else {
            trace!(channel = %self.channel, "Inbound value filtered");
            return Ok(Ingest::Filtered);
        };

        let issued = self.hub.publish(&self.channel, event).await?;
        Ok(Ingest::Published { issued })
    }
}

/// Outbound glue: every event on a channel, through a pipeline, out a transport.
///
/// Failures while encoding or sending one event are isolated by the channel like
/// any other subscriber failure: logged and counted in the channel metrics.
pub struct SinkConnector<Tr, T> {
    hub: EventHub<T>,
    channel: Arc<str>,
    pipeline: Pipeline<Arc<T>, Vec<u8>>,
    transport: Arc<Tr>,
    group: Option<String>,
    subscription: Mutex<Option<Subscription>>,
}

impl<Tr, T> fmt::Debug for SinkConnector<Tr, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConnector")
            .field("channel", &self.channel)
            .field("group", &self.group)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl<Tr, T> SinkConnector<Tr, T>
where
    Tr: Transport,
    T: Event,
{
    /// # Errors
    /// Returns [`ConnectorError::Hub`] if `channel` is not a valid name.
    pub fn new(
        hub: EventHub<T>,
        channel: &str,
        pipeline: Pipeline<Arc<T>, Vec<u8>>,
        transport: Tr,
    ) -> Result<Self, ConnectorError> {
        hub.channel(channel)?;
        Ok(Self {
            hub,
            channel: Arc::from(channel),
            pipeline,
            transport: Arc::new(transport),
            group: None,
            subscription: Mutex::new(None),
        })
    }

    /// Tags the subscription made by [`connect`](Self::connect) with `group`, so
    /// `EventHub::unsubscribe_group` detaches it together with its peers.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    /// Whether the channel subscription is live and the transport is up.
    pub async fn is_connected(&self) -> bool {
        let subscription = self.subscription.lock().await;
        subscription.as_ref().is_some_and(Subscription::is_active) && self.transport.is_connected()
    }

    /// Connects the transport, then subscribes to the channel.
    ///
    /// # Errors
    /// * [`ConnectorError::State`] if already connected.
    /// * [`ConnectorError::Transport`] if the transport fails to connect; no
    ///   subscription is made.
    pub async fn connect(&self) -> Result<(), ConnectorError> {
        let mut slot = self.subscription.lock().await;
        if slot.as_ref().is_some_and(Subscription::is_active) {
            return Err(ConnectorError::State {
                message: format!("sink on '{}' is already connected", self.channel).into(),
                context: None,
            });
        }

        self.transport.connect().await?;

        let transport = Arc::clone(&self.transport);
        let pipeline = self.pipeline.clone();
        let callback = move |event: Arc<T>| {
            let transport = Arc::clone(&transport);
            let pipeline = pipeline.clone();
            async move { forward(&pipeline, transport.as_ref(), event).await }
        };

        let mut options = SubscribeOptions::new();
        if let Some(group) = &self.group {
            options = options.group(group.clone());
        }

        let subscription = self.hub.subscribe(&self.channel, callback, options).await?;
        debug!(
            channel = %self.channel,
            transport = %self.transport.name(),
            subscriber = subscription.id(),
            "Sink connected"
        );
        *slot = Some(subscription);
        Ok(())
    }

    /// Unsubscribes from the channel, then disconnects the transport.
    ///
    /// # Errors
    /// * [`ConnectorError::State`] if the sink was never connected.
    /// * [`ConnectorError::Transport`] if the transport fails to disconnect. The
    ///   subscription is already gone at that point.
    pub async fn disconnect(&self) -> Result<(), ConnectorError> {
        let Some(subscription) = self.subscription.lock().await.take() else {
            return Err(ConnectorError::State {
                message: format!("sink on '{}' is not connected", self.channel).into(),
                context: None,
            });
        };

        subscription.unsubscribe();
        self.transport.disconnect().await?;
        debug!(channel = %self.channel, transport = %self.transport.name(), "Sink disconnected");
        Ok(())
    }
}

async fn forward<Tr, T>(
    pipeline: &Pipeline<Arc<T>, Vec<u8>>,
    transport: &Tr,
    event: Arc<T>,
) -> HandlerResult
where
    Tr: Transport,
    T: Event,
{
    match pipeline.process(event).await? {
        Some(frame) => transport.send(frame).await?,
        None => trace!(transport = %transport.name(), "Outbound event filtered"),
    }
    Ok(())
}
