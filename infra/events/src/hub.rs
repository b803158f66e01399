use crate::channel::{Channel, ChannelMetrics, Event, HandlerResult};
use crate::error::EventHubError;
use crate::options::{HubOptions, SubscribeOptions};
use crate::subscription::Subscription;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

/// Reserved channel name. Subscribers on it see every value published hub-wide.
pub const WILDCARD: &str = "*";

struct HubInner<T> {
    options: HubOptions,
    wildcard: Channel<T>,
    channels: RwLock<FxHashMap<Arc<str>, Channel<T>>>,
}

/// Registry of named [`Channel`]s with a wildcard tap.
///
/// Channels are created lazily the first time a name is referenced and live as long
/// as the hub. Cloning the hub is cheap and shares all channels.
pub struct EventHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("options", &self.inner.options)
            .field("channels", &self.inner.channels.read().len())
            .finish_non_exhaustive()
    }
}

impl<T: Event> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Event> EventHub<T> {
    /// Creates a hub that waits for subscribers on every publish.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(HubOptions::default())
    }

    /// Starts a [`HubBuilder`] with default options.
    ///
    /// ```rust
    /// use conduit_events::EventHub;
    ///
    /// let hub = EventHub::<String>::builder().wait_for_subscribers(false).build();
    /// assert!(!hub.options().waits_for_subscribers());
    /// ```
    #[must_use]
    pub fn builder() -> HubBuilder<T> {
        HubBuilder { options: HubOptions::default(), payload: PhantomData }
    }

    #[must_use]
    pub fn with_options(options: HubOptions) -> Self {
        let wildcard = Channel::new(WILDCARD, options);
        let mut channels = FxHashMap::default();
        channels.insert(Arc::from(WILDCARD), wildcard.clone());
        Self { inner: Arc::new(HubInner { options, wildcard, channels: RwLock::new(channels) }) }
    }

    #[must_use]
    pub fn options(&self) -> HubOptions {
        self.inner.options
    }

    /// Returns the named channel, creating it on first use.
    ///
    /// # Errors
    /// Returns [`EventHubError::InvalidArgument`] if `name` is empty.
    pub fn channel(&self, name: &str) -> Result<Channel<T>, EventHubError> {
        validate_name(name)?;

        if let Some(channel) = self.inner.channels.read().get(name) {
            return Ok(channel.clone());
        }

        let channel = self
            .inner
            .channels
            .write()
            .entry(Arc::from(name))
            .or_insert_with(|| {
                trace!(channel = name, "Creating channel on first reference");
                Channel::new(name, self.inner.options)
            })
            .clone();
        Ok(channel)
    }

    /// The wildcard channel (always present).
    #[must_use]
    pub fn wildcard(&self) -> &Channel<T> {
        &self.inner.wildcard
    }

    /// Subscribes an asynchronous callback to `channel`.
    ///
    /// # Errors
    /// Returns [`EventHubError::InvalidArgument`] if `channel` is empty.
    ///
    /// # Examples
    /// ```rust
    /// use conduit_events::{EventHub, SubscribeOptions};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), conduit_events::EventHubError> {
    /// let hub = EventHub::<f64>::new();
    /// let subscription = hub
    ///     .subscribe("temp", |reading| async move { assert!(*reading > 0.0); Ok(()) }, SubscribeOptions::new())
    ///     .await?;
    /// hub.publish("temp", 72.0).await?;
    /// assert_eq!(hub.last_event("temp")?.as_deref(), Some(&72.0));
    /// subscription.unsubscribe();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn subscribe<F, Fut>(
        &self,
        channel: &str,
        callback: F,
        options: SubscribeOptions,
    ) -> Result<Subscription, EventHubError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let channel = self.channel(channel)?;
        Ok(channel.subscribe(callback, options).await)
    }

    /// Subscribes a synchronous callback to `channel`.
    ///
    /// # Errors
    /// Returns [`EventHubError::InvalidArgument`] if `channel` is empty.
    pub async fn subscribe_fn<F>(
        &self,
        channel: &str,
        callback: F,
        options: SubscribeOptions,
    ) -> Result<Subscription, EventHubError>
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        let channel = self.channel(channel)?;
        Ok(channel.subscribe_fn(callback, options).await)
    }

    /// Publishes `data` to `channel`, then to the wildcard channel.
    ///
    /// Target subscribers are invoked first, then wildcard subscribers, and only then
    /// is anything awaited; a pending target subscriber never holds back the wildcard.
    /// Both channels share the same `Arc`. Publishing directly to [`WILDCARD`] only
    /// reaches wildcard subscribers once.
    ///
    /// Returns the number of deliveries issued across both channels.
    ///
    /// # Errors
    /// Returns [`EventHubError::InvalidArgument`] if `channel` is empty.
    pub async fn publish(&self, channel: &str, data: T) -> Result<usize, EventHubError> {
        self.publish_arc(channel, Arc::new(data)).await
    }

    /// Publishes an already shared value.
    ///
    /// # Errors
    /// Returns [`EventHubError::InvalidArgument`] if `channel` is empty.
    pub async fn publish_arc(&self, channel: &str, event: Arc<T>) -> Result<usize, EventHubError> {
        let target = self.channel(channel)?;
        let mut deliveries = target.issue(Arc::clone(&event));
        if channel != WILDCARD {
            deliveries.extend(self.inner.wildcard.issue(event));
        }

        let issued = deliveries.len();
        target.settle(deliveries).await;
        Ok(issued)
    }

    /// Returns the last value published to `channel`. Creates the channel if needed.
    ///
    /// # Errors
    /// Returns [`EventHubError::InvalidArgument`] if `channel` is empty.
    pub fn last_event(&self, channel: &str) -> Result<Option<Arc<T>>, EventHubError> {
        Ok(self.channel(channel)?.last_value())
    }

    /// Removes every subscription tagged with `group`, on every channel.
    ///
    /// Returns the number of subscriptions removed.
    pub fn unsubscribe_group(&self, group: &str) -> usize {
        let channels: Vec<Channel<T>> = self.inner.channels.read().values().cloned().collect();
        let removed: usize = channels.iter().map(|channel| channel.unsubscribe_group(group)).sum();
        debug!(group, removed, "Group unsubscribed hub-wide");
        removed
    }

    /// Number of channels, the wildcard included.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.inner.channels.read().len()
    }

    /// Number of callbacks on `channel`; `0` for channels that were never referenced.
    #[must_use]
    pub fn callback_count(&self, channel: &str) -> usize {
        self.inner.channels.read().get(channel).map_or(0, Channel::callback_count)
    }

    /// Counters for `channel`, without creating it.
    #[must_use]
    pub fn metrics(&self, channel: &str) -> Option<ChannelMetrics> {
        self.inner.channels.read().get(channel).map(Channel::metrics)
    }

    /// Names of every channel, sorted.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.inner.channels.read().keys().map(|name| name.to_string()).collect();
        names.sort_unstable();
        names
    }
}

/// Fluent construction of an [`EventHub`]. See [`EventHub::builder`].
pub struct HubBuilder<T> {
    options: HubOptions,
    payload: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for HubBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubBuilder").field("options", &self.options).finish()
    }
}

impl<T: Event> HubBuilder<T> {
    #[must_use]
    pub const fn wait_for_subscribers(mut self, wait: bool) -> Self {
        self.options = self.options.wait_for_subscribers(wait);
        self
    }

    #[must_use]
    pub fn build(self) -> EventHub<T> {
        EventHub::with_options(self.options)
    }
}

fn validate_name(name: &str) -> Result<(), EventHubError> {
    if name.is_empty() {
        return Err(EventHubError::InvalidArgument {
            message: "channel name cannot be empty".into(),
            context: None,
        });
    }
    Ok(())
}
