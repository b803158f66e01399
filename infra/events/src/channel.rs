use crate::options::{HubOptions, SubscribeOptions};
use crate::subscription::{Registry, Subscription};
use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt, join_all};
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Marker trait for payloads that can travel through a [`Channel`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Event for T {}

/// Error type subscriber callbacks may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a subscriber callback reports back.
pub type HandlerResult = Result<(), BoxError>;

type HandlerFuture = BoxFuture<'static, HandlerResult>;
type Callback<T> = Arc<dyn Fn(Arc<T>) -> HandlerFuture + Send + Sync>;

/// The cached value as seen at registration, and the publish count it belongs to.
struct Snapshot<T> {
    value: Arc<T>,
    publishes: u64,
}
pub(crate) type Delivery = BoxFuture<'static, ()>;

/// Point-in-time counters for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMetrics {
    pub publish_count: u64,
    pub error_count: u64,
    pub last_publish: Option<DateTime<Utc>>,
}

struct Subscriber<T> {
    callback: Callback<T>,
    group: Option<Arc<str>>,
}

struct ChannelState<T> {
    last_value: Option<Arc<T>>,
    // Ids only grow, so key order is subscription order.
    subscribers: BTreeMap<u64, Subscriber<T>>,
    groups: FxHashMap<Arc<str>, FxHashSet<u64>>,
    next_id: u64,
    publish_count: u64,
    last_publish: Option<DateTime<Utc>>,
}

impl<T> ChannelState<T> {
    fn leave_group(&mut self, group: &str, id: u64) {
        if let Some(members) = self.groups.get_mut(group) {
            members.remove(&id);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }
}

struct ChannelShared<T> {
    name: Arc<str>,
    options: HubOptions,
    errors: AtomicU64,
    state: RwLock<ChannelState<T>>,
}

impl<T: Event> ChannelShared<T> {
    /// Invokes one callback and wraps whatever it does (return an error, panic while
    /// building its future, panic while running) into a delivery that always succeeds.
    fn dispatch(self: &Arc<Self>, id: u64, callback: &Callback<T>, event: Arc<T>) -> Delivery {
        let shared = Arc::clone(self);
        let invoked = panic::catch_unwind(AssertUnwindSafe(|| callback(event)));

        async move {
            let outcome = match invoked {
                Ok(pending) => AssertUnwindSafe(pending).catch_unwind().await,
                Err(payload) => Err(payload),
            };
            match outcome {
                Ok(Ok(())) => {},
                Ok(Err(error)) => shared.record_failure(id, &error),
                Err(payload) => shared.record_failure(id, &panic_message(payload.as_ref())),
            }
        }
        .boxed()
    }

    /// Whether no publish happened since the channel's count was `publishes`.
    fn unchanged_since(&self, publishes: u64) -> bool {
        self.state.read().publish_count == publishes
    }

    fn record_failure(&self, id: u64, error: &dyn fmt::Display) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        warn!(channel = %self.name, subscriber = id, error = %error, "Subscriber callback failed");
    }
}

impl<T: Event> Registry for ChannelShared<T> {
    fn remove(&self, id: u64) -> bool {
        let removed = {
            let mut state = self.state.write();
            match state.subscribers.remove(&id) {
                Some(subscriber) => {
                    if let Some(group) = subscriber.group {
                        state.leave_group(&group, id);
                    }
                    true
                },
                None => false,
            }
        };
        if removed {
            debug!(channel = %self.name, subscriber = id, "Subscriber removed");
        }
        removed
    }

    fn contains(&self, id: u64) -> bool {
        self.state.read().subscribers.contains_key(&id)
    }
}

/// A named topic: subscriber registry plus a single-slot cache of the last value.
///
/// Cloning a `Channel` yields another handle to the same registry.
pub struct Channel<T> {
    shared: Arc<ChannelShared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("Channel")
            .field("name", &self.shared.name)
            .field("subscribers", &state.subscribers.len())
            .field("groups", &state.groups.len())
            .field("publish_count", &state.publish_count)
            .finish_non_exhaustive()
    }
}

impl<T: Event> Channel<T> {
    /// Creates a detached channel. Channels are normally obtained through an
    /// [`EventHub`](crate::EventHub).
    pub fn new(name: impl Into<Arc<str>>, options: HubOptions) -> Self {
        let name = name.into();
        trace!(channel = %name, "Initializing channel");
        Self {
            shared: Arc::new(ChannelShared {
                name,
                options,
                errors: AtomicU64::new(0),
                state: RwLock::new(ChannelState {
                    last_value: None,
                    subscribers: BTreeMap::new(),
                    groups: FxHashMap::default(),
                    next_id: 0,
                    publish_count: 0,
                    last_publish: None,
                }),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Registers an asynchronous callback.
    ///
    /// Errors and panics raised by the callback are logged and counted in
    /// [`ChannelMetrics::error_count`]; they never reach the publisher.
    ///
    /// With [`SubscribeOptions::replay`] set and a cached value present, the callback
    /// runs with that value and settles before this future resolves. The replay is
    /// skipped when another publish lands between registration and replay, since the
    /// callback has then already been handed the newer value. A publish racing the
    /// replay itself, after that check, can still overlap with it.
    ///
    /// # Examples
    /// ```rust
    /// use conduit_events::{Channel, HubOptions, SubscribeOptions};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let channel = Channel::<u32>::new("ticks", HubOptions::default());
    /// let subscription = channel
    ///     .subscribe(|tick| async move { assert!(*tick > 0); Ok(()) }, SubscribeOptions::new())
    ///     .await;
    /// assert_eq!(subscription.id(), 1);
    /// channel.publish(7).await;
    /// # }
    /// ```
    pub async fn subscribe<F, Fut>(&self, callback: F, options: SubscribeOptions) -> Subscription
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let callback: Callback<T> = Arc::new(move |event: Arc<T>| callback(event).boxed());
        self.register(callback, options).await
    }

    /// Registers a synchronous callback. It runs inline when a publish issues it.
    pub async fn subscribe_fn<F>(&self, callback: F, options: SubscribeOptions) -> Subscription
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        let callback: Callback<T> =
            Arc::new(move |event: Arc<T>| future::ready(callback(&event)).boxed());
        self.register(callback, options).await
    }

    async fn register(&self, callback: Callback<T>, options: SubscribeOptions) -> Subscription {
        let (subscription, snapshot) = self.admit(Arc::clone(&callback), options);
        if let Some(snapshot) = snapshot {
            self.replay(subscription.id(), &callback, snapshot).await;
        }
        subscription
    }

    /// Inserts the subscriber and, when replay was asked for, snapshots the cached
    /// value together with the publish count it belongs to.
    fn admit(
        &self,
        callback: Callback<T>,
        options: SubscribeOptions,
    ) -> (Subscription, Option<Snapshot<T>>) {
        let group: Option<Arc<str>> = options.group.map(Arc::from);

        let (id, snapshot) = {
            let mut state = self.shared.state.write();
            state.next_id += 1;
            let id = state.next_id;
            if let Some(group) = &group {
                state.groups.entry(Arc::clone(group)).or_default().insert(id);
            }
            state.subscribers.insert(id, Subscriber { callback, group: group.clone() });
            let publishes = state.publish_count;
            let snapshot = if options.replay {
                state.last_value.clone().map(|value| Snapshot { value, publishes })
            } else {
                None
            };
            (id, snapshot)
        };
        debug!(channel = %self.shared.name, subscriber = id, group = ?group, "Subscriber registered");

        let shared: Arc<dyn Registry> = self.shared.clone();
        let registry: Weak<dyn Registry> = Arc::downgrade(&shared);
        (Subscription::new(id, Arc::clone(&self.shared.name), group, registry), snapshot)
    }

    /// Delivers `snapshot` unless a publish since admission already handed the
    /// subscriber a newer value.
    async fn replay(&self, id: u64, callback: &Callback<T>, snapshot: Snapshot<T>) {
        if !self.shared.unchanged_since(snapshot.publishes) {
            trace!(channel = %self.shared.name, subscriber = id, "Replay superseded");
            return;
        }
        trace!(channel = %self.shared.name, subscriber = id, "Replaying last value");
        self.shared.dispatch(id, callback, snapshot.value).await;
    }

    /// Publishes `data`, returning how many subscribers were issued a delivery.
    pub async fn publish(&self, data: T) -> usize {
        self.publish_arc(Arc::new(data)).await
    }

    /// Publishes an already shared value without re-wrapping it.
    ///
    /// The value is cached as the channel's last value even when nobody listens.
    /// Every subscriber is invoked, in subscription order, before any delivery is
    /// awaited; one failing or slow subscriber never holds back the others.
    pub async fn publish_arc(&self, event: Arc<T>) -> usize {
        let deliveries = self.issue(event);
        let issued = deliveries.len();
        self.settle(deliveries).await;
        issued
    }

    /// Caches `event` and starts one delivery per subscriber without awaiting any.
    pub(crate) fn issue(&self, event: Arc<T>) -> Vec<Delivery> {
        let targets: Vec<(u64, Callback<T>)> = {
            let mut state = self.shared.state.write();
            state.publish_count += 1;
            state.last_publish = Some(Utc::now());
            state.last_value = Some(Arc::clone(&event));
            state.subscribers.iter().map(|(id, s)| (*id, Arc::clone(&s.callback))).collect()
        };

        if targets.is_empty() {
            trace!(channel = %self.shared.name, "Event cached: no active subscribers");
        } else {
            trace!(channel = %self.shared.name, count = targets.len(), "Event dispatched");
        }

        targets
            .iter()
            .map(|(id, callback)| self.shared.dispatch(*id, callback, Arc::clone(&event)))
            .collect()
    }

    /// Waits for `deliveries`, or hands them to the runtime when detached.
    pub(crate) async fn settle(&self, deliveries: Vec<Delivery>) {
        if deliveries.is_empty() {
            return;
        }
        if self.shared.options.waits_for_subscribers() {
            join_all(deliveries).await;
            return;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            drop(runtime.spawn(join_all(deliveries)));
        } else {
            debug!(channel = %self.shared.name, "No tokio runtime; settling deliveries inline");
            join_all(deliveries).await;
        }
    }

    /// Removes every subscription tagged with `group`. Unknown groups are a no-op.
    pub fn unsubscribe_group(&self, group: &str) -> usize {
        let removed = {
            let mut state = self.shared.state.write();
            let Some(members) = state.groups.remove(group) else {
                return 0;
            };
            for id in &members {
                state.subscribers.remove(id);
            }
            members.len()
        };
        debug!(channel = %self.shared.name, group, removed, "Group unsubscribed");
        removed
    }

    #[must_use]
    pub fn last_value(&self) -> Option<Arc<T>> {
        self.shared.state.read().last_value.clone()
    }

    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.shared.state.read().subscribers.len()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.shared.state.read().groups.len()
    }

    #[must_use]
    pub fn metrics(&self) -> ChannelMetrics {
        let state = self.shared.state.read();
        ChannelMetrics {
            publish_count: state.publish_count,
            error_count: self.shared.errors.load(Ordering::Relaxed),
            last_publish: state.last_publish,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(|| "panic with non-string payload".to_owned(), |msg| format!("panic: {msg}"))
}
