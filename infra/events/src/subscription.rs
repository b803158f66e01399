use std::fmt;
use std::sync::{Arc, Weak};

/// The side of a channel a [`Subscription`] talks back to.
pub(crate) trait Registry: Send + Sync {
    fn remove(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle does **not** unsubscribe; call [`Subscription::unsubscribe`]
/// (or `unsubscribe_group`) to stop deliveries.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    channel: Arc<str>,
    group: Option<Arc<str>>,
    registry: Weak<dyn Registry>,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        channel: Arc<str>,
        group: Option<Arc<str>>,
        registry: Weak<dyn Registry>,
    ) -> Self {
        Self { id, channel, group, registry }
    }

    /// Channel-local id. Starts at 1 and is never reused within a channel.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Removes the callback from its channel (and from its group).
    ///
    /// Returns `false` if it was already removed or the channel is gone.
    pub fn unsubscribe(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| registry.remove(self.id))
    }

    /// Whether the callback is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| registry.contains(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}
