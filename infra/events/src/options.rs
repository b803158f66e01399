/// Delivery behaviour shared by a hub and every channel it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubOptions {
    wait_for_subscribers: bool,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self { wait_for_subscribers: true }
    }
}

impl HubOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true` (the default), `publish` resolves only after every subscriber
    /// invocation has settled. When `false`, deliveries are issued and left to run
    /// on the ambient tokio runtime.
    #[must_use]
    pub const fn wait_for_subscribers(mut self, wait: bool) -> Self {
        self.wait_for_subscribers = wait;
        self
    }

    #[must_use]
    pub const fn waits_for_subscribers(&self) -> bool {
        self.wait_for_subscribers
    }
}

/// Per-subscription options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub(crate) replay: bool,
    pub(crate) group: Option<String>,
}

impl SubscribeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the channel's last value to the new callback before `subscribe` returns.
    #[must_use]
    pub const fn replay(mut self, replay: bool) -> Self {
        self.replay = replay;
        self
    }

    /// Tag the subscription so it can be removed with `unsubscribe_group`.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}
