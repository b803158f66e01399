use conduit_events::HandlerResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// A reading as a transport would publish it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reading(pub u32);

/// Collects delivered values in arrival order.
#[derive(Clone, Debug)]
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self { seen: Arc::new(Mutex::new(Vec::new())) }
    }

    /// A synchronous callback that records every value.
    pub fn callback(&self) -> impl Fn(&T) -> HandlerResult + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |value: &T| {
            seen.lock().push(value.clone());
            Ok(())
        }
    }

    pub fn values(&self) -> Vec<T> {
        self.seen.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }
}

/// Records labels so tests can assert on cross-subscriber ordering.
pub fn labelled<T: 'static>(
    log: &Arc<Mutex<Vec<&'static str>>>,
    label: &'static str,
) -> impl Fn(&T) -> HandlerResult + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_: &T| {
        log.lock().push(label);
        Ok(())
    }
}
