use conduit_pipeline::{Filter, FilterResult};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Error a stage reports so tests can downcast it back.
#[derive(Debug, PartialEq, Eq)]
pub struct Rejected(pub &'static str);

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected: {}", self.0)
    }
}

impl std::error::Error for Rejected {}

/// Always fails with [`Rejected`].
#[derive(Debug)]
pub struct Reject(pub &'static str);

impl Filter<i64> for Reject {
    type Output = i64;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("reject")
    }

    async fn process(&self, _input: i64) -> FilterResult<i64> {
        Err(Box::new(Rejected(self.0)))
    }
}

/// Counts how often it ran and passes the value on unchanged.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    calls: Arc<AtomicUsize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Filter<i64> for Counter {
    type Output = i64;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("counter")
    }

    async fn process(&self, input: i64) -> FilterResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(input))
    }
}

/// Panics on every input.
#[derive(Debug)]
pub struct Explode;

impl Filter<i64> for Explode {
    type Output = i64;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("explode")
    }

    async fn process(&self, input: i64) -> FilterResult<i64> {
        panic!("cannot handle {input}");
    }
}

/// Adds one after yielding to the runtime.
#[derive(Debug)]
pub struct SlowIncrement;

impl Filter<i64> for SlowIncrement {
    type Output = i64;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("slow-increment")
    }

    async fn process(&self, input: i64) -> FilterResult<i64> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(Some(input + 1))
    }
}
