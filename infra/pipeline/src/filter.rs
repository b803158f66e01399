use std::borrow::Cow;
use std::fmt;
use std::future::{self, Future};

/// Error type filters may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one filter step.
///
/// * `Ok(Some(value))` passes `value` to the next stage.
/// * `Ok(None)` deliberately drops the datum; the pipeline stops without an error.
/// * `Err(error)` stops the pipeline and reports `error`.
pub type FilterResult<T> = Result<Option<T>, BoxError>;

/// One transformation step of a [`Pipeline`](crate::Pipeline).
///
/// Implementors may write `async fn process`; the returned future must be `Send`.
///
/// # Examples
/// ```rust
/// use conduit_pipeline::{Filter, FilterResult};
///
/// struct Celsius;
///
/// impl Filter<f64> for Celsius {
///     type Output = f64;
///
///     async fn process(&self, fahrenheit: f64) -> FilterResult<f64> {
///         Ok(Some((fahrenheit - 32.0) * 5.0 / 9.0))
///     }
/// }
/// ```
pub trait Filter<I>: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Label used in logs and errors.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    fn process(&self, input: I) -> impl Future<Output = FilterResult<Self::Output>> + Send;
}

/// Filter backed by a synchronous closure. See [`from_fn`].
pub struct FnFilter<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Wraps a closure returning [`FilterResult`]-shaped values as a filter.
///
/// ```rust
/// use conduit_pipeline::{Pipeline, from_fn};
///
/// # #[tokio::main]
/// # async fn main() {
/// let halve = Pipeline::<u32>::new().add(from_fn("halve", |n: u32| {
///     if n % 2 == 0 { Ok(Some(n / 2)) } else { Err("odd input") }
/// }));
/// assert_eq!(halve.process(8).await.unwrap(), Some(4));
/// assert!(halve.process(7).await.is_err());
/// # }
/// ```
pub fn from_fn<I, O, E, F>(name: impl Into<Cow<'static, str>>, f: F) -> FnFilter<F>
where
    F: Fn(I) -> Result<Option<O>, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    FnFilter { name: name.into(), f }
}

impl<I, O, E, F> Filter<I> for FnFilter<F>
where
    F: Fn(I) -> Result<Option<O>, E> + Send + Sync + 'static,
    O: Send + 'static,
    E: Into<BoxError>,
{
    type Output = O;

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    fn process(&self, input: I) -> impl Future<Output = FilterResult<O>> + Send {
        let result: FilterResult<O> = (self.f)(input).map_err(Into::into);
        future::ready(result)
    }
}

/// Infallible one-to-one transform. See [`map`].
pub struct Map<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> fmt::Debug for Map<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").field("name", &self.name).finish_non_exhaustive()
    }
}

pub fn map<I, O, F>(name: impl Into<Cow<'static, str>>, f: F) -> Map<F>
where
    F: Fn(I) -> O + Send + Sync + 'static,
{
    Map { name: name.into(), f }
}

impl<I, O, F> Filter<I> for Map<F>
where
    F: Fn(I) -> O + Send + Sync + 'static,
    O: Send + 'static,
{
    type Output = O;

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    fn process(&self, input: I) -> impl Future<Output = FilterResult<O>> + Send {
        let result: FilterResult<O> = Ok(Some((self.f)(input)));
        future::ready(result)
    }
}

/// Passes values the predicate accepts and swallows the rest. See [`keep_if`].
pub struct Predicate<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Rejected values end the pipeline with `Ok(None)`, not an error.
pub fn keep_if<I, F>(name: impl Into<Cow<'static, str>>, f: F) -> Predicate<F>
where
    F: Fn(&I) -> bool + Send + Sync + 'static,
{
    Predicate { name: name.into(), f }
}

impl<I, F> Filter<I> for Predicate<F>
where
    I: Send + 'static,
    F: Fn(&I) -> bool + Send + Sync + 'static,
{
    type Output = I;

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    fn process(&self, input: I) -> impl Future<Output = FilterResult<I>> + Send {
        let kept = (self.f)(&input).then_some(input);
        let result: FilterResult<I> = Ok(kept);
        future::ready(result)
    }
}
