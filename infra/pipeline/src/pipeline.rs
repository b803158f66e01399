use crate::error::PipelineError;
use crate::filter::{BoxError, Filter, FilterResult};
use crate::stage::{Erased, Slot, Stage};
use futures::FutureExt;
use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of a pipeline run. `Ok(None)` means a stage deliberately dropped the datum.
pub type Outcome<T> = Result<Option<T>, PipelineError>;

/// An ordered chain of [`Filter`]s turning `In` into `Out`.
///
/// [`Pipeline::add`] never mutates the receiver: it returns a new pipeline that
/// shares the existing stages and appends one more. A built pipeline keeps no
/// per-run state, so [`Pipeline::process`] can be called concurrently.
///
/// # Examples
/// ```rust
/// use conduit_pipeline::{ParseInt, Pipeline, map};
///
/// # #[tokio::main]
/// # async fn main() {
/// let pipeline = Pipeline::<String>::new()
///     .add(ParseInt)
///     .add(map("double", |n: i64| n * 2));
///
/// assert_eq!(pipeline.process("21".to_owned()).await.unwrap(), Some(42));
/// assert!(pipeline.process("abc".to_owned()).await.is_err());
/// # }
/// ```
pub struct Pipeline<In, Out = In> {
    stages: Vec<Arc<dyn Stage>>,
    types: PhantomData<fn(In) -> Out>,
}

impl<In, Out> Clone for Pipeline<In, Out> {
    fn clone(&self) -> Self {
        Self { stages: self.stages.clone(), types: PhantomData }
    }
}

impl<In, Out> fmt::Debug for Pipeline<In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("input", &type_name::<In>())
            .field("output", &type_name::<Out>())
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl<In, Out> Pipeline<In, Out> {
    /// Stage labels in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<Cow<'static, str>> {
        self.stages.iter().map(|stage| stage.name().clone()).collect()
    }
}

impl<In: Send + 'static> Default for Pipeline<In, In> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In: Send + 'static> Pipeline<In, In> {
    /// An empty pipeline: the identity transformation.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new(), types: PhantomData }
    }
}

impl<In, Out> Pipeline<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Returns a new pipeline with `filter` appended. `self` is left untouched.
    #[must_use = "add returns a new pipeline and leaves the original unchanged"]
    pub fn add<F>(&self, filter: F) -> Pipeline<In, F::Output>
    where
        F: Filter<Out>,
    {
        let stage: Arc<dyn Stage> = Arc::new(Erased::<F, Out>::new(filter));
        trace!(stage = self.stages.len(), filter = %stage.name(), "Appending pipeline stage");

        let mut stages = Vec::with_capacity(self.stages.len() + 1);
        stages.extend(self.stages.iter().cloned());
        stages.push(stage);
        Pipeline { stages, types: PhantomData }
    }

    /// Runs `input` through every stage in order.
    ///
    /// Stops at the first stage that fails (returning its error), panics (returning
    /// [`PipelineError::Panicked`]) or yields `Ok(None)` (returning `Ok(None)`).
    ///
    /// # Errors
    /// Returns the [`PipelineError`] of the first failing stage.
    pub async fn process(&self, input: In) -> Outcome<Out> {
        self.execute(input).await
    }

    async fn execute(&self, input: In) -> Outcome<Out> {
        let mut current: Slot = Box::new(input);

        for (index, stage) in self.stages.iter().enumerate() {
            let step = AssertUnwindSafe(stage.run(index, current)).catch_unwind().await;
            current = match step {
                Ok(Ok(Some(next))) => next,
                Ok(Ok(None)) => {
                    debug!(stage = index, filter = %stage.name(), "Stage dropped the value");
                    return Ok(None);
                },
                Ok(Err(error)) => {
                    debug!(stage = index, filter = %stage.name(), %error, "Stage failed");
                    return Err(error);
                },
                Err(payload) => {
                    debug!(stage = index, filter = %stage.name(), "Stage panicked");
                    return Err(PipelineError::Panicked {
                        stage: index,
                        filter: stage.name().clone(),
                        message: panic_message(payload.as_ref()),
                        context: None,
                    });
                },
            };
        }

        current.downcast::<Out>().map(|output| Some(*output)).map_err(|_| {
            PipelineError::TypeMismatch {
                message: format!("pipeline output is not {}", type_name::<Out>()).into(),
                context: None,
            }
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// A pipeline is itself a filter, so pipelines nest.
impl<In, Out> Filter<In> for Pipeline<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    type Output = Out;

    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(format!("pipeline[{}]", self.stage_names().join(" > ")))
    }

    fn process(&self, input: In) -> impl Future<Output = FilterResult<Out>> + Send {
        async move { self.execute(input).await.map_err(BoxError::from) }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Cow<'static, str> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Cow::Owned(message.clone())
    } else {
        Cow::Borrowed("non-string panic payload")
    }
}
