use crate::error::PipelineError;
use crate::filter::Filter;
use futures::future::{BoxFuture, FutureExt};
use std::any::{Any, type_name};
use std::borrow::Cow;
use std::marker::PhantomData;

/// Type-erased value travelling between stages.
pub(crate) type Slot = Box<dyn Any + Send>;

/// A filter with its input and output erased so stages of different types can
/// share one list.
pub(crate) trait Stage: Send + Sync {
    fn name(&self) -> &Cow<'static, str>;

    fn run(&self, index: usize, input: Slot) -> BoxFuture<'_, Result<Option<Slot>, PipelineError>>;
}

pub(crate) struct Erased<F, I> {
    filter: F,
    name: Cow<'static, str>,
    input: PhantomData<fn(I)>,
}

impl<F, I> Erased<F, I>
where
    F: Filter<I>,
    I: Send + 'static,
{
    pub(crate) fn new(filter: F) -> Self {
        let name = filter.name();
        Self { filter, name, input: PhantomData }
    }
}

impl<F, I> Stage for Erased<F, I>
where
    F: Filter<I>,
    I: Send + 'static,
{
    fn name(&self) -> &Cow<'static, str> {
        &self.name
    }

    fn run(&self, index: usize, input: Slot) -> BoxFuture<'_, Result<Option<Slot>, PipelineError>> {
        async move {
            let input = input.downcast::<I>().map_err(|_| PipelineError::TypeMismatch {
                message: format!("stage {index} ({}) expects {}", self.name, type_name::<I>())
                    .into(),
                context: None,
            })?;

            match self.filter.process(*input).await {
                Ok(Some(output)) => Ok(Some(Box::new(output) as Slot)),
                Ok(None) => Ok(None),
                Err(error) => Err(PipelineError::Stage {
                    stage: index,
                    filter: self.name.clone(),
                    error,
                    context: None,
                }),
            }
        }
        .boxed()
    }
}
