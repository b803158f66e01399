use crate::filter::BoxError;
use std::borrow::Cow;

/// Failure outcome of [`Pipeline::process`](crate::Pipeline::process).
///
/// A pipeline that returned an error stays usable; nothing about a failed run is
/// retained.
#[conduit_derive::conduit_error]
pub enum PipelineError {
    /// A stage reported failure.
    #[error("Stage {stage} ({filter}) failed{}: {error}", format_context(.context))]
    Stage {
        stage: usize,
        filter: Cow<'static, str>,
        error: BoxError,
        context: Option<Cow<'static, str>>,
    },

    /// A stage panicked while processing.
    #[error("Stage {stage} ({filter}) panicked{}: {message}", format_context(.context))]
    Panicked {
        stage: usize,
        filter: Cow<'static, str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// A value reached a stage with an unexpected type. The typed builder API
    /// rules this out; it is reported instead of panicking.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl PipelineError {
    /// Index of the stage that failed, if the failure belongs to one.
    #[must_use]
    pub const fn stage(&self) -> Option<usize> {
        match self {
            Self::Stage { stage, .. } | Self::Panicked { stage, .. } => Some(*stage),
            Self::TypeMismatch { .. } => None,
        }
    }

    /// The error a stage reported, for downcasting to the filter's own type.
    #[must_use]
    pub fn stage_error(&self) -> Option<&BoxError> {
        match self {
            Self::Stage { error, .. } => Some(error),
            _ => None,
        }
    }
}
