//! # Conduit Pipeline
//!
//! Ordered, typed transformation chains that sit between a transport and an
//! event hub.
//!
//! A [`Pipeline<In, Out>`] holds a list of [`Filter`]s. Each call to
//! [`Pipeline::add`] returns a new pipeline whose output type is the added filter's
//! output, so type errors between stages are caught at compile time. At run time
//! [`Pipeline::process`] feeds the value through each stage and short-circuits:
//!
//! * a stage error ends the run with [`PipelineError::Stage`];
//! * a stage panic ends the run with [`PipelineError::Panicked`];
//! * a stage returning `Ok(None)` ends the run with `Ok(None)` (the datum was
//!   deliberately dropped).
//!
//! # Example
//!
//! ```rust
//! use conduit_pipeline::{Pipeline, ParseInt, keep_if};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let pipeline = Pipeline::<String>::new()
//!     .add(ParseInt)
//!     .add(keep_if("positive", |n: &i64| *n > 0));
//!
//! assert_eq!(pipeline.process("42".to_owned()).await.unwrap(), Some(42));
//! assert_eq!(pipeline.process("-3".to_owned()).await.unwrap(), None);
//! assert!(pipeline.process("abc".to_owned()).await.is_err());
//! # }
//! ```

mod codec;
mod error;
mod filter;
mod pipeline;
mod stage;

#[cfg(feature = "json")]
pub use codec::{JsonDecode, JsonEncode};
pub use codec::ParseInt;
pub use error::{PipelineError, PipelineErrorExt};
pub use filter::{BoxError, Filter, FilterResult, FnFilter, Map, Predicate, from_fn, keep_if, map};
pub use pipeline::{Outcome, Pipeline};
