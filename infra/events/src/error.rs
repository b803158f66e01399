use std::borrow::Cow;

/// Errors surfaced by [`EventHub`](crate::EventHub) operations.
///
/// Subscriber callback failures never show up here; channels absorb and count them.
#[conduit_derive::conduit_error]
pub enum EventHubError {
    /// The caller violated an argument contract (e.g. an empty channel name).
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
