#![allow(unreachable_pub)]

//! # Conduit Derive
//!
//! Procedural macros shared by the conduit crates.
//!
//! Currently a single attribute, [`macro@conduit_error`], which turns a plain enum into
//! the error type shape every conduit crate uses: `thiserror` display strings, an
//! optional `context` slot on each variant, and a companion `...Ext` trait for
//! attaching that context with `?`.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Declares a conduit error enum.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already present.
/// * `<Name>Ext<T>` with `.context(...)` for `Result<T, Name>`, and for
///   `Result<T, Source>` when a variant wraps a source error.
/// * `From<Source>` for variants with a `source` field (or a `#[source]`/`#[from]` field).
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A module-local `format_context` helper for display strings.
///
/// # Requirements
///
/// * Named-field variants only.
/// * A `context` field, when present, is `Option<Cow<'static, str>>`.
/// * Variants with a source must also have a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[conduit_derive::conduit_error]
/// pub enum ChannelError {
///     #[error("Invalid argument{}: {message}", format_context(.context))]
///     InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn conduit_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
