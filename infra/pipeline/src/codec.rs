//! Stock filters for the text and byte frames transports usually carry.

use crate::filter::{BoxError, Filter, FilterResult};
use std::borrow::Cow;
use std::future::{self, Future};

/// Parses a decimal integer, ignoring surrounding whitespace.
///
/// Non-numeric input is a stage failure, not a dropped value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseInt;

impl Filter<String> for ParseInt {
    type Output = i64;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("parse-int")
    }

    fn process(&self, input: String) -> impl Future<Output = FilterResult<i64>> + Send {
        future::ready(input.trim().parse::<i64>().map(Some).map_err(BoxError::from))
    }
}

#[cfg(feature = "json")]
pub use self::json::{JsonDecode, JsonEncode};

#[cfg(feature = "json")]
mod json {
    use crate::filter::{BoxError, Filter, FilterResult};
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use std::borrow::Cow;
    use std::fmt;
    use std::future::{self, Future};
    use std::marker::PhantomData;

    /// Deserializes JSON text or bytes into `T`.
    pub struct JsonDecode<T> {
        target: PhantomData<fn() -> T>,
    }

    impl<T> JsonDecode<T> {
        #[must_use]
        pub const fn new() -> Self {
            Self { target: PhantomData }
        }
    }

    impl<T> Default for JsonDecode<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T> fmt::Debug for JsonDecode<T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("JsonDecode").field("target", &std::any::type_name::<T>()).finish()
        }
    }

    impl<T> Filter<Vec<u8>> for JsonDecode<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        type Output = T;

        fn name(&self) -> Cow<'static, str> {
            Cow::Borrowed("json-decode")
        }

        fn process(&self, input: Vec<u8>) -> impl Future<Output = FilterResult<T>> + Send {
            future::ready(serde_json::from_slice::<T>(&input).map(Some).map_err(BoxError::from))
        }
    }

    impl<T> Filter<String> for JsonDecode<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        type Output = T;

        fn name(&self) -> Cow<'static, str> {
            Cow::Borrowed("json-decode")
        }

        fn process(&self, input: String) -> impl Future<Output = FilterResult<T>> + Send {
            future::ready(serde_json::from_str::<T>(&input).map(Some).map_err(BoxError::from))
        }
    }

    /// Serializes `T` to JSON bytes.
    pub struct JsonEncode<T> {
        source: PhantomData<fn(T)>,
    }

    impl<T> JsonEncode<T> {
        #[must_use]
        pub const fn new() -> Self {
            Self { source: PhantomData }
        }
    }

    impl<T> Default for JsonEncode<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T> fmt::Debug for JsonEncode<T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("JsonEncode").field("source", &std::any::type_name::<T>()).finish()
        }
    }

    impl<T> Filter<T> for JsonEncode<T>
    where
        T: Serialize + Send + 'static,
    {
        type Output = Vec<u8>;

        fn name(&self) -> Cow<'static, str> {
            Cow::Borrowed("json-encode")
        }

        fn process(&self, input: T) -> impl Future<Output = FilterResult<Vec<u8>>> + Send {
            future::ready(serde_json::to_vec(&input).map(Some).map_err(BoxError::from))
        }
    }
}
