//! # Conduit Events
//!
//! In-process publish/subscribe built from named channels.
//!
//! ## Overview
//!
//! An [`EventHub`] owns a set of [`Channel`]s keyed by name. Each channel keeps its
//! subscribers in subscription order, caches the last published value, and isolates
//! callback failures (errors and panics) from the publisher and from each other.
//! The reserved [`WILDCARD`] channel receives a copy of every publish.
//!
//! ## Features
//!
//! * **Lazy channels**: created the first time a name is referenced.
//! * **Replay**: new subscribers can receive the cached value immediately.
//! * **Groups**: tag subscriptions and remove them in bulk, hub-wide.
//! * **Async aware**: deliveries for one publish are issued together and awaited as
//!   wait-for-all-settled, or detached, per [`HubOptions`].
//! * **Thread-safe**: `FxHashMap` + `parking_lot::RwLock`, no lock held across `.await`.
//!
//! # Example
//!
//! ```rust
//! use conduit_events::{EventHub, EventHubError, SubscribeOptions};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventHubError> {
//!     let hub = EventHub::<u32>::new();
//!     let readings = Arc::new(Mutex::new(Vec::new()));
//!
//!     let sink = Arc::clone(&readings);
//!     hub.subscribe_fn("temp", move |value| { sink.lock().push(*value); Ok(()) }, SubscribeOptions::new())
//!         .await?;
//!
//!     hub.publish("temp", 72).await?;
//!     hub.publish("temp", 75).await?;
//!
//!     assert_eq!(*readings.lock(), vec![72, 75]);
//!     assert_eq!(hub.last_event("temp")?.as_deref(), Some(&75));
//!     Ok(())
//! }
//! ```

mod channel;
mod error;
mod hub;
mod options;
mod subscription;

pub use channel::{BoxError, Channel, ChannelMetrics, Event, HandlerResult};
pub use error::{EventHubError, EventHubErrorExt};
pub use hub::{EventHub, HubBuilder, WILDCARD};
pub use options::{HubOptions, SubscribeOptions};
pub use subscription::Subscription;
