use parking_lot::Mutex;
use std::any::type_name;
use std::borrow::Cow;
use std::future::{self, Future};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

#[conduit_derive::conduit_error]
pub enum TransportError {
    /// `send` was called while the link is down.
    #[error("Transport not connected{}: {message}", format_context(.context))]
    NotConnected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Transport I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal transport error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// A byte-frame link to the outside world (socket, serial port, broker, ...).
///
/// Methods take `&self` so one transport can be shared between a connector and the
/// subscriber it registers; implementations use interior mutability.
pub trait Transport: Send + Sync + 'static {
    /// Label used in logs.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(type_name::<Self>())
    }

    fn connect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn disconnect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn is_connected(&self) -> bool;

    /// Writes one frame.
    ///
    /// # Errors
    /// Implementations return [`TransportError::NotConnected`] when called while
    /// disconnected.
    fn send(&self, frame: Vec<u8>) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[derive(Debug, Default)]
struct Loopback {
    connected: AtomicBool,
    frames: Mutex<Vec<Vec<u8>>>,
}

/// In-process transport that keeps every frame it is asked to send.
///
/// Clones share the same link, so a test can hand one clone to a connector and
/// inspect [`MemoryTransport::frames`] through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    link: Arc<Loopback>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent so far, oldest first.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.link.frames.lock().clone()
    }

    /// Removes and returns the recorded frames.
    pub fn take_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.link.frames.lock())
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("memory")
    }

    fn connect(&self) -> impl Future<Output = Result<(), TransportError>> + Send {
        if !self.link.connected.swap(true, Ordering::AcqRel) {
            debug!(transport = "memory", "Connected");
        }
        future::ready(Ok(()))
    }

    fn disconnect(&self) -> impl Future<Output = Result<(), TransportError>> + Send {
        if self.link.connected.swap(false, Ordering::AcqRel) {
            debug!(transport = "memory", "Disconnected");
        }
        future::ready(Ok(()))
    }

    fn is_connected(&self) -> bool {
        self.link.connected.load(Ordering::Acquire)
    }

    fn send(&self, frame: Vec<u8>) -> impl Future<Output = Result<(), TransportError>> + Send {
        let result = if self.is_connected() {
            trace!(transport = "memory", bytes = frame.len(), "Frame sent");
            self.link.frames.lock().push(frame);
            Ok(())
        } else {
            Err(TransportError::NotConnected {
                message: "memory transport is disconnected".into(),
                context: None,
            })
        };
        future::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_requires_connection() {
        let transport = MemoryTransport::new();
        let err = transport.send(b"early".to_vec()).await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected { .. }));

        transport.connect().await.unwrap();
        transport.send(b"ok".to_vec()).await.unwrap();
        assert_eq!(transport.frames(), vec![b"ok".to_vec()]);
    }

    #[tokio::test]
    async fn test_clones_share_the_link() {
        let transport = MemoryTransport::new();
        let observer = transport.clone();

        transport.connect().await.unwrap();
        assert!(observer.is_connected());

        transport.send(vec![1, 2, 3]).await.unwrap();
        assert_eq!(observer.take_frames(), vec![vec![1, 2, 3]]);
        assert!(transport.frames().is_empty());

        observer.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_context_is_rendered() {
        let err: Result<(), TransportError> = Err("link reset".into());
        let err = err.context("flushing").unwrap_err();
        assert_eq!(err.to_string(), "Internal transport error (flushing): link reset");
    }
}
