use conduit::{Transport, TransportError};
use serde::{Deserialize, Serialize};
use std::future::{self, Future};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A sensor sample as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor: String,
    pub celsius: f64,
}

impl Reading {
    pub fn new(sensor: &str, celsius: f64) -> Self {
        Self { sensor: sensor.to_owned(), celsius }
    }

    pub fn json(&self) -> String {
        format!(r#"{{"sensor":"{}","celsius":{}}}"#, self.sensor, self.celsius)
    }
}

/// Connects fine but fails every send, counting the attempts.
#[derive(Debug, Clone, Default)]
pub struct BrokenTransport {
    connected: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
}

impl BrokenTransport {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for BrokenTransport {
    fn connect(&self) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.connected.store(true, Ordering::SeqCst);
        future::ready(Ok(()))
    }

    fn disconnect(&self) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.connected.store(false, Ordering::SeqCst);
        future::ready(Ok(()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send(&self, _frame: Vec<u8>) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        future::ready(Err(TransportError::Io {
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer went away"),
            context: None,
        }))
    }
}

/// Refuses to connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unreachable;

impl Transport for Unreachable {
    async fn connect(&self) -> Result<(), TransportError> {
        Err(TransportError::Io {
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            context: None,
        })
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }

    async fn send(&self, _frame: Vec<u8>) -> Result<(), TransportError> {
        Err("never connected".into())
    }
}
