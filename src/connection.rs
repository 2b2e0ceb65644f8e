use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::ConnectionError;

/// Lifecycle events emitted by a connection client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt has started.
    Connecting,
    /// The socket is open and frames can be sent.
    Open,
    /// The socket failed; carries the error text.
    Error(String),
    /// The socket was closed by either side.
    Close,
}

/// Receives [`ConnectionEvent`]s from a connection client.
pub trait ConnectionObserver: Send + Sync {
    fn on_event(&self, event: &ConnectionEvent);
}

/// Persistent link to the collector.
///
/// Implementations own reconnection. The transport only calls `send` after
/// its gate reported the connection as open, and expects `send` to hand the
/// frame off without blocking.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Queue one binary frame for the socket writer.
    ///
    /// **Returns**
    /// - `Ok(())` if the frame was accepted for writing.
    /// - `Err(..)` if the writer is gone and the frame was discarded.
    fn send(&self, frame: Vec<u8>) -> Result<(), ConnectionError>;

    /// Begin connecting if the client was built without starting.
    ///
    /// Default implementation is a no-op.
    fn start(&self) -> Result<(), ConnectionError> {
        Ok(())
    }

    /// Stop reconnecting and close the socket.
    ///
    /// Default implementation is a no-op.
    async fn close(&self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

/// A connection that keeps every frame in memory.
///
/// Useful for exercising the transport without a collector, and for unit
/// tests that inspect what would have gone over the wire.
#[derive(Clone, Default)]
pub struct MemoryConnection {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent so far, oldest first.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn take_frames(&self) -> Vec<Vec<u8>> {
        self.frames
            .lock()
            .map(|mut f| std::mem::take(&mut *f))
            .unwrap_or_default()
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    fn send(&self, frame: Vec<u8>) -> Result<(), ConnectionError> {
        let mut frames = self.frames.lock().map_err(|_| ConnectionError::Closed)?;
        frames.push(frame);
        Ok(())
    }
}
