//! Reconnecting WebSocket client used as the collector connection.
//!
//! A single background task owns the socket. It connects, reports lifecycle
//! events to the registered observers, writes queued binary frames, and
//! after an error or close waits a fixed interval before trying again.
//! Frames queued while no socket is open are discarded on the next open.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::DEFAULT_RECONNECT_INTERVAL_MS;
use crate::connection::{Connection, ConnectionEvent, ConnectionObserver};
use crate::error::ConnectionError;

/// Reconnection policy and target of a [`WsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub url: String,
    pub reconnect_interval: Duration,
    /// Start connecting as soon as the client is built.
    pub auto_connect: bool,
    /// Consecutive failed attempts tolerated before giving up. `None`
    /// retries forever.
    pub max_retries: Option<u32>,
}

impl ClientOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            auto_connect: true,
            max_retries: None,
        }
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Ended {
    Shutdown,
    Closed,
    Failed(tokio_tungstenite::tungstenite::Error),
}

struct Worker {
    options: ClientOptions,
    observers: Vec<Arc<dyn ConnectionObserver>>,
    frames: mpsc::UnboundedReceiver<Vec<u8>>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    fn emit(&self, event: ConnectionEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    fn discard_stale_frames(&mut self) {
        let mut dropped = 0usize;
        while self.frames.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded frames queued while disconnected");
        }
    }

    async fn run(mut self) {
        let url = self.options.url.clone();
        let mut failures: u32 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.emit(ConnectionEvent::Connecting);
            match connect_async(url.as_str()).await {
                Ok((socket, _response)) => {
                    failures = 0;
                    self.discard_stale_frames();
                    tracing::debug!(%url, "collector connection open");
                    self.emit(ConnectionEvent::Open);

                    match self.pump(socket).await {
                        Ended::Shutdown => {
                            self.emit(ConnectionEvent::Close);
                            break;
                        }
                        Ended::Closed => {
                            tracing::debug!(%url, "collector connection closed");
                            self.emit(ConnectionEvent::Close);
                        }
                        Ended::Failed(e) => {
                            tracing::warn!(%url, error = %e, "collector socket error");
                            self.emit(ConnectionEvent::Error(e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    tracing::warn!(%url, error = %e, attempt = failures, "collector connect failed");
                    self.emit(ConnectionEvent::Error(e.to_string()));
                }
            }

            if let Some(max) = self.options.max_retries {
                if failures > max {
                    tracing::warn!(%url, max_retries = max, "giving up on collector connection");
                    break;
                }
            }

            tokio::select! {
                _ = sleep(self.options.reconnect_interval) => {}
                _ = self.shutdown.changed() => break,
            }
        }
    }

    async fn pump(&mut self, socket: Socket) -> Ended {
        let (mut sink, mut source) = socket.split();

        loop {
            tokio::select! {
                frame = self.frames.recv() => match frame {
                    Some(bytes) => {
                        if let Err(e) = sink.send(Message::Binary(bytes)).await {
                            return Ended::Failed(e);
                        }
                    }
                    None => {
                        let _ = sink.close().await;
                        return Ended::Shutdown;
                    }
                },
                incoming = source.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None => return Ended::Closed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Ended::Failed(e),
                },
                _ = self.shutdown.changed() => {
                    let _ = sink.close().await;
                    return Ended::Shutdown;
                }
            }
        }
    }
}

/// WebSocket [`Connection`] with fixed-delay reconnection.
pub struct WsClient {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    shutdown: watch::Sender<bool>,
    pending: Mutex<Option<Worker>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WsClient {
    /// Build a client reporting to `observers`. Starts connecting right
    /// away when `options.auto_connect` is set, which requires a running
    /// tokio runtime.
    pub fn new(
        options: ClientOptions,
        observers: Vec<Arc<dyn ConnectionObserver>>,
    ) -> Result<Self, ConnectionError> {
        let auto_connect = options.auto_connect;
        let (sender, frames) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            options,
            observers,
            frames,
            shutdown: shutdown_rx,
        };
        let client = Self {
            sender,
            shutdown,
            pending: Mutex::new(Some(worker)),
            handle: Mutex::new(None),
        };

        if auto_connect {
            client.connect()?;
        }
        Ok(client)
    }

    /// Spawn the connection task. Calling it again once started is a no-op.
    pub fn connect(&self) -> Result<(), ConnectionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConnectionError::NoRuntime)?;

        let worker = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let handle = runtime.spawn(worker.run());
            *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for WsClient {
    fn send(&self, frame: Vec<u8>) -> Result<(), ConnectionError> {
        self.sender.send(frame).map_err(|_| ConnectionError::Closed)
    }

    fn start(&self) -> Result<(), ConnectionError> {
        self.connect()
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        let _ = self.shutdown.send(true);
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Ok(())
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
