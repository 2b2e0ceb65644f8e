use std::sync::atomic::{AtomicU8, Ordering};

use crate::connection::{ConnectionEvent, ConnectionObserver};

/// Readiness of the collector connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Down,
    Connecting,
    Ready,
}

impl GateState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => GateState::Connecting,
            2 => GateState::Ready,
            _ => GateState::Down,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            GateState::Down => 0,
            GateState::Connecting => 1,
            GateState::Ready => 2,
        }
    }

    /// State after observing `event`.
    pub fn next(self, event: &ConnectionEvent) -> GateState {
        match event {
            ConnectionEvent::Open => GateState::Ready,
            ConnectionEvent::Error(_) | ConnectionEvent::Close => GateState::Down,
            ConnectionEvent::Connecting => match self {
                GateState::Ready => GateState::Ready,
                _ => GateState::Connecting,
            },
        }
    }
}

/// Readiness flag fed by connection lifecycle events.
///
/// Written only by the connection client, read by every delivery attempt.
/// A send decision racing with a state flip may see the previous value.
#[derive(Debug, Default)]
pub struct ConnectionGate {
    state: AtomicU8,
}

impl ConnectionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        GateState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == GateState::Ready
    }

    /// Apply one event and return the resulting state.
    pub fn observe(&self, event: &ConnectionEvent) -> GateState {
        let previous = self.state();
        let next = previous.next(event);
        self.state.store(next.as_u8(), Ordering::SeqCst);
        if previous != next {
            tracing::debug!(from = ?previous, to = ?next, "connection gate transition");
        }
        next
    }
}

impl ConnectionObserver for ConnectionGate {
    fn on_event(&self, event: &ConnectionEvent) {
        self.observe(event);
    }
}
