//! Notification sinks.
//!
//! The engine receives its sink through its constructor rather than a
//! process-wide dispatcher, so tests and embedders can swap in their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use super::events::{NotifyError, ReconcileEvent};

/// Receives reconciliation events.
///
/// Implementations must not block the caller for long: the engine notifies
/// inline after storage calls return.
pub trait NotificationSink: Send + Sync {
    /// Deliver one event.
    fn notify(&self, event: ReconcileEvent) -> Result<(), NotifyError>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: ReconcileEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Bounded, non-blocking queue sink.
///
/// A full queue drops the event and counts it instead of stalling the
/// engine. Pair with the [`EventStream`] returned by [`ChannelSink::new`].
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<ReconcileEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSink {
    /// Creates a sink and its consumer handle. `capacity` is clamped to ≥ 1.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, EventStream) {
        let (tx, rx) = bounded::<ReconcileEvent>(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));
        (
            Self {
                tx,
                dropped: Arc::clone(&dropped),
            },
            EventStream { rx, dropped },
        )
    }

    /// Events dropped because the queue was full or the stream was gone.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: ReconcileEvent) -> Result<(), NotifyError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(NotifyError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(NotifyError::Disconnected)
            }
        }
    }
}

/// Consumer side of a [`ChannelSink`].
#[derive(Debug)]
pub struct EventStream {
    rx: Receiver<ReconcileEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventStream {
    /// Receive the next event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ReconcileEvent, NotifyError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => NotifyError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => NotifyError::Disconnected,
        })
    }

    /// Everything queued right now, without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<ReconcileEvent> {
        self.rx.try_iter().collect()
    }

    /// Events the producer side had to drop.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
