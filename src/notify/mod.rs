//! Notification collaborator.
//!
//! The engine reports detections, removals, merges and failures to a
//! [`NotificationSink`]. Delivery is best-effort: a sink failure is logged
//! and never undoes or fails the storage operation that produced the event.

/// Event and error types.
pub mod events;
/// Sink trait and the built-in sinks.
pub mod sink;

pub use events::{EventPayload, NotifyError, ReconcileEvent};
pub use sink::{ChannelSink, EventStream, NotificationSink, NullSink};
