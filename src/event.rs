//! Listener notifications and the serialized dispatcher.
//!
//! All listener callbacks run on a single dedicated dispatcher task, so
//! delivery order matches emission order and callbacks never overlap or
//! race the next state change being applied.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{CaptureBuffer, RecordState};

/// Notifications emitted during a recording session.
///
/// Events are informational; a session never propagates a failure to the
/// caller as a panic or a returned error. Register a callback via
/// [`RecordSessionBuilder::on_event()`].
///
/// [`RecordSessionBuilder::on_event()`]: crate::RecordSessionBuilder::on_event
#[derive(Debug, Clone)]
pub enum RecordEvent {
    /// The session entered a new state. Emitted once per transition;
    /// invalid control calls emit nothing.
    StateChanged(RecordState),

    /// One capture buffer of raw pre-encode bytes, for live metering or
    /// streaming use. Emitted once per capture read.
    Data(CaptureBuffer),

    /// Recording finished and the result file is fully flushed.
    /// Emitted exactly once per successful stop.
    Complete(PathBuf),

    /// A capture, merge, or setup failure, with a human-readable reason.
    Error(String),
}

/// Callback type for receiving [`RecordEvent`]s.
///
/// # Example
///
/// ```
/// use record_audio::{event_callback, RecordEvent};
///
/// let callback = event_callback(|event| {
///     if let RecordEvent::Error(reason) = event {
///         eprintln!("recording error: {reason}");
///     }
/// });
/// ```
pub type EventCallback = Arc<dyn Fn(RecordEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure without manual `Arc` wrapping.
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(RecordEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Emission handle feeding the dispatcher task.
///
/// Cloned into the capture task and pipeline workers. When no callback
/// is registered, emission is a no-op.
#[derive(Clone)]
pub(crate) struct EventHub {
    tx: Option<mpsc::UnboundedSender<RecordEvent>>,
}

impl EventHub {
    /// Creates the hub and, if a callback is registered, spawns the
    /// dispatcher task that delivers events to it one at a time.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(callback: Option<EventCallback>) -> Self {
        let Some(callback) = callback else {
            return Self { tx: None };
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<RecordEvent>();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                callback(event);
            }
            tracing::debug!("event dispatcher exiting");
        });

        Self { tx: Some(tx) }
    }

    pub fn emit(&self, event: RecordEvent) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn state_changed(&self, state: RecordState) {
        self.emit(RecordEvent::StateChanged(state));
    }

    pub fn error(&self, reason: impl Into<String>) {
        self.emit(RecordEvent::Error(reason.into()));
    }
}
