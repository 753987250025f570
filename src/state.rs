//! Recording lifecycle states.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a [`RecordSession`].
///
/// Exactly one value is active per session. The capture task reads the
/// state on every loop iteration and exits as soon as it leaves
/// `Recording`; control calls are the only writers apart from the
/// capture task's own teardown.
///
/// [`RecordSession`]: crate::RecordSession
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordState {
    /// No recording in progress.
    Idle = 0,
    /// Capture loop running, audio flowing into the pipeline.
    Recording = 1,
    /// Capture suspended; segments retained for resume.
    Pause = 2,
    /// Stop requested; the capture loop is draining and finalizing.
    Stop = 3,
    /// Finalization complete. Announced via state events only; the
    /// session's stored state returns to [`Idle`](Self::Idle).
    Finish = 4,
}

impl RecordState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Recording,
            2 => Self::Pause,
            3 => Self::Stop,
            4 => Self::Finish,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Finish => "finish",
        };
        write!(f, "{name}")
    }
}

/// Atomic cell holding the session state.
///
/// This is the only value shared mutably across tasks; the capture loop
/// polls it as its continuation signal, so all accesses use `SeqCst`.
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(RecordState::Idle as u8))
    }

    pub fn get(&self) -> RecordState {
        RecordState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: RecordState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Atomically moves `from` to `to`. Returns `false` if the state had
    /// already changed (for example a capture failure racing a control
    /// call).
    pub fn transition(&self, from: RecordState, to: RecordState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
