//! Crate-boundary error type, mirroring the teacher's `GBAError`.
//!
//! Only thread-lifecycle and construction failures are modeled here;
//! register decoding and internal arithmetic never produce a `CoreError`.

use std::fmt;

#[derive(Debug)]
pub enum CoreError {
    /// A lifecycle call (`pause`, `interrupt`, `continue_`, ...) was made
    /// against a state that does not accept it.
    InvalidStateTransition { from: String, action: String },
    /// The worker thread panicked or otherwise ended without reaching
    /// `Shutdown`.
    ThreadPanicked(String),
    /// A `SyncPoint` barrier was cancelled while a caller was waiting on it.
    SyncCancelled,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::InvalidStateTransition { from, action } => {
                write!(f, "cannot {} while in state {}", action, from)
            }
            CoreError::ThreadPanicked(msg) => write!(f, "core thread panicked: {}", msg),
            CoreError::SyncCancelled => write!(f, "sync point was cancelled while waiting"),
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
