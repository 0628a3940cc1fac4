//! Recorder state machine

use std::fmt;
use thiserror::Error;

/// Recorder states.
///
/// `locked` only exists inside `Capturing`, so a locked-but-idle recorder
/// cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    RequestingPermission,
    Capturing {
        locked: bool,
    },
    Finalizing,
    Cancelled,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RequestingPermission => "requesting-permission",
            Self::Capturing { locked: false } => "capturing",
            Self::Capturing { locked: true } => "capturing-locked",
            Self::Finalizing => "finalizing",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: RecorderState,
    pub action: String,
}

/// Recorder session entity.
///
/// State machine:
///   IDLE -> REQUESTING_PERMISSION (request_permission)
///   REQUESTING_PERMISSION -> IDLE (request_failed: denial or device error)
///   REQUESTING_PERMISSION -> CAPTURING(unlocked) (permission_granted)
///   CAPTURING(l) -> CAPTURING(!l) (toggle_lock)
///   CAPTURING -> FINALIZING (begin_finalize)
///   CAPTURING -> CANCELLED (cancel)
///   FINALIZING | CANCELLED -> IDLE (complete)
#[derive(Debug, Default)]
pub struct RecorderSession {
    state: RecorderState,
}

impl RecorderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RecorderState::Idle
    }

    pub fn is_capturing(&self) -> bool {
        self.state.is_capturing()
    }

    pub fn is_locked(&self) -> bool {
        self.state == RecorderState::Capturing { locked: true }
    }

    fn reject(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state,
            action: action.to_string(),
        }
    }

    pub fn request_permission(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Idle => {
                self.state = RecorderState::RequestingPermission;
                Ok(())
            }
            _ => Err(self.reject("start recording")),
        }
    }

    pub fn request_failed(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::RequestingPermission => {
                self.state = RecorderState::Idle;
                Ok(())
            }
            _ => Err(self.reject("abort permission request")),
        }
    }

    pub fn permission_granted(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::RequestingPermission => {
                self.state = RecorderState::Capturing { locked: false };
                Ok(())
            }
            _ => Err(self.reject("grant permission")),
        }
    }

    /// Flip between push-to-talk and hands-free. Returns the new lock flag.
    pub fn toggle_lock(&mut self) -> Result<bool, InvalidStateTransition> {
        match self.state {
            RecorderState::Capturing { locked } => {
                self.state = RecorderState::Capturing { locked: !locked };
                Ok(!locked)
            }
            _ => Err(self.reject("toggle lock")),
        }
    }

    pub fn begin_finalize(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Capturing { .. } => {
                self.state = RecorderState::Finalizing;
                Ok(())
            }
            _ => Err(self.reject("stop recording")),
        }
    }

    pub fn cancel(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Capturing { .. } => {
                self.state = RecorderState::Cancelled;
                Ok(())
            }
            _ => Err(self.reject("cancel recording")),
        }
    }

    pub fn complete(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RecorderState::Finalizing | RecorderState::Cancelled => {
                self.state = RecorderState::Idle;
                Ok(())
            }
            _ => Err(self.reject("complete recording")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing() -> RecorderSession {
        let mut session = RecorderSession::new();
        session.request_permission().unwrap();
        session.permission_granted().unwrap();
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = RecorderSession::new();
        assert!(session.is_idle());
        assert!(!session.is_capturing());
        assert!(!session.is_locked());
    }

    #[test]
    fn grant_enters_unlocked_capture() {
        let session = capturing();
        assert_eq!(session.state(), RecorderState::Capturing { locked: false });
    }

    #[test]
    fn denial_returns_to_idle() {
        let mut session = RecorderSession::new();
        session.request_permission().unwrap();
        session.request_failed().unwrap();
        assert!(session.is_idle());
    }

    #[test]
    fn only_one_session_at_a_time() {
        let mut session = capturing();
        let err = session.request_permission().unwrap_err();
        assert_eq!(err.current_state, RecorderState::Capturing { locked: false });
        assert!(err.action.contains("start recording"));
    }

    #[test]
    fn lock_toggles_both_ways() {
        let mut session = capturing();
        assert!(session.toggle_lock().unwrap());
        assert!(session.is_locked());
        assert!(!session.toggle_lock().unwrap());
        assert!(!session.is_locked());
    }

    #[test]
    fn lock_outside_capture_fails() {
        let mut session = RecorderSession::new();
        assert!(session.toggle_lock().is_err());
    }

    #[test]
    fn stop_path_returns_to_idle() {
        let mut session = capturing();
        session.toggle_lock().unwrap();
        session.begin_finalize().unwrap();
        assert_eq!(session.state(), RecorderState::Finalizing);
        session.complete().unwrap();
        assert!(session.is_idle());
    }

    #[test]
    fn cancel_path_returns_to_idle() {
        let mut session = capturing();
        session.cancel().unwrap();
        assert_eq!(session.state(), RecorderState::Cancelled);
        session.complete().unwrap();
        assert!(session.is_idle());
    }

    #[test]
    fn stop_from_idle_fails() {
        let mut session = RecorderSession::new();
        assert!(session.begin_finalize().is_err());
        assert!(session.cancel().is_err());
        assert!(session.complete().is_err());
    }

    #[test]
    fn error_message_names_state() {
        let err = InvalidStateTransition {
            current_state: RecorderState::Finalizing,
            action: "toggle lock".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot toggle lock while finalizing"
        );
    }
}
