//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Recording lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Configuring,
    Capturing,
    Stopping,
    Flushing,
    Closed,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Capturing => "capturing",
            Self::Stopping => "stopping",
            Self::Flushing => "flushing",
            Self::Closed => "closed",
        }
    }

    /// The only state reachable from this one
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Configuring),
            Self::Configuring => Some(Self::Capturing),
            Self::Capturing => Some(Self::Stopping),
            Self::Stopping => Some(Self::Flushing),
            Self::Flushing => Some(Self::Closed),
            Self::Closed => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Recording session entity.
///
/// State machine (strictly linear, no skips):
///   IDLE -> CONFIGURING (configure)
///   CONFIGURING -> CAPTURING (start_capture)
///   CAPTURING -> STOPPING (stop_capture)
///   STOPPING -> FLUSHING (flush)
///   FLUSHING -> CLOSED (close)
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: SessionState,
}

impl RecordingSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == SessionState::Capturing
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Transition from IDLE to CONFIGURING
    pub fn configure(&mut self) -> Result<(), InvalidStateTransition> {
        self.advance(SessionState::Configuring, "configure the encoder")
    }

    /// Transition from CONFIGURING to CAPTURING
    pub fn start_capture(&mut self) -> Result<(), InvalidStateTransition> {
        self.advance(SessionState::Capturing, "start capture")
    }

    /// Transition from CAPTURING to STOPPING
    pub fn stop_capture(&mut self) -> Result<(), InvalidStateTransition> {
        self.advance(SessionState::Stopping, "stop capture")
    }

    /// Transition from STOPPING to FLUSHING
    pub fn flush(&mut self) -> Result<(), InvalidStateTransition> {
        self.advance(SessionState::Flushing, "flush the encoder")
    }

    /// Transition from FLUSHING to CLOSED
    pub fn close(&mut self) -> Result<(), InvalidStateTransition> {
        self.advance(SessionState::Closed, "close the session")
    }

    fn advance(&mut self, to: SessionState, action: &str) -> Result<(), InvalidStateTransition> {
        if self.state.next() != Some(to) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle() {
        let session = RecordingSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_capturing());
        assert!(!session.is_closed());
    }

    #[test]
    fn full_lifecycle() {
        let mut session = RecordingSession::new();
        session.configure().unwrap();
        assert_eq!(session.state(), SessionState::Configuring);

        session.start_capture().unwrap();
        assert!(session.is_capturing());

        session.stop_capture().unwrap();
        assert_eq!(session.state(), SessionState::Stopping);

        session.flush().unwrap();
        assert_eq!(session.state(), SessionState::Flushing);

        session.close().unwrap();
        assert!(session.is_closed());
    }

    #[test]
    fn cannot_capture_before_configuring() {
        let mut session = RecordingSession::new();
        let err = session.start_capture().unwrap_err();
        assert_eq!(err.current_state, SessionState::Idle);
        assert!(err.action.contains("start capture"));
    }

    #[test]
    fn cannot_flush_before_stop() {
        let mut session = RecordingSession::new();
        session.configure().unwrap();
        session.start_capture().unwrap();

        let err = session.flush().unwrap_err();
        assert_eq!(err.current_state, SessionState::Capturing);
        assert!(session.is_capturing());
    }

    #[test]
    fn closed_session_cannot_restart() {
        let mut session = RecordingSession::new();
        session.configure().unwrap();
        session.start_capture().unwrap();
        session.stop_capture().unwrap();
        session.flush().unwrap();
        session.close().unwrap();

        let err = session.configure().unwrap_err();
        assert_eq!(err.current_state, SessionState::Closed);
    }

    #[test]
    fn cannot_repeat_a_transition() {
        let mut session = RecordingSession::new();
        session.configure().unwrap();
        assert!(session.configure().is_err());
    }

    #[test]
    fn next_state_chain() {
        assert_eq!(SessionState::Idle.next(), Some(SessionState::Configuring));
        assert_eq!(SessionState::Flushing.next(), Some(SessionState::Closed));
        assert_eq!(SessionState::Closed.next(), None);
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Capturing.to_string(), "capturing");
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: SessionState::Capturing,
            action: "flush the encoder".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("flush the encoder"));
        assert!(msg.contains("capturing"));
    }
}
