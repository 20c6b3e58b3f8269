//! Connection state machine

use crate::{Error, Result};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport open, nothing read yet
    Initial,

    /// Waiting for the server greeting
    AwaitingGreeting,

    /// Greeting parsed, auth response being written
    SendingAuthResponse,

    /// Auth response sent, awaiting OK/ERR
    AwaitingAuthAck,

    /// Authenticated, `SET NAMES` in flight
    NegotiatingCharset,

    /// Handshake complete
    Ready,

    /// Closed
    Closed,
}

impl ConnectionState {
    /// Check if transition is valid
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (Initial, AwaitingGreeting)
                | (AwaitingGreeting, SendingAuthResponse)
                | (SendingAuthResponse, AwaitingAuthAck)
                | (AwaitingAuthAck, NegotiatingCharset)
                | (NegotiatingCharset, Ready)
        ) || (next == Closed && *self != Closed)
    }

    /// Transition to new state
    pub fn transition(&mut self, next: ConnectionState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidState {
                expected: format!("valid transition from {}", self),
                actual: next.to_string(),
            });
        }
        *self = next;
        Ok(())
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::AwaitingGreeting => write!(f, "awaiting_greeting"),
            Self::SendingAuthResponse => write!(f, "sending_auth_response"),
            Self::AwaitingAuthAck => write!(f, "awaiting_auth_ack"),
            Self::NegotiatingCharset => write!(f, "negotiating_charset"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_transitions() {
        let mut state = ConnectionState::Initial;
        assert!(state.transition(ConnectionState::AwaitingGreeting).is_ok());
        assert!(state.transition(ConnectionState::SendingAuthResponse).is_ok());
        assert!(state.transition(ConnectionState::AwaitingAuthAck).is_ok());
        assert!(state.transition(ConnectionState::NegotiatingCharset).is_ok());
        assert!(state.transition(ConnectionState::Ready).is_ok());
    }

    #[test]
    fn test_cannot_skip_authentication() {
        let mut state = ConnectionState::AwaitingGreeting;
        assert!(state.transition(ConnectionState::NegotiatingCharset).is_err());
        assert!(state.transition(ConnectionState::Ready).is_err());
        assert_eq!(state, ConnectionState::AwaitingGreeting);
    }

    #[test]
    fn test_close_from_any_open_state() {
        let mut state = ConnectionState::AwaitingAuthAck;
        assert!(state.transition(ConnectionState::Closed).is_ok());

        let mut state = ConnectionState::Ready;
        assert!(state.transition(ConnectionState::Closed).is_ok());
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut state = ConnectionState::Closed;
        let err = state.transition(ConnectionState::Closed).unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert!(state.transition(ConnectionState::Ready).is_err());
    }
}
