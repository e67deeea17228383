//! Connection lifecycle state machine
//!
//! Tracks the Disconnected -> Connecting -> Connected -> Disconnecting cycle
//! for one remote link. The BLE central drives the transitions; keeping the
//! machine here makes the lifecycle rules testable without an adapter.

use tracing::debug;

use crate::errors::{BridgeError, Result};

// ----------------------------------------------------------------------------
// Link State
// ----------------------------------------------------------------------------

/// State of the link to the remote device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Lifecycle state machine for a single remote connection
#[derive(Debug)]
pub struct LinkStateMachine {
    state: LinkState,
}

impl Default for LinkStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStateMachine {
    /// Create a machine in the Disconnected state
    pub fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
        }
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether the link is established
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Whether a connection attempt is in flight
    pub fn is_connecting(&self) -> bool {
        self.state == LinkState::Connecting
    }

    /// Begin a connection attempt
    ///
    /// Only legal from Disconnected; a second connect while one is in flight
    /// or while connected is a caller bug surfaced as a typed error.
    pub fn begin_connect(&mut self) -> Result<()> {
        match self.state {
            LinkState::Disconnected => {
                self.state = LinkState::Connecting;
                Ok(())
            }
            other => Err(BridgeError::link(format!(
                "connect() invalid in state {other:?}"
            ))),
        }
    }

    /// Record that the link was established
    pub fn mark_connected(&mut self) {
        debug!("link established");
        self.state = LinkState::Connected;
    }

    /// Record that a connection attempt failed; the link returns to Disconnected
    pub fn mark_failed(&mut self) {
        debug!("link attempt failed");
        self.state = LinkState::Disconnected;
    }

    /// Begin teardown
    ///
    /// Returns `false` when there is nothing to tear down; disconnect on an
    /// already-disconnected link is a no-op, never an error.
    pub fn begin_disconnect(&mut self) -> bool {
        match self.state {
            LinkState::Connected | LinkState::Connecting => {
                self.state = LinkState::Disconnecting;
                true
            }
            LinkState::Disconnecting | LinkState::Disconnected => false,
        }
    }

    /// Record that teardown completed
    pub fn mark_disconnected(&mut self) {
        self.state = LinkState::Disconnected;
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_lifecycle() {
        let mut link = LinkStateMachine::new();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(!link.is_connected());

        link.begin_connect().unwrap();
        assert!(link.is_connecting());

        link.mark_connected();
        assert!(link.is_connected());

        assert!(link.begin_disconnect());
        assert_eq!(link.state(), LinkState::Disconnecting);

        link.mark_disconnected();
        assert_eq!(link.state(), LinkState::Disconnected);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut link = LinkStateMachine::new();
        assert!(!link.begin_disconnect());
        assert_eq!(link.state(), LinkState::Disconnected);

        // Again, still a no-op.
        assert!(!link.begin_disconnect());
        assert_eq!(link.state(), LinkState::Disconnected);
    }

    #[test]
    fn test_double_connect_rejected() {
        let mut link = LinkStateMachine::new();
        link.begin_connect().unwrap();
        assert!(link.begin_connect().is_err());

        link.mark_connected();
        assert!(link.begin_connect().is_err());
    }

    #[test]
    fn test_failed_attempt_returns_to_disconnected() {
        let mut link = LinkStateMachine::new();
        link.begin_connect().unwrap();
        link.mark_failed();
        assert_eq!(link.state(), LinkState::Disconnected);

        // A fresh attempt is legal after failure.
        link.begin_connect().unwrap();
    }

    #[test]
    fn test_disconnect_during_connect_attempt() {
        let mut link = LinkStateMachine::new();
        link.begin_connect().unwrap();
        assert!(link.begin_disconnect());
        link.mark_disconnected();
        assert_eq!(link.state(), LinkState::Disconnected);
    }
}
