//! Session connection state machine.
//!
//! The machine is pure: inputs are injected events, outputs are actions
//! for the driver to execute. All the retry arithmetic lives here, which
//! is what makes the lifecycle testable without a single socket.

use std::time::Duration;

use super::retry::RetryPolicy;

/// Lifecycle state of a session.
///
/// ```text
/// Idle -> Discovering -> Connecting -> Connected
///              ^                           |
///              |        (retry)            v
///              +------ Disconnected ---> Failed (terminal)
/// ```
///
/// `stop()` reaches `Idle` from any state; leaving `Failed` requires an
/// explicit start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing running.
    Idle,
    /// Browsing (or advertising and waiting) for a peer.
    Discovering,
    /// Dialing a resolved endpoint.
    Connecting,
    /// Channels up; pose events flow to the sink.
    Connected,
    /// A channel failed; waiting out the backoff before retrying.
    Disconnected,
    /// Retry budget exhausted. Terminal until restarted.
    Failed,
}

/// Event injected into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// Start (or restart after `Failed`).
    Start,
    /// Discovery produced a usable endpoint, or a peer connected to us.
    EndpointResolved,
    /// Both channels are established.
    ConnectSucceeded,
    /// No candidate endpoint could be connected.
    ConnectFailed,
    /// An established channel reported an I/O error.
    ChannelError,
    /// The retry backoff elapsed.
    BackoffElapsed,
    /// Stop everything.
    Stop,
}

/// Action the driver must execute after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Begin (or restart) browsing / accepting.
    BeginDiscovery,
    /// Dial the queued endpoint(s).
    Dial,
    /// Wait this long, then inject [`SessionInput::BackoffElapsed`].
    Backoff(Duration),
    /// Budget spent: tear down and stay in `Failed`.
    Fail,
    /// Tear everything down.
    Teardown,
}

/// The session state machine.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: ConnectionState,
    attempts: u32,
    policy: RetryPolicy,
}

impl SessionMachine {
    /// New machine in `Idle`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Idle,
            attempts: 0,
            policy,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failures since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Inject one event; returns the action the driver must take, if any.
    ///
    /// Events that make no sense in the current state (a late connect
    /// completion after `stop()`, a duplicate disconnect) are ignored, so
    /// concurrent sources can deliver stale events harmlessly.
    pub fn handle(&mut self, input: SessionInput) -> Option<SessionAction> {
        use ConnectionState::*;
        use SessionInput::*;

        match (self.state, input) {
            (_, Stop) => {
                self.state = Idle;
                self.attempts = 0;
                Some(SessionAction::Teardown)
            }
            (Idle | Failed, Start) => {
                self.state = Discovering;
                self.attempts = 0;
                Some(SessionAction::BeginDiscovery)
            }
            (Discovering, EndpointResolved) => {
                self.state = Connecting;
                Some(SessionAction::Dial)
            }
            (Connecting, ConnectSucceeded) => {
                self.state = Connected;
                self.attempts = 0;
                None
            }
            (Connecting | Discovering, ConnectFailed)
            | (Connecting | Connected, ChannelError) => {
                self.attempts += 1;
                if self.policy.is_exhausted(self.attempts) {
                    self.state = Failed;
                    Some(SessionAction::Fail)
                } else {
                    self.state = Disconnected;
                    Some(SessionAction::Backoff(
                        self.policy.backoff_for(self.attempts - 1),
                    ))
                }
            }
            (Disconnected, BackoffElapsed) => {
                self.state = Discovering;
                Some(SessionAction::BeginDiscovery)
            }
            // Stale or out-of-order event.
            _ => None,
        }
    }
}
