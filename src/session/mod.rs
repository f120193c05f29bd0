//! PoseLink - Session Layer
//!
//! Sequences discovery, connection, and streaming:
//!
//! - **State machine**: [`SessionMachine`] with the
//!   `Idle -> Discovering -> Connecting -> Connected` lifecycle
//! - **Retry policy**: [`RetryPolicy`] with bounded exponential backoff
//! - **Data-port hello**: [`DataHello`] in-band handshake
//! - **Controller**: [`SessionController`], the one piece of long-lived
//!   mutable state in the crate
//!
//! Connect completions, disconnects, and retry timers arrive from
//! independent channels; the controller serializes every transition
//! through a single driver task, so the machine itself never needs a
//! lock. The injected [`PoseSink`](crate::core::PoseSink) is likewise
//! invoked from that one task only.

mod controller;
mod handshake;
mod retry;
mod state;

pub use controller::{
    SessionConfig, SessionConfigBuilder, SessionController, SessionNotice, SessionRole,
};
pub use handshake::DataHello;
pub use retry::RetryPolicy;
pub use state::{ConnectionState, SessionAction, SessionInput, SessionMachine};
