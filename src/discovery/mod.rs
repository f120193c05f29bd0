//! PoseLink - Service Discovery
//!
//! Locates the peer on the local network without a pre-known address,
//! using mDNS/DNS-SD. Either end may browse: the original deployment has
//! the sensor side advertise and the renderer browse, but the roles are
//! symmetric at this layer.
//!
//! Discovery is best-effort and unordered. Multiple advertisers may
//! respond, or none; a peer may resolve to several addresses (IPv4 and
//! IPv6) that are all worth trying. Failure to find anyone within the
//! configured bound is an advisory event, not an error - the session layer
//! decides whether to keep waiting.

mod agent;

pub use agent::DiscoveryAgent;

use crate::core::ServiceEndpoint;

/// Event delivered by a browse operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A peer resolved to a concrete endpoint. One event per address; try
    /// them in arrival order and keep the first that connects.
    Resolved(ServiceEndpoint),
    /// A previously advertised service disappeared from the network.
    Lost(String),
    /// Nothing resolved within the configured bound. Advisory and emitted
    /// at most once per browse; browsing continues.
    Timeout,
}
