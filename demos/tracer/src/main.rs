//! PoseLink Tracer
//!
//! A demo pair for exercising the protocol end to end on one LAN (or one
//! machine):
//!
//! - `viewer`: browses for a feeder, connects, and logs every pose update
//! - `feeder`: advertises, accepts the viewer, and streams a synthetic
//!   sweeping hand
//!
//! Environment variables:
//! - POSELINK_MODE: "viewer" or "feeder" (default: viewer)
//! - POSELINK_SERVICE_TYPE: DNS-SD service type (default: _handpose._tcp.local.)
//! - POSELINK_PEER: "host:port" to dial directly, skipping mDNS (viewer only)
//! - POSELINK_CONTROL_PORT: control port to advertise (feeder only, default 15999)
//! - POSELINK_LOG: tracing filter (default: info)

mod feeder;
mod viewer;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = std::env::var("POSELINK_LOG").unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mode = std::env::var("POSELINK_MODE").unwrap_or_else(|_| "viewer".into());
    match mode.as_str() {
        "viewer" => viewer::run().await,
        "feeder" => feeder::run().await,
        other => anyhow::bail!("unknown POSELINK_MODE {other:?} (use viewer or feeder)"),
    }
    .context(format!("{mode} exited"))
}

/// Service type from the environment, or the protocol default.
pub fn service_type() -> String {
    std::env::var("POSELINK_SERVICE_TYPE")
        .unwrap_or_else(|_| poselink::core::DEFAULT_SERVICE_TYPE.into())
}
