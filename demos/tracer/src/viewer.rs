//! Viewer mode: discover a feeder and log its pose stream.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Context;
use poselink::prelude::*;
use tracing::{info, warn};

/// Sink that logs updates, rate-limited so a 60 Hz stream stays readable.
struct TraceSink {
    last_report: Instant,
    frames: u64,
    latest_location: Vec3,
    latest_rotation: Vec3,
    latest_flexion: [f32; 5],
}

impl TraceSink {
    fn new() -> Self {
        Self {
            last_report: Instant::now(),
            frames: 0,
            latest_location: Vec3::ZERO,
            latest_rotation: Vec3::ZERO,
            latest_flexion: [0.0; 5],
        }
    }

    fn maybe_report(&mut self) {
        if self.last_report.elapsed() >= Duration::from_secs(1) {
            info!(
                frames = self.frames,
                location = ?self.latest_location,
                rotation = ?self.latest_rotation,
                flexion = ?self.latest_flexion,
                "pose stream"
            );
            self.frames = 0;
            self.last_report = Instant::now();
        }
    }
}

impl PoseSink for TraceSink {
    fn set_location(&mut self, location: Vec3) {
        self.latest_location = location;
        self.frames += 1;
        self.maybe_report();
    }

    fn set_rotation(&mut self, rotation: Vec3) {
        self.latest_rotation = rotation;
    }

    fn set_finger_flexion(&mut self, finger: Finger, factor: f32) {
        self.latest_flexion[finger.index()] = factor;
    }
}

pub async fn run() -> anyhow::Result<()> {
    let mut builder = SessionConfig::builder().service_type(crate::service_type());

    if let Ok(peer) = std::env::var("POSELINK_PEER") {
        let addr: SocketAddr = peer.parse().context("parsing POSELINK_PEER")?;
        builder = builder.static_endpoint(ServiceEndpoint::new(
            addr.ip(),
            addr.port(),
            TransportKind::Stream,
        ));
        info!(%addr, "dialing peer directly");
    } else {
        info!(service_type = %crate::service_type(), "browsing for a feeder");
    }

    let mut controller = SessionController::start(builder.build(), TraceSink::new())?;

    let mut notices = controller
        .take_notices()
        .context("notice queue already taken")?;
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            match notice {
                SessionNotice::DiscoveryTimedOut => {
                    warn!("no feeder found yet; still searching")
                }
                SessionNotice::PeerLost(name) => warn!(%name, "feeder disappeared"),
            }
        }
    });

    let mut states = controller.watch_state();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            info!(state = ?*states.borrow(), "session");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("stopping");
    controller.stop().await?;
    Ok(())
}
