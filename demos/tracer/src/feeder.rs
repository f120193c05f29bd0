//! Feeder mode: advertise, accept a viewer, stream a synthetic hand.
//!
//! The motion is a slow sweep: the hand circles in the x/y plane, yaws
//! back and forth, and the fingers curl in a wave. Binary frames go out
//! at 60 Hz on the data channel; once a second a text delta nudges the
//! thumb over the control channel to exercise the partial-update path.

use std::f32::consts::TAU;
use std::time::Duration;

use anyhow::{Context, bail};
use poselink::core::constants::{DEFAULT_CONTROL_PORT, EVENT_QUEUE_DEPTH, TEXT_FRAME_DELIMITER};
use poselink::prelude::*;
use poselink::session::DataHello;
use tokio::sync::mpsc;
use tracing::{info, warn};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn sweep_pose(tick: u64) -> HandPose {
    let t = tick as f32 * FRAME_INTERVAL.as_secs_f32();
    let phase = (t * 0.25) * TAU;
    let mut flexion = [0.0f32; 5];
    for (i, factor) in flexion.iter_mut().enumerate() {
        *factor = 0.5 + 0.5 * (phase * 2.0 + i as f32 * 0.7).sin();
    }
    HandPose::new(
        Vec3::new(phase.cos() * 0.3, phase.sin() * 0.3, 0.5),
        Vec3::new(0.0, (phase.sin() * 60.0).round(), 0.0),
        flexion,
    )
}

pub async fn run() -> anyhow::Result<()> {
    let control_port = std::env::var("POSELINK_CONTROL_PORT")
        .ok()
        .map(|p| p.parse::<u16>())
        .transpose()
        .context("parsing POSELINK_CONTROL_PORT")?
        .unwrap_or(DEFAULT_CONTROL_PORT);

    let service_type = crate::service_type();
    let mut agent = DiscoveryAgent::new()?;
    let listener = StreamListener::bind(control_port).await?;
    let bound_port = listener.local_addr()?.port();
    agent.advertise(
        &service_type,
        &DiscoveryAgent::instance_name("feeder"),
        bound_port,
    )?;
    info!(%service_type, port = bound_port, "advertising; waiting for a viewer");

    let (control_tx, mut control_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let control = listener.accept(Framing::lines(), control_tx).await?;
    info!(viewer = %control.peer_addr(), "viewer connected");

    // The first control unit is the viewer's data-port hello.
    let hello = loop {
        match control_rx.recv().await {
            Some(ChannelEvent::Payload(payload)) => match DataHello::decode(&payload) {
                Ok(hello) => break hello,
                Err(e) => warn!(error = %e, "ignoring pre-hello control frame"),
            },
            Some(ChannelEvent::Disconnected(e)) => bail!("viewer left before hello: {e}"),
            None => bail!("control channel ended before hello"),
        }
    };
    info!(data_port = hello.data_port, "streaming");

    let (data_tx, _data_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let data_endpoint = ServiceEndpoint::new(
        control.peer_addr().ip(),
        hello.data_port,
        TransportKind::Datagram,
    );
    let data = DatagramChannel::connect(data_endpoint, data_tx).await?;

    let codec = FrameCodec::new();
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = control_rx.recv() => match event {
                Some(ChannelEvent::Payload(_)) => {}
                Some(ChannelEvent::Disconnected(e)) => {
                    info!(error = %e, "viewer disconnected");
                    break;
                }
                None => break,
            },
            _ = ticker.tick() => {
                let pose = sweep_pose(tick);
                data.send(&codec.encode_binary(&pose)).await?;

                // One text delta per second on the control channel.
                if tick % 60 == 0 {
                    let delta = PoseDelta::default()
                        .with_flexion(Finger::Thumb, pose.flexion_of(Finger::Thumb));
                    let mut line = codec.encode_text(&delta).into_bytes();
                    line.push(TEXT_FRAME_DELIMITER);
                    control.send(line).await?;
                }
                tick += 1;
            }
        }
    }

    info!("stopping");
    data.close();
    control.close();
    agent.stop();
    Ok(())
}
