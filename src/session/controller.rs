//! High-level session API.
//!
//! Provides [`SessionController`] for sequencing discovery, connection,
//! and streaming, and routing every decoded pose event to the injected
//! [`PoseSink`].

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handshake::DataHello;
use super::retry::RetryPolicy;
use super::state::{ConnectionState, SessionAction, SessionInput, SessionMachine};
use crate::codec::FrameCodec;
use crate::core::constants::{DISCOVERY_TIMEOUT, DEFAULT_SERVICE_TYPE, EVENT_QUEUE_DEPTH};
use crate::core::{PoseSink, SessionError};
use crate::discovery::{DiscoveryAgent, DiscoveryEvent};
use crate::transport::{
    ChannelEvent, DatagramChannel, Framing, ServiceEndpoint, StreamChannel, StreamListener,
};

/// Which end of the discovery handshake this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Browse for the advertised peer and connect to it.
    Browse,
    /// Advertise a control port and accept the peer's connection.
    Advertise {
        /// TCP port to listen and advertise on (0 picks an ephemeral port).
        control_port: u16,
    },
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// DNS-SD service type to browse or advertise.
    pub service_type: String,

    /// Browse for the peer, or advertise and accept.
    pub role: SessionRole,

    /// Reconnect budget and backoff.
    pub retry: RetryPolicy,

    /// Bound on the wait before a discovery-timeout notice.
    pub discovery_timeout: Duration,

    /// Known peer endpoints. When non-empty, discovery is skipped and
    /// these are dialed directly, in order.
    pub static_endpoints: Vec<ServiceEndpoint>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            role: SessionRole::Browse,
            retry: RetryPolicy::default(),
            discovery_timeout: DISCOVERY_TIMEOUT,
            static_endpoints: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Start building a configuration.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }
}

/// Builder for creating a [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set the DNS-SD service type.
    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.config.service_type = service_type.into();
        self
    }

    /// Set the session role.
    pub fn role(mut self, role: SessionRole) -> Self {
        self.config.role = role;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the discovery-timeout bound.
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.discovery_timeout = timeout;
        self
    }

    /// Add a known peer endpoint, bypassing discovery.
    pub fn static_endpoint(mut self, endpoint: ServiceEndpoint) -> Self {
        self.config.static_endpoints.push(endpoint);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Advisory event surfaced to the consumer.
///
/// Notices never change the session state by themselves; they exist so a
/// caller can, say, put up a "still searching" prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Nothing resolved within the configured discovery bound.
    DiscoveryTimedOut,
    /// A previously seen advertisement disappeared.
    PeerLost(String),
}

enum Command {
    Restart,
    Stop(oneshot::Sender<()>),
}

/// A running PoseLink session.
///
/// Owns the discovery agent and both transport channels, applies the
/// retry policy, and feeds every decoded pose event to the sink injected
/// at start.
///
/// # Example
///
/// ```no_run
/// use poselink::core::NullSink;
/// use poselink::session::{SessionConfig, SessionController};
///
/// # async fn run() -> Result<(), poselink::core::SessionError> {
/// let controller = SessionController::start(SessionConfig::default(), NullSink)?;
/// // ... later
/// controller.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionController {
    state_rx: watch::Receiver<ConnectionState>,
    notices: Option<mpsc::Receiver<SessionNotice>>,
    commands: mpsc::Sender<Command>,
    driver: JoinHandle<()>,
}

impl SessionController {
    /// Start a session: moves to `Discovering` and begins browsing (or
    /// advertising) immediately.
    ///
    /// Must be called within a tokio runtime. The sink is owned by the
    /// session's driver task and invoked serially.
    pub fn start<S: PoseSink>(config: SessionConfig, sink: S) -> Result<Self, SessionError> {
        // A purely static browse session never needs the mDNS daemon.
        let needs_daemon = config.static_endpoints.is_empty()
            || matches!(config.role, SessionRole::Advertise { .. });
        let agent = if needs_daemon {
            Some(DiscoveryAgent::new()?)
        } else {
            None
        };

        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (notice_tx, notice_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (command_tx, command_rx) = mpsc::channel(8);

        let machine = SessionMachine::new(config.retry);
        let driver = Driver {
            config,
            sink,
            codec: FrameCodec::new(),
            machine,
            agent,
            listener: None,
            commands: command_rx,
            state_tx,
            notices: notice_tx,
            endpoints: VecDeque::new(),
            incoming: None,
            link: None,
            next_backoff: Duration::ZERO,
        };

        Ok(Self {
            state_rx,
            notices: Some(notice_rx),
            commands: command_tx,
            driver: tokio::spawn(driver.run()),
        })
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Take the advisory notice queue. Yields `Some` exactly once.
    pub fn take_notices(&mut self) -> Option<mpsc::Receiver<SessionNotice>> {
        self.notices.take()
    }

    /// Leave the terminal `Failed` state and start discovering again.
    pub async fn restart(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Restart)
            .await
            .map_err(|_| SessionError::Stopped)
    }

    /// Stop the session from any state: tears down both channels and all
    /// discovery operations, then settles in `Idle`. Idempotent; stopping
    /// an already-stopped session is a no-op.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Stop(ack_tx)).await.is_err() {
            // Driver already gone: nothing left to stop.
            return Ok(());
        }
        let _ = ack_rx.await;
        Ok(())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// The two live channels of a connected session.
struct Link {
    control: StreamChannel,
    control_rx: mpsc::Receiver<ChannelEvent>,
    data: DatagramChannel,
    data_rx: mpsc::Receiver<ChannelEvent>,
}

impl Link {
    fn close(self) {
        self.control.close();
        self.data.close();
    }
}

enum Flow {
    Continue,
    Shutdown(Option<oneshot::Sender<()>>),
}

struct Driver<S: PoseSink> {
    config: SessionConfig,
    sink: S,
    codec: FrameCodec,
    machine: SessionMachine,
    agent: Option<DiscoveryAgent>,
    listener: Option<StreamListener>,
    commands: mpsc::Receiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    notices: mpsc::Sender<SessionNotice>,
    endpoints: VecDeque<ServiceEndpoint>,
    incoming: Option<(StreamChannel, mpsc::Receiver<ChannelEvent>)>,
    link: Option<Link>,
    next_backoff: Duration,
}

impl<S: PoseSink> Driver<S> {
    async fn run(mut self) {
        self.apply(SessionInput::Start);

        loop {
            let flow = match self.machine.state() {
                ConnectionState::Discovering => self.discovering().await,
                ConnectionState::Connecting => self.connecting().await,
                ConnectionState::Connected => self.connected().await,
                ConnectionState::Disconnected => self.disconnected().await,
                ConnectionState::Failed => self.failed().await,
                // Idle is only reachable through Stop, which shuts down.
                ConnectionState::Idle => Flow::Shutdown(None),
            };

            if let Flow::Shutdown(ack) = flow {
                self.teardown();
                self.apply(SessionInput::Stop);
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
                return;
            }
        }
    }

    /// Inject one event into the machine and record its action.
    fn apply(&mut self, input: SessionInput) {
        match self.machine.handle(input) {
            Some(SessionAction::Backoff(delay)) => self.next_backoff = delay,
            Some(SessionAction::Fail) => {
                warn!("reconnect budget exhausted; session failed");
            }
            // BeginDiscovery, Dial, and Teardown are realized by the phase
            // the machine's new state selects.
            _ => {}
        }
        self.publish();
    }

    fn publish(&self) {
        let state = self.machine.state();
        let changed = *self.state_tx.borrow() != state;
        if changed {
            debug!(?state, "session state");
            let _ = self.state_tx.send(state);
        }
    }

    fn notice(&self, notice: SessionNotice) {
        let _ = self.notices.try_send(notice);
    }

    fn teardown(&mut self) {
        if let Some(link) = self.link.take() {
            link.close();
        }
        if let Some((control, _rx)) = self.incoming.take() {
            control.close();
        }
        self.endpoints.clear();
        self.listener = None;
        if let Some(agent) = self.agent.as_mut() {
            agent.stop();
        }
    }

    fn handle_command(&self, command: Option<Command>) -> Flow {
        match command {
            Some(Command::Stop(ack)) => Flow::Shutdown(Some(ack)),
            // Restart only matters in Failed; elsewhere the session is
            // already running.
            Some(Command::Restart) => Flow::Continue,
            None => Flow::Shutdown(None),
        }
    }

    // --- Discovering -----------------------------------------------------

    async fn discovering(&mut self) -> Flow {
        // Known endpoints skip the browse entirely.
        if !self.config.static_endpoints.is_empty() {
            self.endpoints = self.config.static_endpoints.iter().copied().collect();
            self.apply(SessionInput::EndpointResolved);
            return Flow::Continue;
        }

        match self.config.role {
            SessionRole::Browse => self.browse_for_peer().await,
            SessionRole::Advertise { control_port } => self.accept_peer(control_port).await,
        }
    }

    async fn browse_for_peer(&mut self) -> Flow {
        let Some(agent) = self.agent.as_mut() else {
            self.apply(SessionInput::ConnectFailed);
            return Flow::Continue;
        };

        let mut events =
            match agent.browse(&self.config.service_type, self.config.discovery_timeout) {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "browse failed to start");
                    self.apply(SessionInput::ConnectFailed);
                    return Flow::Continue;
                }
            };

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    if let Flow::Shutdown(ack) = self.handle_command(command) {
                        return Flow::Shutdown(ack);
                    }
                }
                event = events.recv() => match event {
                    Some(DiscoveryEvent::Resolved(endpoint)) => {
                        info!(%endpoint, "peer resolved");
                        self.endpoints.push_back(endpoint);
                        // A multi-homed peer resolves several addresses at
                        // once; queue whatever else is already waiting.
                        while let Ok(extra) = events.try_recv() {
                            if let DiscoveryEvent::Resolved(endpoint) = extra {
                                self.endpoints.push_back(endpoint);
                            }
                        }
                        self.apply(SessionInput::EndpointResolved);
                        return Flow::Continue;
                    }
                    Some(DiscoveryEvent::Timeout) => {
                        self.notice(SessionNotice::DiscoveryTimedOut);
                    }
                    Some(DiscoveryEvent::Lost(name)) => {
                        self.notice(SessionNotice::PeerLost(name));
                    }
                    None => {
                        warn!("discovery stream ended");
                        self.apply(SessionInput::ConnectFailed);
                        return Flow::Continue;
                    }
                },
            }
        }
    }

    async fn accept_peer(&mut self, control_port: u16) -> Flow {
        if self.listener.is_none() {
            match StreamListener::bind(control_port).await {
                Ok(listener) => self.listener = Some(listener),
                Err(e) => {
                    warn!(error = %e, control_port, "control listener bind failed");
                    self.apply(SessionInput::ConnectFailed);
                    return Flow::Continue;
                }
            }
        }
        let Some(listener) = self.listener.as_ref() else {
            self.apply(SessionInput::ConnectFailed);
            return Flow::Continue;
        };

        let bound_port = match listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(e) => {
                warn!(error = %e, "control listener lost its address");
                self.listener = None;
                self.apply(SessionInput::ConnectFailed);
                return Flow::Continue;
            }
        };

        if let Some(agent) = self.agent.as_mut() {
            let instance = DiscoveryAgent::instance_name("consumer");
            if let Err(e) = agent.advertise(&self.config.service_type, &instance, bound_port) {
                warn!(error = %e, "advertise failed");
                self.apply(SessionInput::ConnectFailed);
                return Flow::Continue;
            }
        }

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        tokio::select! {
            command = self.commands.recv() => self.handle_command(command),
            accepted = listener.accept(Framing::lines(), events_tx) => match accepted {
                Ok(control) => {
                    self.incoming = Some((control, events_rx));
                    self.apply(SessionInput::EndpointResolved);
                    Flow::Continue
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    self.apply(SessionInput::ConnectFailed);
                    Flow::Continue
                }
            },
        }
    }

    // --- Connecting ------------------------------------------------------

    async fn connecting(&mut self) -> Flow {
        // The accepting side already holds its control channel; the
        // browsing side dials candidates in arrival order and keeps the
        // first that completes.
        let established = match self.incoming.take() {
            Some(incoming) => Some(incoming),
            None => {
                let mut established = None;
                while let Some(endpoint) = self.endpoints.pop_front() {
                    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
                    match StreamChannel::connect(endpoint, Framing::lines(), events_tx).await {
                        Ok(control) => {
                            info!(%endpoint, "control channel connected");
                            established = Some((control, events_rx));
                            break;
                        }
                        Err(e) => {
                            debug!(%endpoint, error = %e, "candidate endpoint rejected");
                        }
                    }
                }
                established
            }
        };

        let Some((control, control_rx)) = established else {
            self.apply(SessionInput::ConnectFailed);
            return Flow::Continue;
        };

        let (data_tx, data_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let data = match DatagramChannel::bind(0, data_tx).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "data channel bind failed");
                control.close();
                self.apply(SessionInput::ConnectFailed);
                return Flow::Continue;
            }
        };

        let hello = DataHello {
            data_port: data.local_addr().port(),
        };
        if let Err(e) = control.send(hello.encode()).await {
            warn!(error = %e, "data-port hello failed");
            control.close();
            data.close();
            self.apply(SessionInput::ConnectFailed);
            return Flow::Continue;
        }

        info!(data_port = hello.data_port, "session connected");
        self.link = Some(Link {
            control,
            control_rx,
            data,
            data_rx,
        });
        self.apply(SessionInput::ConnectSucceeded);
        Flow::Continue
    }

    // --- Connected -------------------------------------------------------

    async fn connected(&mut self) -> Flow {
        let Some(mut link) = self.link.take() else {
            self.apply(SessionInput::ChannelError);
            return Flow::Continue;
        };

        let flow = loop {
            tokio::select! {
                command = self.commands.recv() => {
                    if let Flow::Shutdown(ack) = self.handle_command(command) {
                        break Flow::Shutdown(ack);
                    }
                }
                event = link.control_rx.recv() => match event {
                    Some(ChannelEvent::Payload(payload)) => {
                        self.deliver(self.codec.decode_text(&payload));
                    }
                    Some(ChannelEvent::Disconnected(e)) => {
                        info!(error = %e, "control channel lost");
                        self.apply(SessionInput::ChannelError);
                        break Flow::Continue;
                    }
                    None => {
                        self.apply(SessionInput::ChannelError);
                        break Flow::Continue;
                    }
                },
                event = link.data_rx.recv() => match event {
                    Some(ChannelEvent::Payload(payload)) => {
                        // The data channel is nominally binary-only, but
                        // the codec's length inference keeps a text frame
                        // sent there from being fatal.
                        self.deliver(self.codec.decode(&payload));
                    }
                    Some(ChannelEvent::Disconnected(e)) => {
                        info!(error = %e, "data channel lost");
                        self.apply(SessionInput::ChannelError);
                        break Flow::Continue;
                    }
                    None => {
                        self.apply(SessionInput::ChannelError);
                        break Flow::Continue;
                    }
                },
            }
        };

        link.close();
        flow
    }

    fn deliver(&mut self, decoded: Result<crate::core::PoseEvent, crate::core::DecodeError>) {
        match decoded {
            Ok(event) => event.apply_to(&mut self.sink),
            // A malformed frame costs itself, never the stream.
            Err(e) => debug!(error = %e, "dropping malformed frame"),
        }
    }

    // --- Disconnected ----------------------------------------------------

    async fn disconnected(&mut self) -> Flow {
        let delay = self.next_backoff;
        info!(?delay, attempts = self.machine.attempts(), "backing off before rediscovery");
        tokio::select! {
            command = self.commands.recv() => self.handle_command(command),
            _ = tokio::time::sleep(delay) => {
                self.apply(SessionInput::BackoffElapsed);
                Flow::Continue
            }
        }
    }

    // --- Failed ----------------------------------------------------------

    async fn failed(&mut self) -> Flow {
        self.teardown();
        match self.commands.recv().await {
            Some(Command::Restart) => {
                info!("restarting failed session");
                self.apply(SessionInput::Start);
                Flow::Continue
            }
            Some(Command::Stop(ack)) => Flow::Shutdown(Some(ack)),
            None => Flow::Shutdown(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::core::{Finger, HandPose, PoseDelta, Vec3};
    use crate::transport::TransportKind;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    /// Sink that records updates behind a shared handle.
    #[derive(Clone, Default)]
    struct SharedSink {
        locations: Arc<Mutex<Vec<Vec3>>>,
        rotations: Arc<Mutex<Vec<Vec3>>>,
        flexions: Arc<Mutex<Vec<(Finger, f32)>>>,
    }

    impl PoseSink for SharedSink {
        fn set_location(&mut self, location: Vec3) {
            self.locations.lock().unwrap().push(location);
        }

        fn set_rotation(&mut self, rotation: Vec3) {
            self.rotations.lock().unwrap().push(rotation);
        }

        fn set_finger_flexion(&mut self, finger: Finger, factor: f32) {
            self.flexions.lock().unwrap().push((finger, factor));
        }
    }

    fn stream_endpoint(addr: SocketAddr) -> ServiceEndpoint {
        ServiceEndpoint::new("127.0.0.1".parse().unwrap(), addr.port(), TransportKind::Stream)
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(10),
            multiplier: 2,
            max_backoff: Duration::from_millis(40),
        }
    }

    /// Producer half: accepts the control connection, reads the hello, and
    /// streams one binary frame plus one text delta.
    async fn run_producer(listener: tokio::net::TcpListener, pose: HandPose, delta: PoseDelta) {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();

        let mut hello_line = String::new();
        let mut reader = BufReader::new(read_half);
        reader.read_line(&mut hello_line).await.unwrap();
        let hello = DataHello::decode(hello_line.trim_end().as_bytes()).unwrap();

        let udp = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let frame = codec::encode_binary(&pose);
        // Loopback UDP is reliable, but give the consumer a few chances.
        for _ in 0..3 {
            udp.send_to(&frame, ("127.0.0.1", hello.data_port))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut text = codec::encode_text(&delta).into_bytes();
        text.push(b'\n');
        write_half.write_all(&text).await.unwrap();

        // Hold the control channel open until the consumer is done.
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_static_endpoint_session_delivers_poses() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let pose = HandPose::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 45.0, 0.0),
            [0.1, 0.2, 0.3, 0.4, 0.5],
        );
        let delta = PoseDelta::default().with_flexion(Finger::Index, 0.9);
        tokio::spawn(run_producer(listener, pose, delta));

        let sink = SharedSink::default();
        let config = SessionConfig::builder()
            .static_endpoint(stream_endpoint(addr))
            .retry(fast_retry(2))
            .build();
        let controller = SessionController::start(config, sink.clone()).unwrap();

        let mut states = controller.watch_state();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| *s == ConnectionState::Connected),
        )
        .await
        .expect("session should connect")
        .unwrap();

        // Wait until both the binary pose and the text delta arrived.
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let got_pose = sink
                    .locations
                    .lock()
                    .unwrap()
                    .contains(&Vec3::new(1.0, 2.0, 3.0));
                let got_delta = sink
                    .flexions
                    .lock()
                    .unwrap()
                    .contains(&(Finger::Index, 0.9));
                if got_pose && got_delta {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("sink should receive the pose and the delta");

        controller.stop().await.unwrap();
        assert_eq!(controller.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_reaches_failed() {
        // Reserve a port, then free it so every dial is refused.
        let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = dead.local_addr().unwrap();
        drop(dead);

        let config = SessionConfig::builder()
            .static_endpoint(stream_endpoint(addr))
            .retry(fast_retry(1))
            .build();
        let controller = SessionController::start(config, crate::core::NullSink).unwrap();

        let mut states = controller.watch_state();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| *s == ConnectionState::Failed),
        )
        .await
        .expect("session should fail after exhausting retries")
        .unwrap();

        // Failed is terminal until an explicit restart.
        controller.restart().await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| *s != ConnectionState::Failed),
        )
        .await
        .expect("restart should leave the failed state")
        .unwrap();

        controller.stop().await.unwrap();
        assert_eq!(controller.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_stop_while_connected_settles_idle() {
        // A peer that connects but never streams anything.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let config = SessionConfig::builder()
            .static_endpoint(stream_endpoint(addr))
            .retry(fast_retry(1))
            .build();
        let controller = SessionController::start(config, crate::core::NullSink).unwrap();

        let mut states = controller.watch_state();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| *s == ConnectionState::Connected),
        )
        .await
        .expect("session should connect")
        .unwrap();

        controller.stop().await.unwrap();
        assert_eq!(controller.state(), ConnectionState::Idle);
    }
}
