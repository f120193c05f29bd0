//! mDNS discovery agent.
//!
//! Wraps one [`mdns_sd::ServiceDaemon`] for both roles: browsing for an
//! advertised peer (the connecting side) and advertising a control port
//! (the accepting side). Browse results are bridged onto a tokio queue so
//! the session layer consumes them like every other event source.

use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::DiscoveryEvent;
use crate::core::DiscoveryError;
use crate::core::constants::{EVENT_QUEUE_DEPTH, PROP_VERSION};
use crate::core::{ServiceEndpoint, TransportKind};

/// Zero-configuration discovery of the pose service.
///
/// Browsing is lazy, unbounded, and restartable: endpoints are emitted as
/// peers resolve, in no particular order, and the stream never ends on its
/// own. [`stop`](Self::stop) cancels everything outstanding and guarantees
/// no further events.
pub struct DiscoveryAgent {
    daemon: ServiceDaemon,
    advertised: Option<String>,
    browse: Option<(String, JoinHandle<()>)>,
}

impl DiscoveryAgent {
    /// Start the mDNS daemon.
    pub fn new() -> Result<Self, DiscoveryError> {
        let daemon = ServiceDaemon::new().map_err(|e| DiscoveryError::Daemon(e.to_string()))?;
        Ok(Self {
            daemon,
            advertised: None,
            browse: None,
        })
    }

    /// Instance name for this host, e.g. `viewer.my-laptop`.
    pub fn instance_name(role: &str) -> String {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "poselink-host".into());
        format!("{role}.{host}")
    }

    /// Browse for peers advertising `service_type`.
    ///
    /// Every resolved address becomes one [`DiscoveryEvent::Resolved`]
    /// endpoint (a multi-homed peer yields several, to be tried in arrival
    /// order). If nothing resolves within `timeout`, a single advisory
    /// [`DiscoveryEvent::Timeout`] is emitted and browsing continues.
    ///
    /// Calling this again restarts the browse; the previous event stream
    /// ends.
    pub fn browse(
        &mut self,
        service_type: &str,
        timeout: Duration,
    ) -> Result<mpsc::Receiver<DiscoveryEvent>, DiscoveryError> {
        self.stop_browse();

        let receiver = self
            .daemon
            .browse(service_type)
            .map_err(|e| DiscoveryError::Daemon(e.to_string()))?;

        // Our own advertisement must not resolve as a peer.
        let own_fullname = self.advertised.clone();
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        let task = tokio::spawn(async move {
            let deadline = tokio::time::Instant::now() + timeout;
            let mut resolved_any = false;
            let mut timeout_sent = false;

            loop {
                let event = if resolved_any || timeout_sent {
                    match receiver.recv_async().await {
                        Ok(event) => event,
                        Err(_) => return, // daemon gone, browse stopped
                    }
                } else {
                    match tokio::time::timeout_at(deadline, receiver.recv_async()).await {
                        Ok(Ok(event)) => event,
                        Ok(Err(_)) => return,
                        Err(_) => {
                            debug!("no peer resolved before the discovery timeout");
                            timeout_sent = true;
                            if tx.send(DiscoveryEvent::Timeout).await.is_err() {
                                return;
                            }
                            continue;
                        }
                    }
                };

                match event {
                    ServiceEvent::ServiceResolved(peer) => {
                        if own_fullname.as_deref() == Some(peer.get_fullname()) {
                            continue;
                        }
                        debug!(peer = peer.get_fullname(), "resolved pose service");
                        for &host in peer.get_addresses() {
                            let endpoint =
                                ServiceEndpoint::new(host, peer.get_port(), TransportKind::Stream);
                            resolved_any = true;
                            if tx.send(DiscoveryEvent::Resolved(endpoint)).await.is_err() {
                                return;
                            }
                        }
                    }
                    ServiceEvent::ServiceRemoved(_ty, fullname) => {
                        debug!(peer = %fullname, "pose service withdrawn");
                        if tx.send(DiscoveryEvent::Lost(fullname)).await.is_err() {
                            return;
                        }
                    }
                    _ => {}
                }
            }
        });

        self.browse = Some((service_type.to_string(), task));
        Ok(rx)
    }

    /// Advertise a control port under `service_type`.
    ///
    /// Idempotent: advertising while already advertising is a no-op.
    pub fn advertise(
        &mut self,
        service_type: &str,
        instance: &str,
        port: u16,
    ) -> Result<(), DiscoveryError> {
        if self.advertised.is_some() {
            return Ok(());
        }

        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "poselink-host".into());

        let properties = [(PROP_VERSION, env!("CARGO_PKG_VERSION"))];
        let service = ServiceInfo::new(
            service_type,
            instance,
            &format!("{host}.local."),
            "",
            port,
            &properties[..],
        )
        .map_err(|e| DiscoveryError::InvalidServiceType(e.to_string()))?
        .enable_addr_auto();

        let fullname = service.get_fullname().to_string();
        self.daemon
            .register(service)
            .map_err(|e| DiscoveryError::Daemon(e.to_string()))?;

        info!(%fullname, port, "advertising pose service");
        self.advertised = Some(fullname);
        Ok(())
    }

    /// True while an advertisement is registered.
    pub fn is_advertising(&self) -> bool {
        self.advertised.is_some()
    }

    /// Cancel all outstanding browse and advertise operations.
    ///
    /// Safe from any state, including when nothing is active; no events are
    /// delivered after this returns.
    pub fn stop(&mut self) {
        self.stop_browse();
        if let Some(fullname) = self.advertised.take() {
            if let Err(e) = self.daemon.unregister(&fullname) {
                warn!(%fullname, error = %e, "failed to withdraw advertisement");
            }
        }
    }

    fn stop_browse(&mut self) {
        if let Some((service_type, task)) = self.browse.take() {
            task.abort();
            if let Err(e) = self.daemon.stop_browse(&service_type) {
                debug!(%service_type, error = %e, "failed to stop browse");
            }
        }
    }
}

impl Drop for DiscoveryAgent {
    fn drop(&mut self) {
        self.stop();
        let _ = self.daemon.shutdown();
    }
}

impl std::fmt::Debug for DiscoveryAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryAgent")
            .field("advertised", &self.advertised)
            .field("browsing", &self.browse.as_ref().map(|(ty, _)| ty))
            .finish()
    }
}
