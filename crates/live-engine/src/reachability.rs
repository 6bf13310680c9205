//! Host reachability tracking.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use live_ipc::ReachabilityStatus;

/// Port probed on the API host.
pub const DEFAULT_PROBE_PORT: u16 = 443;

/// Interval between probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(10);

/// Connect timeout for a single probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

type Listener = Box<dyn Fn(ReachabilityStatus) + Send + Sync>;

/// Tracks whether the ingest API host is reachable.
///
/// Status starts as `Unknown`, which counts as reachable.
pub struct ReachabilityMonitor {
    host: String,
    status: Arc<RwLock<ReachabilityStatus>>,
    listener: Arc<RwLock<Option<Listener>>>,
    probe: Mutex<Option<Probe>>,
}

struct Probe {
    should_stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ReachabilityMonitor {
    /// Create a monitor for `host` without starting a probe.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            status: Arc::new(RwLock::new(ReachabilityStatus::Unknown)),
            listener: Arc::new(RwLock::new(None)),
            probe: Mutex::new(None),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn status(&self) -> ReachabilityStatus {
        *self.status.read()
    }

    /// True unless the last status was exactly `NotReachable`.
    pub fn is_reachable(&self) -> bool {
        self.status().is_reachable()
    }

    /// Record a status from any producer.
    pub fn update(&self, status: ReachabilityStatus) {
        apply(&self.status, &self.listener, status);
    }

    /// Register a callback invoked when the status changes.
    pub fn set_listener<F>(&self, listener: F)
    where
        F: Fn(ReachabilityStatus) + Send + Sync + 'static,
    {
        *self.listener.write() = Some(Box::new(listener));
    }

    /// Start probing `host:port` on a background thread. Replaces any
    /// running probe.
    pub fn start_probe(&self, port: u16, interval: Duration) -> std::io::Result<()> {
        self.stop_probe();

        let should_stop = Arc::new(AtomicBool::new(false));
        let target = format!("{}:{}", self.host, port);
        let status = Arc::clone(&self.status);
        let listener = Arc::clone(&self.listener);
        let stop = Arc::clone(&should_stop);

        let handle = thread::Builder::new()
            .name("reachability".into())
            .spawn(move || probe_loop(target, interval, status, listener, stop))?;

        info!(host = %self.host, port, "Reachability probe started");
        *self.probe.lock() = Some(Probe {
            should_stop,
            handle,
        });
        Ok(())
    }

    /// Stop the background probe, if any.
    pub fn stop_probe(&self) {
        if let Some(probe) = self.probe.lock().take() {
            probe.should_stop.store(true, Ordering::SeqCst);
            probe.handle.thread().unpark();
            let _ = probe.handle.join();
            debug!("Reachability probe stopped");
        }
    }
}

impl Drop for ReachabilityMonitor {
    fn drop(&mut self) {
        self.stop_probe();
    }
}

fn apply(
    status: &RwLock<ReachabilityStatus>,
    listener: &RwLock<Option<Listener>>,
    new_status: ReachabilityStatus,
) {
    let previous = std::mem::replace(&mut *status.write(), new_status);
    if previous == new_status {
        return;
    }

    debug!(?previous, current = ?new_status, "Reachability changed");
    if let Some(ref listener) = *listener.read() {
        listener(new_status);
    }
}

fn probe_loop(
    target: String,
    interval: Duration,
    status: Arc<RwLock<ReachabilityStatus>>,
    listener: Arc<RwLock<Option<Listener>>>,
    should_stop: Arc<AtomicBool>,
) {
    while !should_stop.load(Ordering::SeqCst) {
        apply(&status, &listener, probe(&target));
        thread::park_timeout(interval);
    }
}

fn probe(target: &str) -> ReachabilityStatus {
    let addrs = match target.to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            warn!(%target, "Reachability lookup failed: {}", e);
            return ReachabilityStatus::NotReachable;
        }
    };

    for addr in addrs {
        if TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok() {
            return ReachabilityStatus::ReachableViaEthernetOrWiFi;
        }
    }
    ReachabilityStatus::NotReachable
}
