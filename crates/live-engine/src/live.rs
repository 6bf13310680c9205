//! The live session controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::{debug, info, instrument, trace, warn};

use live_ipc::{
    AudioConfiguration, LiveError, LiveState, Orientation, ReachabilityStatus, VideoConfiguration,
};
use live_transport::{
    CameraPosition, DebugInfo, PreviewSurface, TransportDelegate, TransportFactory,
    TransportSession,
};

use crate::error::LiveControlError;
use crate::indicator::LiveObserver;
use crate::mapping::{
    build_stream_url, live_error_from_code, live_state_from_code, transport_audio_config,
    transport_video_config, MUX_API_PRODUCTION_HOSTNAME,
};
use crate::reachability::{ReachabilityMonitor, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_PORT};
use crate::LiveResult;

/// Generation value meaning "no session bound".
const UNBOUND: u64 = 0;

/// Controller behaviour switches.
#[derive(Debug, Clone)]
pub struct LiveOptions {
    /// Reject invalid configuration in `start` instead of logging it.
    pub strict_config: bool,

    /// Report `LiveError::Timeout` if a started session has not reached
    /// Started, Stopped or Failed within this time. `None` waits forever.
    pub start_timeout: Option<Duration>,

    /// Host whose reachability is tracked.
    pub reachability_host: String,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            strict_config: false,
            start_timeout: None,
            reachability_host: MUX_API_PRODUCTION_HOSTNAME.to_string(),
        }
    }
}

/// State shared with delegates and watchdogs running on other threads.
struct Shared {
    /// Generation of the currently bound session.
    bound: AtomicU64,
    /// Held from the generation check until the observer returns. Detaching
    /// a session takes it too, so no delivery outlives `stop`. Reentrant so
    /// an observer may stop the controller from inside a callback.
    gate: ReentrantMutex<()>,
    observer: RwLock<Option<Weak<dyn LiveObserver>>>,
    /// Last state reported, tagged with the generation that reported it.
    last_state: Mutex<(u64, LiveState)>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        generation != UNBOUND && self.bound.load(Ordering::SeqCst) == generation
    }

    fn observer(&self) -> Option<Arc<dyn LiveObserver>> {
        self.observer.read().as_ref().and_then(Weak::upgrade)
    }
}

/// Delegate bound to one session generation.
struct SessionDelegate {
    generation: u64,
    shared: Weak<Shared>,
}

impl SessionDelegate {
    /// Run `notify` if this delegate's session is still bound.
    fn deliver<F: FnOnce(&Shared)>(&self, notify: F) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let _gate = shared.gate.lock();
        if shared.is_current(self.generation) {
            notify(&shared);
        } else {
            trace!(generation = self.generation, "Dropping notification from detached session");
        }
    }
}

impl TransportDelegate for SessionDelegate {
    fn on_debug(&self, info: &DebugInfo) {
        debug!(
            generation = self.generation,
            elapsed_ms = info.elapsed_ms,
            bytes_sent = info.bytes_sent,
            packets_sent = info.packets_sent,
            packets_dropped = info.packets_dropped,
            "Transport debug"
        );
    }

    fn on_state_changed(&self, state_code: i64) {
        self.deliver(|shared| {
            let state = live_state_from_code(state_code);
            debug!(generation = self.generation, state_code, %state, "Live state changed");
            *shared.last_state.lock() = (self.generation, state);

            if let Some(observer) = shared.observer() {
                observer.on_state_changed(state);
            }
        });
    }

    fn on_error(&self, error_code: i64) {
        self.deliver(|shared| {
            let error = live_error_from_code(error_code);
            warn!(generation = self.generation, error_code, code = error.code(), "Live error: {}", error);

            if let Some(observer) = shared.observer() {
                observer.on_error(error);
            }
        });
    }
}

/// The one transport session a controller owns.
struct ActiveSession {
    generation: u64,
    transport: Box<dyn TransportSession>,
    /// Dropping this cancels the start watchdog.
    _watchdog: Option<Sender<()>>,
}

struct Inner {
    audio: AudioConfiguration,
    video: VideoConfiguration,
    is_running: bool,
    preview: Option<Arc<dyn PreviewSurface>>,
    session: Option<ActiveSession>,
    last_generation: u64,
}

/// Drives one transport session at a time and republishes its state and
/// errors to a registered observer.
///
/// Commands serialize on one lock. A replaced session is stopped and
/// detached before the new one is wired, and detaching waits for any
/// notification already being delivered, so nothing from an old session
/// reaches the observer once `stop` or `start` has returned.
pub struct Live {
    factory: Arc<dyn TransportFactory>,
    options: LiveOptions,
    inner: Mutex<Inner>,
    shared: Arc<Shared>,
    reachability: ReachabilityMonitor,
}

impl Live {
    /// Create a controller with default options.
    pub fn new(factory: impl TransportFactory + 'static) -> Self {
        Self::with_options(factory, LiveOptions::default())
    }

    pub fn with_options(factory: impl TransportFactory + 'static, options: LiveOptions) -> Self {
        let reachability = ReachabilityMonitor::new(options.reachability_host.clone());
        Self {
            factory: Arc::new(factory),
            options,
            inner: Mutex::new(Inner {
                audio: AudioConfiguration::default(),
                video: VideoConfiguration::default(),
                is_running: false,
                preview: None,
                session: None,
                last_generation: UNBOUND,
            }),
            shared: Arc::new(Shared {
                bound: AtomicU64::new(UNBOUND),
                gate: ReentrantMutex::new(()),
                observer: RwLock::new(None),
                last_state: Mutex::new((UNBOUND, LiveState::Ready)),
            }),
            reachability,
        }
    }

    pub fn options(&self) -> &LiveOptions {
        &self.options
    }

    /// Register the observer. Only a weak reference is kept.
    pub fn set_observer<O>(&self, observer: &Arc<O>)
    where
        O: LiveObserver + 'static,
    {
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn LiveObserver> = weak;
        *self.shared.observer.write() = Some(weak);
    }

    pub fn clear_observer(&self) {
        *self.shared.observer.write() = None;
    }

    /// Start publishing to `stream_key`, or to it verbatim if it is already
    /// an `rtmp://` URL.
    ///
    /// Any existing session is torn down first. Publishing progress arrives
    /// through the observer; an error here means no session was created.
    #[instrument(name = "live_start", skip(self, stream_key))]
    pub fn start(&self, stream_key: &str, orientation: Orientation) -> LiveResult<()> {
        {
            let inner = self.inner.lock();
            if let Err(e) = inner.audio.validate().and_then(|_| inner.video.validate()) {
                if self.options.strict_config {
                    warn!("Rejecting configuration: {}", e);
                    return Err(e.into());
                }
                warn!("Configuration may not be honoured: {}", e);
            }
        }

        // Teardown waits on the delivery gate, and an observer holding the
        // gate may call back into the controller, so never tear down while
        // holding `inner`.
        let mut inner = loop {
            let mut inner = self.inner.lock();
            match inner.session.take() {
                Some(previous) => {
                    drop(inner);
                    info!(generation = previous.generation, "Replacing running session");
                    self.teardown(previous);
                }
                None => break inner,
            }
        };

        let audio = transport_audio_config(&inner.audio);
        let video = transport_video_config(&inner.video, orientation);
        debug!(?audio, ?video, "Transport configuration");

        let mut transport = self.factory.create(audio, video)?;

        inner.last_generation += 1;
        let generation = inner.last_generation;
        *self.shared.last_state.lock() = (generation, LiveState::Ready);
        self.shared.bound.store(generation, Ordering::SeqCst);

        transport.set_delegate(Some(Arc::new(SessionDelegate {
            generation,
            shared: Arc::downgrade(&self.shared),
        })));
        transport.set_camera_position(CameraPosition::Front);
        if let Some(ref preview) = inner.preview {
            transport.set_preview_surface(Some(Arc::clone(preview)));
        }
        transport.set_running(inner.is_running);

        let stream_url = build_stream_url(stream_key);
        info!(generation, ?orientation, "Starting live session");
        transport.start(&stream_url);

        let watchdog = self
            .options
            .start_timeout
            .and_then(|timeout| self.spawn_watchdog(generation, timeout));

        inner.session = Some(ActiveSession {
            generation,
            transport,
            _watchdog: watchdog,
        });
        Ok(())
    }

    /// Stop and release the current session. Safe to call at any time.
    #[instrument(name = "live_stop", skip(self))]
    pub fn stop(&self) {
        let session = self.inner.lock().session.take();
        match session {
            Some(session) => {
                self.teardown(session);
                info!("Live session stopped");
            }
            None => debug!("No session, ignoring stop"),
        }
    }

    /// Current state: the session's mapped state, or Ready without one.
    pub fn state(&self) -> LiveState {
        self.inner
            .lock()
            .session
            .as_ref()
            .map(|session| live_state_from_code(session.transport.state()))
            .unwrap_or(LiveState::Ready)
    }

    /// Whether a session exists.
    pub fn has_session(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().is_running
    }

    /// Pause or resume local capture. Recorded when no session exists and
    /// applied when the next one is created.
    pub fn set_running(&self, running: bool) {
        let mut inner = self.inner.lock();
        inner.is_running = running;
        if let Some(ref mut session) = inner.session {
            session.transport.set_running(running);
        }
    }

    /// Set the preview surface for the current and future sessions.
    pub fn set_preview_surface(&self, surface: Option<Arc<dyn PreviewSurface>>) {
        let mut inner = self.inner.lock();
        inner.preview = surface.clone();
        if let Some(ref mut session) = inner.session {
            session.transport.set_preview_surface(surface);
        }
    }

    pub fn audio_configuration(&self) -> AudioConfiguration {
        self.inner.lock().audio.clone()
    }

    /// Replace the audio configuration. Takes effect at the next `start`.
    pub fn set_audio_configuration(&self, config: AudioConfiguration) {
        self.inner.lock().audio = config;
    }

    pub fn video_configuration(&self) -> VideoConfiguration {
        self.inner.lock().video.clone()
    }

    /// Replace the video configuration. Takes effect at the next `start`.
    pub fn set_video_configuration(&self, config: VideoConfiguration) {
        self.inner.lock().video = config;
    }

    /// True unless the ingest API host is known to be unreachable.
    pub fn network_reachable(&self) -> bool {
        self.reachability.is_reachable()
    }

    pub fn reachability_status(&self) -> ReachabilityStatus {
        self.reachability.status()
    }

    pub fn reachability(&self) -> &ReachabilityMonitor {
        &self.reachability
    }

    /// Begin probing the reachability host in the background.
    pub fn start_reachability_probe(&self) -> std::io::Result<()> {
        self.reachability
            .start_probe(DEFAULT_PROBE_PORT, DEFAULT_PROBE_INTERVAL)
    }

    /// Stop, detach, then drop. Must not be called with `inner` held.
    fn teardown(&self, session: ActiveSession) {
        let ActiveSession {
            generation,
            mut transport,
            _watchdog,
        } = session;

        transport.stop();
        transport.set_delegate(None);
        {
            let _gate = self.shared.gate.lock();
            let _ = self.shared.bound.compare_exchange(
                generation,
                UNBOUND,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        }
        drop(transport);
        debug!(generation, "Session torn down");
    }

    fn spawn_watchdog(&self, generation: u64, timeout: Duration) -> Option<Sender<()>> {
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(0);
        let shared = Arc::downgrade(&self.shared);

        let spawned = thread::Builder::new()
            .name("live-start-watchdog".into())
            .spawn(move || {
                // Disconnection means the session was torn down in time.
                if cancel_rx.recv_timeout(timeout) != Err(RecvTimeoutError::Timeout) {
                    return;
                }
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                let _gate = shared.gate.lock();
                if !shared.is_current(generation) {
                    return;
                }
                let (reported_by, state) = *shared.last_state.lock();
                if reported_by == generation && state.is_settled() {
                    return;
                }

                warn!(generation, ?timeout, %state, "Session did not settle in time");
                if let Some(observer) = shared.observer() {
                    observer.on_error(LiveError::Timeout);
                }
            });

        match spawned {
            Ok(_) => Some(cancel_tx),
            Err(e) => {
                warn!("Failed to spawn start watchdog: {}", e);
                None
            }
        }
    }
}

impl Drop for Live {
    fn drop(&mut self) {
        if let Some(session) = self.inner.get_mut().session.take() {
            self.teardown(session);
        }
    }
}
