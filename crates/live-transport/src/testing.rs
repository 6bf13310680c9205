//! Scriptable transport for tests.
//!
//! [`MockTransportFactory`] records every session it creates and hands out
//! a [`MockSessionHandle`] per session, through which a test plays the
//! transport's side: emitting state and error codes from its own thread and
//! inspecting the commands the controller issued.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{TransportAudioConfig, TransportVideoConfig};
use crate::connection::DelegateSlot;
use crate::error::TransportError;
use crate::native::{CameraPosition, TransportState};
use crate::session::{
    DebugInfo, PreviewSurface, TransportDelegate, TransportFactory, TransportSession,
};
use crate::TransportResult;

/// A command the controller issued to a mock session.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Start(String),
    Stop,
    SetRunning(bool),
    SetPreview(Option<String>),
    SetCameraPosition(CameraPosition),
    SetDelegate(bool),
}

struct MockShared {
    audio: TransportAudioConfig,
    video: TransportVideoConfig,
    calls: Mutex<Vec<MockCall>>,
    delegate: DelegateSlot,
    state: AtomicI64,
    running: AtomicBool,
    dropped: AtomicBool,
}

/// Test-side view of one mock session.
#[derive(Clone)]
pub struct MockSessionHandle {
    shared: Arc<MockShared>,
}

impl MockSessionHandle {
    pub fn audio(&self) -> TransportAudioConfig {
        self.shared.audio.clone()
    }

    pub fn video(&self) -> TransportVideoConfig {
        self.shared.video.clone()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.shared.calls.lock().clone()
    }

    /// Whether a delegate is currently bound.
    pub fn has_delegate(&self) -> bool {
        self.shared.delegate.is_bound()
    }

    /// Whether the controller dropped the session object.
    pub fn is_dropped(&self) -> bool {
        self.shared.dropped.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Set the native state and notify the bound delegate, if any.
    pub fn emit_state(&self, state: TransportState) {
        self.emit_state_code(state.code());
    }

    /// Notify a raw state code, including values outside the native table.
    pub fn emit_state_code(&self, code: i64) {
        self.shared.state.store(code, Ordering::SeqCst);
        if let Some(delegate) = self.shared.delegate.get() {
            delegate.on_state_changed(code);
        }
    }

    /// Notify a raw error code.
    pub fn emit_error_code(&self, code: i64) {
        if let Some(delegate) = self.shared.delegate.get() {
            delegate.on_error(code);
        }
    }

    pub fn emit_debug(&self, info: DebugInfo) {
        if let Some(delegate) = self.shared.delegate.get() {
            delegate.on_debug(&info);
        }
    }

    /// Keep a copy of the delegate that was bound at this moment, so a test
    /// can call it after the controller detached it.
    pub fn capture_delegate(&self) -> Option<Arc<dyn TransportDelegate>> {
        self.shared.delegate.get()
    }
}

struct MockSession {
    shared: Arc<MockShared>,
}

impl MockSession {
    fn record(&self, call: MockCall) {
        self.shared.calls.lock().push(call);
    }
}

impl TransportSession for MockSession {
    fn start(&mut self, stream_url: &str) {
        self.record(MockCall::Start(stream_url.to_string()));
    }

    fn stop(&mut self) {
        self.record(MockCall::Stop);
    }

    fn set_running(&mut self, running: bool) {
        self.shared.running.store(running, Ordering::SeqCst);
        self.record(MockCall::SetRunning(running));
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn set_preview_surface(&mut self, surface: Option<Arc<dyn PreviewSurface>>) {
        self.record(MockCall::SetPreview(
            surface.map(|s| s.label().to_string()),
        ));
    }

    fn set_camera_position(&mut self, position: CameraPosition) {
        self.record(MockCall::SetCameraPosition(position));
    }

    fn state(&self) -> i64 {
        self.shared.state.load(Ordering::SeqCst)
    }

    fn set_delegate(&mut self, delegate: Option<Arc<dyn TransportDelegate>>) {
        self.record(MockCall::SetDelegate(delegate.is_some()));
        self.shared.delegate.set(delegate);
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.shared.dropped.store(true, Ordering::SeqCst);
    }
}

/// Factory producing [`MockSessionHandle`]-observable sessions.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    sessions: Arc<Mutex<Vec<MockSessionHandle>>>,
    fail_next: Arc<AtomicUsize>,
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `create` fail.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Handles for every session created so far, oldest first.
    pub fn sessions(&self) -> Vec<MockSessionHandle> {
        self.sessions.lock().clone()
    }

    /// Handle for the most recent session.
    pub fn last(&self) -> Option<MockSessionHandle> {
        self.sessions.lock().last().cloned()
    }
}

impl TransportFactory for MockTransportFactory {
    fn create(
        &self,
        audio: TransportAudioConfig,
        video: TransportVideoConfig,
    ) -> TransportResult<Box<dyn TransportSession>> {
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::Setup("mock factory failure".to_string()));
        }

        let shared = Arc::new(MockShared {
            audio,
            video,
            calls: Mutex::new(Vec::new()),
            delegate: DelegateSlot::default(),
            state: AtomicI64::new(TransportState::Ready.code()),
            running: AtomicBool::new(false),
            dropped: AtomicBool::new(false),
        });
        self.sessions.lock().push(MockSessionHandle {
            shared: Arc::clone(&shared),
        });
        Ok(Box::new(MockSession { shared }))
    }
}

/// A named preview surface.
#[derive(Debug, Clone)]
pub struct NamedSurface(pub String);

impl PreviewSurface for NamedSurface {
    fn label(&self) -> &str {
        &self.0
    }
}
