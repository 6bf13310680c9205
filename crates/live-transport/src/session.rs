//! The transport session contract.
//!
//! A transport session captures, encodes and publishes a stream. The live
//! controller drives it only through [`TransportSession`] and hears back
//! through [`TransportDelegate`].

use std::fmt;
use std::sync::Arc;

use crate::config::{TransportAudioConfig, TransportVideoConfig};
use crate::native::CameraPosition;
use crate::TransportResult;

/// Periodic diagnostics emitted by a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    /// URL being published to.
    pub stream_url: String,

    /// Milliseconds since the session started.
    pub elapsed_ms: u64,

    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub packets_dropped: u64,
}

/// Receives asynchronous notifications from a session.
///
/// State and error codes are raw transport values; receivers must tolerate
/// codes they do not know.
pub trait TransportDelegate: Send + Sync {
    /// Diagnostic signal.
    fn on_debug(&self, info: &DebugInfo);

    /// The session moved to the state with this ordinal.
    fn on_state_changed(&self, state_code: i64);

    /// The session hit the error with this code.
    fn on_error(&self, error_code: i64);
}

/// A surface the session renders its local preview into.
pub trait PreviewSurface: Send + Sync + fmt::Debug {
    /// Identifier used in logs.
    fn label(&self) -> &str;
}

/// A capture, encode and publish engine.
///
/// Implementations deliver delegate callbacks from their own execution
/// context and never synchronously from inside `start`, `stop` or
/// `set_running`. Once `set_delegate(None)` returns, no new callback may
/// begin.
pub trait TransportSession: Send {
    /// Begin capturing and publishing to `stream_url`.
    fn start(&mut self, stream_url: &str);

    /// Stop publishing and release the connection.
    fn stop(&mut self);

    /// Pause or resume local capture.
    fn set_running(&mut self, running: bool);

    /// Whether local capture is running.
    fn is_running(&self) -> bool;

    /// Attach or detach the preview surface.
    fn set_preview_surface(&mut self, surface: Option<Arc<dyn PreviewSurface>>);

    /// Choose the capture camera.
    fn set_camera_position(&mut self, position: CameraPosition);

    /// Raw code of the current native state.
    fn state(&self) -> i64;

    /// Bind or clear the notification receiver.
    fn set_delegate(&mut self, delegate: Option<Arc<dyn TransportDelegate>>);
}

/// Creates transport sessions from encoder parameters.
pub trait TransportFactory: Send + Sync {
    fn create(
        &self,
        audio: TransportAudioConfig,
        video: TransportVideoConfig,
    ) -> TransportResult<Box<dyn TransportSession>>;
}
