//! RTMP-backed transport session.
//!
//! Connects and publishes with `rml_rtmp`, reports progress through the
//! native state and error codes, and forwards encoded packets handed to it
//! through [`RtmpSession::packet_sender`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use rml_rtmp::handshake::{Handshake, HandshakeProcessResult, PeerType};
use rml_rtmp::sessions::{
    ClientSession, ClientSessionConfig, ClientSessionEvent, ClientSessionResult,
    PublishRequestType,
};
use rml_rtmp::time::RtmpTimestamp;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use crate::config::{TransportAudioConfig, TransportVideoConfig};
use crate::connection::{DelegateSlot, Notifier, ReconnectPolicy};
use crate::error::TransportError;
use crate::native::{CameraPosition, TransportState};
use crate::session::{
    DebugInfo, PreviewSurface, TransportDelegate, TransportFactory, TransportSession,
};
use crate::{TransportResult, DEFAULT_RTMP_PORT, PACKET_CHANNEL_CAPACITY};

/// How often a debug notification is emitted while publishing.
const DEBUG_INTERVAL: Duration = Duration::from_secs(5);

/// Bound on each wait for a server response during connect/publish.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A packet to send over RTMP.
#[derive(Debug, Clone)]
pub struct RtmpPacket {
    /// FLV tag body.
    pub data: Bytes,

    /// Presentation timestamp in milliseconds.
    pub timestamp_ms: u32,

    /// Whether this is a video packet.
    pub is_video: bool,

    /// Whether this is a keyframe (for video).
    pub is_keyframe: bool,
}

/// Where to connect and what to publish, split out of a stream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub host: String,
    pub port: u16,
    pub app: String,
    pub stream_key: String,
    /// URL of the application, sent as `tcUrl`.
    pub tc_url: String,
}

impl StreamTarget {
    /// Split `rtmp://host[:port]/app/key` into its parts.
    pub fn parse(stream_url: &str) -> TransportResult<Self> {
        let parsed =
            Url::parse(stream_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        if parsed.scheme() != "rtmp" {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| TransportError::InvalidUrl("Missing host".to_string()))?
            .to_string();
        let port = parsed.port().unwrap_or(DEFAULT_RTMP_PORT);

        let path = parsed.path().trim_start_matches('/');
        let (app, stream_key) = path
            .split_once('/')
            .ok_or_else(|| TransportError::InvalidUrl("Missing stream key in URL path".into()))?;

        if app.is_empty() || stream_key.is_empty() {
            return Err(TransportError::InvalidUrl(
                "URL path must be /<app>/<stream key>".to_string(),
            ));
        }

        Ok(Self {
            tc_url: format!("rtmp://{}:{}/{}", host, port, app),
            host,
            port,
            app: app.to_string(),
            stream_key: stream_key.to_string(),
        })
    }
}

/// Creates [`RtmpSession`]s.
#[derive(Debug, Clone, Default)]
pub struct RtmpTransportFactory {
    policy: ReconnectPolicy,
}

impl RtmpTransportFactory {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy }
    }
}

impl TransportFactory for RtmpTransportFactory {
    fn create(
        &self,
        audio: TransportAudioConfig,
        video: TransportVideoConfig,
    ) -> TransportResult<Box<dyn TransportSession>> {
        Ok(Box::new(RtmpSession::new(audio, video, self.policy.clone())))
    }
}

#[derive(Default)]
struct Counters {
    bytes_sent: AtomicU64,
    packets_sent: AtomicU64,
    packets_dropped: AtomicU64,
}

/// A transport session publishing over RTMP.
pub struct RtmpSession {
    audio: TransportAudioConfig,
    video: TransportVideoConfig,
    camera_position: CameraPosition,
    preview: Option<Arc<dyn PreviewSurface>>,
    running: Arc<AtomicBool>,
    delegate: DelegateSlot,
    state: Arc<RwLock<TransportState>>,
    notifier: Option<Notifier>,
    runtime: Option<Runtime>,
    should_stop: Arc<AtomicBool>,
    packet_sender: Option<Sender<RtmpPacket>>,
    policy: ReconnectPolicy,
    counters: Arc<Counters>,
}

impl RtmpSession {
    /// Create an idle session.
    pub fn new(
        audio: TransportAudioConfig,
        video: TransportVideoConfig,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            audio,
            video,
            camera_position: CameraPosition::default(),
            preview: None,
            running: Arc::new(AtomicBool::new(false)),
            delegate: DelegateSlot::default(),
            state: Arc::new(RwLock::new(TransportState::Ready)),
            notifier: None,
            runtime: None,
            should_stop: Arc::new(AtomicBool::new(false)),
            packet_sender: None,
            policy,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Sender encoders push packets into once the session has started.
    pub fn packet_sender(&self) -> Option<Sender<RtmpPacket>> {
        self.packet_sender.clone()
    }

    pub fn audio_config(&self) -> &TransportAudioConfig {
        &self.audio
    }

    pub fn video_config(&self) -> &TransportVideoConfig {
        &self.video
    }

    pub fn camera_position(&self) -> CameraPosition {
        self.camera_position
    }

    fn launch(&mut self, stream_url: &str, notifier: Notifier) -> TransportResult<()> {
        let target = StreamTarget::parse(stream_url)?;
        let runtime = Runtime::new()?;

        let (sender, receiver) = crossbeam_channel::bounded(PACKET_CHANNEL_CAPACITY);

        self.should_stop.store(false, Ordering::SeqCst);
        let task = PublishTask {
            stream_url: stream_url.to_string(),
            target,
            receiver,
            notifier,
            should_stop: Arc::clone(&self.should_stop),
            running: Arc::clone(&self.running),
            policy: self.policy.clone(),
            counters: Arc::clone(&self.counters),
        };
        runtime.spawn(task.run());

        self.runtime = Some(runtime);
        self.packet_sender = Some(sender);
        Ok(())
    }
}

impl TransportSession for RtmpSession {
    #[instrument(name = "rtmp_start", skip(self))]
    fn start(&mut self, stream_url: &str) {
        if self.runtime.is_some() {
            debug!("Session already started, ignoring start");
            return;
        }

        let notifier = match Notifier::spawn(Arc::clone(&self.state), self.delegate.clone()) {
            Ok(notifier) => notifier,
            Err(e) => {
                warn!("Failed to spawn notification thread: {}", e);
                *self.state.write() = TransportState::Error;
                return;
            }
        };

        info!(
            width = self.video.width,
            height = self.video.height,
            fps = self.video.frame_rate,
            audio_bps = self.audio.bit_rate.bits_per_second(),
            camera = ?self.camera_position,
            "Starting RTMP session"
        );

        notifier.state(TransportState::Pending);
        if let Err(e) = self.launch(stream_url, notifier.clone()) {
            warn!("RTMP session start failed: {}", e);
            notifier.error(e.socket_error_code());
            notifier.state(TransportState::Error);
        }
        self.notifier = Some(notifier);
    }

    #[instrument(name = "rtmp_stop", skip(self))]
    fn stop(&mut self) {
        self.should_stop.store(true, Ordering::SeqCst);

        // Dropping the sender ends the publish loop.
        self.packet_sender = None;

        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(Duration::from_secs(5));
        }

        if let Some(notifier) = self.notifier.take() {
            notifier.state(TransportState::Stop);
        }

        info!("RTMP session stopped");
    }

    fn set_running(&mut self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_preview_surface(&mut self, surface: Option<Arc<dyn PreviewSurface>>) {
        if let Some(ref surface) = surface {
            debug!(surface = surface.label(), "Preview surface attached");
        }
        self.preview = surface;
    }

    fn set_camera_position(&mut self, position: CameraPosition) {
        self.camera_position = position;
    }

    fn state(&self) -> i64 {
        self.state.read().code()
    }

    fn set_delegate(&mut self, delegate: Option<Arc<dyn TransportDelegate>>) {
        self.delegate.set(delegate);
    }
}

impl Drop for RtmpSession {
    fn drop(&mut self) {
        if self.runtime.is_some() {
            self.stop();
        }
    }
}

/// Connect, publish and reconnect until stopped.
struct PublishTask {
    stream_url: String,
    target: StreamTarget,
    receiver: Receiver<RtmpPacket>,
    notifier: Notifier,
    should_stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    policy: ReconnectPolicy,
    counters: Arc<Counters>,
}

impl PublishTask {
    async fn run(self) {
        let started_at = Instant::now();
        let mut attempt = 0u32;
        let mut ever_connected = false;

        while !self.should_stop.load(Ordering::SeqCst) {
            match connect_rtmp(&self.target).await {
                Ok(mut connection) => {
                    ever_connected = true;
                    attempt = 0;
                    self.notifier.state(TransportState::Start);

                    match self.publish(&mut connection, started_at).await {
                        Ok(()) => return,
                        Err(e) => warn!("Publishing interrupted: {}", e),
                    }
                }
                Err(e @ TransportError::Rejected(_)) | Err(e @ TransportError::InvalidUrl(_)) => {
                    warn!("RTMP connect refused: {}", e);
                    self.notifier.error(e.socket_error_code());
                    self.notifier.state(TransportState::Error);
                    return;
                }
                Err(e) => warn!("Connection attempt {} failed: {}", attempt + 1, e),
            }

            if self.should_stop.load(Ordering::SeqCst) {
                return;
            }

            attempt += 1;
            if !self.policy.should_retry(attempt) {
                let error = if ever_connected {
                    TransportError::ReconnectExhausted(attempt)
                } else {
                    TransportError::Connection(format!("failed after {} attempts", attempt))
                };
                warn!("Giving up: {}", error);
                self.notifier.error(error.socket_error_code());
                self.notifier.state(TransportState::Error);
                return;
            }

            self.notifier.state(TransportState::Refresh);
            let delay = self.policy.delay_for_attempt(attempt);
            info!("Reconnecting in {:?}...", delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// Forward packets until stopped (Ok) or the connection breaks (Err).
    async fn publish(
        &self,
        connection: &mut RtmpConnection,
        started_at: Instant,
    ) -> TransportResult<()> {
        let mut last_debug = Instant::now();

        loop {
            if self.should_stop.load(Ordering::SeqCst) {
                return Ok(());
            }

            if last_debug.elapsed() >= DEBUG_INTERVAL {
                self.notifier.debug(DebugInfo {
                    stream_url: self.stream_url.clone(),
                    elapsed_ms: started_at.elapsed().as_millis() as u64,
                    bytes_sent: self.counters.bytes_sent.load(Ordering::Relaxed),
                    packets_sent: self.counters.packets_sent.load(Ordering::Relaxed),
                    packets_dropped: self.counters.packets_dropped.load(Ordering::Relaxed),
                });
                last_debug = Instant::now();
            }

            match self.receiver.try_recv() {
                Ok(packet) => {
                    if !self.running.load(Ordering::SeqCst) {
                        self.counters.packets_dropped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    if let Err(e) = send_packet(connection, &packet).await {
                        self.counters.packets_dropped.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                    self.counters
                        .bytes_sent
                        .fetch_add(packet.data.len() as u64, Ordering::Relaxed);
                    self.counters.packets_sent.fetch_add(1, Ordering::Relaxed);
                }
                Err(crossbeam_channel::TryRecvError::Empty) => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    debug!("Packet channel disconnected");
                    return Ok(());
                }
            }
        }
    }
}

/// RTMP connection with session state.
struct RtmpConnection {
    stream: TcpStream,
    session: ClientSession,
}

impl RtmpConnection {
    async fn write_results(&mut self, results: Vec<ClientSessionResult>) -> TransportResult<Vec<ClientSessionEvent>> {
        let mut events = Vec::new();
        for result in results {
            match result {
                ClientSessionResult::OutboundResponse(packet) => {
                    self.stream.write_all(&packet.bytes).await?;
                }
                ClientSessionResult::RaisedEvent(event) => events.push(event),
                _ => {}
            }
        }
        Ok(events)
    }

    /// Read from the server until `accept` recognizes an event, or time out.
    async fn await_event<F>(&mut self, what: &str, accept: F) -> TransportResult<()>
    where
        F: Fn(&ClientSessionEvent) -> TransportResult<bool>,
    {
        let mut read_buf = vec![0u8; 4096];
        let deadline = tokio::time::Instant::now() + RESPONSE_TIMEOUT;

        loop {
            let n = tokio::time::timeout_at(deadline, self.stream.read(&mut read_buf))
                .await
                .map_err(|_| TransportError::Timeout(what.to_string()))??;
            if n == 0 {
                return Err(TransportError::Connection("Connection closed".to_string()));
            }

            let results = self
                .session
                .handle_input(&read_buf[..n])
                .map_err(|e| TransportError::Connection(format!("Session input error: {:?}", e)))?;

            for event in self.write_results(results).await? {
                if accept(&event)? {
                    return Ok(());
                }
                trace!("Received event: {:?}", event);
            }
        }
    }
}

async fn connect_rtmp(target: &StreamTarget) -> TransportResult<RtmpConnection> {
    info!(host = %target.host, port = target.port, app = %target.app, "Connecting to RTMP server");

    let addr = format!("{}:{}", target.host, target.port);
    let mut stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| TransportError::Connection(format!("TCP connect failed: {}", e)))?;

    let leftover = handshake(&mut stream).await?;

    debug!("Handshake complete, creating RTMP session");
    let mut config = ClientSessionConfig::new();
    config.tc_url = Some(target.tc_url.clone());
    let (session, initial_results) = ClientSession::new(config)
        .map_err(|e| TransportError::Connection(format!("Session creation failed: {:?}", e)))?;

    let mut connection = RtmpConnection { stream, session };
    connection.write_results(initial_results).await?;

    if !leftover.is_empty() {
        let results = connection
            .session
            .handle_input(&leftover)
            .map_err(|e| TransportError::Connection(format!("Session input error: {:?}", e)))?;
        connection.write_results(results).await?;
    }

    let request = connection
        .session
        .request_connection(target.app.clone())
        .map_err(|e| TransportError::Connection(format!("Connection request failed: {:?}", e)))?;
    connection.write_results(vec![request]).await?;

    connection
        .await_event("connection acceptance", |event| match event {
            ClientSessionEvent::ConnectionRequestAccepted => Ok(true),
            ClientSessionEvent::ConnectionRequestRejected { description } => {
                Err(TransportError::Rejected(description.clone()))
            }
            _ => Ok(false),
        })
        .await?;

    debug!("Requesting publish");
    let request = connection
        .session
        .request_publishing(target.stream_key.clone(), PublishRequestType::Live)
        .map_err(|e| TransportError::Connection(format!("Publish request failed: {:?}", e)))?;
    connection.write_results(vec![request]).await?;

    connection
        .await_event("publish acceptance", |event| {
            Ok(matches!(event, ClientSessionEvent::PublishRequestAccepted))
        })
        .await
        .map_err(publish_refusal)?;

    info!("RTMP connection established and publishing started");
    Ok(connection)
}

/// A server that never accepts the publish is refusing the key.
fn publish_refusal(error: TransportError) -> TransportError {
    match error {
        TransportError::Timeout(what) => {
            TransportError::Rejected(format!("no answer to {}", what))
        }
        other => other,
    }
}

/// Perform the client side of the RTMP handshake, returning bytes that
/// arrived after it completed.
async fn handshake(stream: &mut TcpStream) -> TransportResult<Vec<u8>> {
    let mut handshake = Handshake::new(PeerType::Client);

    let p0_p1 = handshake
        .generate_outbound_p0_and_p1()
        .map_err(|e| TransportError::Connection(format!("Handshake generation failed: {:?}", e)))?;
    stream.write_all(&p0_p1).await?;

    let mut buf = vec![0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(TransportError::Connection(
                "Connection closed during handshake".to_string(),
            ));
        }

        match handshake.process_bytes(&buf[..n]) {
            Ok(HandshakeProcessResult::InProgress { response_bytes }) => {
                if !response_bytes.is_empty() {
                    stream.write_all(&response_bytes).await?;
                }
            }
            Ok(HandshakeProcessResult::Completed {
                response_bytes,
                remaining_bytes,
            }) => {
                if !response_bytes.is_empty() {
                    stream.write_all(&response_bytes).await?;
                }
                return Ok(remaining_bytes);
            }
            Err(e) => {
                return Err(TransportError::Connection(format!(
                    "Handshake failed: {:?}",
                    e
                )));
            }
        }
    }
}

async fn send_packet(connection: &mut RtmpConnection, packet: &RtmpPacket) -> TransportResult<()> {
    let timestamp = RtmpTimestamp::new(packet.timestamp_ms);

    let result = if packet.is_video {
        // Non-keyframes may be dropped under backpressure.
        connection
            .session
            .publish_video_data(packet.data.clone(), timestamp, !packet.is_keyframe)
    } else {
        connection
            .session
            .publish_audio_data(packet.data.clone(), timestamp, false)
    };

    let result =
        result.map_err(|e| TransportError::Send(format!("Failed to publish data: {:?}", e)))?;
    connection.write_results(vec![result]).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_target() {
        let target = StreamTarget::parse("rtmp://global-live.mux.com:5222/app/abc123").unwrap();
        assert_eq!(target.host, "global-live.mux.com");
        assert_eq!(target.port, 5222);
        assert_eq!(target.app, "app");
        assert_eq!(target.stream_key, "abc123");
        assert_eq!(target.tc_url, "rtmp://global-live.mux.com:5222/app");
    }

    #[test]
    fn test_parse_default_port_and_nested_key() {
        let target = StreamTarget::parse("rtmp://custom.example/live/user/xyz").unwrap();
        assert_eq!(target.port, 1935);
        assert_eq!(target.app, "live");
        assert_eq!(target.stream_key, "user/xyz");
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        assert!(StreamTarget::parse("not a url").is_err());
        assert!(StreamTarget::parse("http://example.com/app/key").is_err());
        assert!(StreamTarget::parse("rtmp://example.com/app").is_err());
        assert!(StreamTarget::parse("rtmp://example.com/app/").is_err());
    }

    #[test]
    fn test_unanswered_publish_is_refusal() {
        let err = publish_refusal(TransportError::Timeout("publish acceptance".into()));
        assert!(matches!(err, TransportError::Rejected(ref msg) if msg.contains("publish acceptance")));
        assert_eq!(err.socket_error_code(), crate::SocketErrorCode::Verification);
        assert_eq!(
            TransportError::Timeout("connect result".into()).socket_error_code(),
            crate::SocketErrorCode::ConnectSocket
        );

        let err = publish_refusal(TransportError::Connection("reset".into()));
        assert!(matches!(err, TransportError::Connection(_)));
    }

    #[test]
    fn test_new_session_is_ready() {
        let session = RtmpSession::new(
            TransportAudioConfig::default(),
            TransportVideoConfig::default(),
            ReconnectPolicy::default(),
        );
        assert_eq!(session.state(), TransportState::Ready.code());
        assert!(!session.is_running());
        assert!(session.packet_sender().is_none());
    }

    #[test]
    fn test_invalid_url_reports_stream_info_error() {
        use parking_lot::Mutex;

        #[derive(Default)]
        struct Recorder(Mutex<Vec<(char, i64)>>);
        impl TransportDelegate for Recorder {
            fn on_debug(&self, _info: &DebugInfo) {}
            fn on_state_changed(&self, state_code: i64) {
                self.0.lock().push(('s', state_code));
            }
            fn on_error(&self, error_code: i64) {
                self.0.lock().push(('e', error_code));
            }
        }

        let recorder = Arc::new(Recorder::default());
        let mut session = RtmpSession::new(
            TransportAudioConfig::default(),
            TransportVideoConfig::default(),
            ReconnectPolicy::default(),
        );
        session.set_delegate(Some(recorder.clone()));
        session.start("rtmp://example.com/missing-key");

        for _ in 0..200 {
            if recorder.0.lock().len() >= 3 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(*recorder.0.lock(), vec![('s', 1), ('e', 202), ('s', 4)]);
        assert_eq!(session.state(), TransportState::Error.code());
    }
}
