//! Session runner behind the `live` binary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{info, instrument, warn};

use live_engine::{Live, LiveObserver, StatusIndicator};
use live_ipc::{LiveError, LiveEvent, LiveState, Orientation};
use live_provisioning::{ProvisioningClient, ProvisioningConfig};
use live_transport::RtmpTransportFactory;

use crate::args::Args;
use crate::settings::Settings;

const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// What the runner waits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    State(LiveState),
    Error(LiveError),
    Interrupted,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Stopped,
    Failed,
    Interrupted,
    Elapsed,
}

/// Observer printing notifications and forwarding them to the runner.
pub struct ConsoleObserver {
    indicator: StatusIndicator,
    json: bool,
    signals: Sender<Signal>,
}

impl ConsoleObserver {
    pub fn new(json: bool, signals: Sender<Signal>) -> Self {
        Self {
            indicator: StatusIndicator::new(),
            json,
            signals,
        }
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }

    fn print_event(&self, event: LiveEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize event: {}", e),
        }
    }

    fn forward(&self, signal: Signal) {
        if let Err(e) = self.signals.try_send(signal) {
            warn!("Dropped signal: {}", e);
        }
    }
}

impl LiveObserver for ConsoleObserver {
    fn on_state_changed(&self, state: LiveState) {
        self.indicator.on_state_changed(state);
        if self.json {
            self.print_event(LiveEvent::StateChanged(state));
        } else {
            let style = self.indicator.style();
            println!(
                "state: {} [{:>3.0}%{}] {}",
                state,
                style.progress * 100.0,
                if style.indeterminate { " ..." } else { "" },
                style.tint.hex()
            );
        }
        self.forward(Signal::State(state));
    }

    fn on_error(&self, error: LiveError) {
        if self.json {
            self.print_event(LiveEvent::Error(error));
        } else {
            println!("error {}: {}", error.code(), error);
        }
        self.forward(Signal::Error(error));
    }
}

/// Run one broadcast as described by `args`.
pub fn run(args: Args) -> anyhow::Result<()> {
    let settings = match args.settings {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let stream_key = match args.stream_key {
        Some(ref key) => key.clone(),
        None => provision(&settings)?,
    };
    let orientation = args.orientation.unwrap_or(settings.orientation);

    let live = Live::with_options(
        RtmpTransportFactory::new(settings.reconnect_policy()),
        settings.live_options(),
    );
    if settings.probe_reachability {
        if let Err(e) = live.start_reachability_probe() {
            warn!("Reachability probe unavailable: {}", e);
        }
    }
    live.set_audio_configuration(settings.audio.clone());
    live.set_video_configuration(settings.video.clone());
    live.set_running(!args.paused);

    let (signal_tx, signal_rx) = crossbeam_channel::bounded(SIGNAL_CHANNEL_CAPACITY);
    let observer = Arc::new(ConsoleObserver::new(args.json, signal_tx.clone()));
    live.set_observer(&observer);

    ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(Signal::Interrupted);
    })
    .context("Failed to install Ctrl-C handler")?;

    match drive(&live, &stream_key, orientation, &signal_rx, args.duration)? {
        SessionOutcome::Failed => bail!("Live session failed"),
        outcome => {
            info!(?outcome, "Broadcast finished");
            Ok(())
        }
    }
}

/// Start a session, wait for it to end, and stop it.
#[instrument(skip(live, stream_key, signals))]
pub fn drive(
    live: &Live,
    stream_key: &str,
    orientation: Orientation,
    signals: &Receiver<Signal>,
    limit: Option<Duration>,
) -> anyhow::Result<SessionOutcome> {
    if !live.network_reachable() {
        warn!(host = live.reachability().host(), "API host is not reachable");
    }

    live.start(stream_key, orientation)
        .context("Failed to start live session")?;

    let outcome = wait_for_outcome(signals, limit);
    live.stop();
    Ok(outcome)
}

fn wait_for_outcome(signals: &Receiver<Signal>, limit: Option<Duration>) -> SessionOutcome {
    let deadline = limit.map(|limit| Instant::now() + limit);

    loop {
        let signal = match deadline {
            Some(deadline) => match signals.recv_deadline(deadline) {
                Ok(signal) => signal,
                Err(RecvTimeoutError::Timeout) => return SessionOutcome::Elapsed,
                Err(RecvTimeoutError::Disconnected) => return SessionOutcome::Stopped,
            },
            None => match signals.recv() {
                Ok(signal) => signal,
                Err(_) => return SessionOutcome::Stopped,
            },
        };

        match signal {
            Signal::State(LiveState::Failed) => return SessionOutcome::Failed,
            Signal::State(LiveState::Stopped) => return SessionOutcome::Stopped,
            Signal::Interrupted => return SessionOutcome::Interrupted,
            Signal::State(_) | Signal::Error(_) => {}
        }
    }
}

fn provision(settings: &Settings) -> anyhow::Result<String> {
    let mut config = ProvisioningConfig::from_env().context("Cannot provision a stream key")?;
    if let Some(ref api_base) = settings.api_base {
        config = config.with_api_base(api_base.clone());
    }
    let client = ProvisioningClient::new(config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;
    let key = runtime
        .block_on(client.create_stream_key())
        .context("Failed to provision a stream key")?;

    info!(stream_id = ?key.stream_id(), "Stream key provisioned");
    Ok(key.expose().to_string())
}
