//! Command loop driving a [`Live`] controller from a channel.

use std::sync::Arc;

use crossbeam_channel::{select, Receiver, Sender};
use tracing::{debug, info, instrument, warn};

use live_ipc::{LiveCommand, LiveError, LiveEvent, LiveState, ReachabilityStatus};

use crate::indicator::LiveObserver;
use crate::live::Live;

/// Reachability changes buffered between loop iterations.
const REACHABILITY_CHANNEL_CAPACITY: usize = 16;

/// Observer that republishes notifications as [`LiveEvent`]s.
struct EventForwarder {
    event_tx: Sender<LiveEvent>,
}

impl EventForwarder {
    fn send(&self, event: LiveEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Failed to send event: {}", e);
        }
    }
}

impl LiveObserver for EventForwarder {
    fn on_state_changed(&self, state: LiveState) {
        self.send(LiveEvent::StateChanged(state));
    }

    fn on_error(&self, error: LiveError) {
        self.send(LiveEvent::Error(error));
    }
}

/// Runs a [`Live`] controller on behalf of a host that talks to it only
/// through command and event channels.
pub struct Engine {
    command_rx: Receiver<LiveCommand>,
    reachability_rx: Receiver<ReachabilityStatus>,
    live: Live,
    events: Arc<EventForwarder>,
}

impl Engine {
    pub fn new(command_rx: Receiver<LiveCommand>, event_tx: Sender<LiveEvent>, live: Live) -> Self {
        let events = Arc::new(EventForwarder { event_tx });
        live.set_observer(&events);

        let (reachability_tx, reachability_rx) =
            crossbeam_channel::bounded(REACHABILITY_CHANNEL_CAPACITY);
        live.reachability().set_listener(move |status| {
            if let Err(e) = reachability_tx.try_send(status) {
                warn!("Dropped reachability change: {}", e);
            }
        });

        Self {
            command_rx,
            reachability_rx,
            live,
            events,
        }
    }

    pub fn live(&self) -> &Live {
        &self.live
    }

    /// Run the engine (blocking) until `Shutdown` or the command channel
    /// disconnects.
    #[instrument(name = "engine_run", skip(self))]
    pub fn run(&mut self) {
        info!("Engine starting");
        self.events.send(LiveEvent::Ready);

        let commands = self.command_rx.clone();
        let reachability = self.reachability_rx.clone();
        loop {
            let keep_running = select! {
                recv(commands) -> command => match command {
                    Ok(command) => self.handle_command(command),
                    Err(_) => {
                        info!("Command channel disconnected, shutting down");
                        self.live.stop();
                        false
                    }
                },
                recv(reachability) -> status => {
                    if let Ok(status) = status {
                        self.on_reachability_changed(status);
                    }
                    true
                }
            };
            if !keep_running {
                break;
            }
        }

        self.live.clear_observer();
        info!("Engine stopped");
    }

    /// Handle a command. Returns false if the engine should stop.
    fn handle_command(&mut self, command: LiveCommand) -> bool {
        debug!(?command, "Handling command");

        match command {
            LiveCommand::Start {
                stream_key,
                orientation,
            } => {
                if let Err(e) = self.live.start(&stream_key, orientation) {
                    warn!("Start failed: {}", e);
                    self.events.send(LiveEvent::CommandFailed {
                        message: e.to_string(),
                    });
                }
            }
            LiveCommand::Stop => self.live.stop(),
            LiveCommand::SetRunning(running) => self.live.set_running(running),
            LiveCommand::SetAudioConfiguration(config) => {
                self.live.set_audio_configuration(config)
            }
            LiveCommand::SetVideoConfiguration(config) => {
                self.live.set_video_configuration(config)
            }
            LiveCommand::GetState => self.send_status(),
            LiveCommand::Shutdown => {
                self.live.stop();
                self.events.send(LiveEvent::Shutdown);
                return false;
            }
        }

        true
    }

    fn send_status(&self) {
        self.events.send(LiveEvent::Status {
            state: self.live.state(),
            network_reachable: self.live.network_reachable(),
            is_running: self.live.is_running(),
        });
    }

    fn on_reachability_changed(&self, status: ReachabilityStatus) {
        debug!(?status, "Reachability changed");
        self.events.send(LiveEvent::Status {
            state: self.live.state(),
            network_reachable: status.is_reachable(),
            is_running: self.live.is_running(),
        });
    }
}
