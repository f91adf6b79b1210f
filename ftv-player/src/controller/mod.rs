//! Playback control
//!
//! The [`Controller`] runs as a single tokio task and is the only owner of
//! the front-end state. It reacts to three inputs:
//! - user commands sent through a [`ControllerHandle`]
//! - notifications from the current player widget
//! - completions of verification and orientation tasks it spawned
//!
//! Every channel switch starts a new session generation. Notifications and
//! completions from an older generation are dropped, and each selection
//! request carries a cancellation token that the next request cancels, so a
//! late result can never touch the state of a newer session.

mod selection;
mod state;

pub use state::{ControllerState, ControllerSnapshot};

use crate::error::{Error, Result};
use crate::orientation::OrientationProbe;
use crate::player::{ItemId, PlayerConfig, PlayerFactory, PlayerHandle, SurfaceEvent, SurfaceNotification, SurfaceSink};
use crate::verify::VerifyOutcome;
use crate::volume::Volume;
use ftv_common::config::TomlConfig;
use ftv_common::events::{EventBus, FtvEvent, Orientation, PlayerState, SelectionTrigger};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// User command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TogglePlayPause,
    /// Signed step on the 0-10 display scale
    AdjustVolume(f64),
    SwitchChannel(String),
    Skip,
    ToggleTheme,
    Shutdown,
}

/// Completion of a task the controller spawned
#[derive(Debug)]
enum Internal {
    Verified {
        generation: u64,
        request_id: u64,
        trigger: SelectionTrigger,
        outcome: VerifyOutcome,
    },
    Orientation {
        generation: u64,
        item_id: ItemId,
        result: Result<Orientation>,
    },
}

/// The selection request currently allowed to commit
struct ActiveRequest {
    id: u64,
    token: CancellationToken,
}

/// Front-end controller
pub struct Controller {
    config: TomlConfig,
    factory: Arc<dyn PlayerFactory>,
    probe: Option<Arc<dyn OrientationProbe>>,
    events: EventBus,
    rng: StdRng,

    state: ControllerState,
    handle: Option<Arc<dyn PlayerHandle>>,
    ready: bool,
    active: Option<ActiveRequest>,
    next_request_id: u64,

    snapshot_tx: watch::Sender<ControllerSnapshot>,
    surface_tx: mpsc::UnboundedSender<SurfaceNotification>,
    surface_rx: mpsc::UnboundedReceiver<SurfaceNotification>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
}

impl Controller {
    /// Create a controller; nothing runs until [`Controller::spawn`]
    pub fn new(config: TomlConfig, factory: Arc<dyn PlayerFactory>) -> Self {
        let state = ControllerState::new(Volume::new(config.player.initial_volume));
        let (snapshot_tx, _) = watch::channel(state.snapshot());
        let (surface_tx, surface_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        Self {
            config,
            factory,
            probe: None,
            events: EventBus::new(100),
            rng: StdRng::from_entropy(),
            state,
            handle: None,
            ready: false,
            active: None,
            next_request_id: 0,
            snapshot_tx,
            surface_tx,
            surface_rx,
            internal_tx,
            internal_rx,
        }
    }

    /// Look up orientation whenever an item starts playing
    pub fn with_probe(mut self, probe: Arc<dyn OrientationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Publish events on an existing bus
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Use a seeded random source (replayable rotations)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Start the controller task, tuned to `channel` (or the first configured one)
    ///
    /// Fails without starting anything if the configuration does not validate.
    pub fn spawn(self, channel: Option<&str>) -> Result<(ControllerHandle, JoinHandle<()>)> {
        self.config.validate()?;

        let initial = match channel {
            Some(name) => self
                .config
                .channel(name)
                .ok_or_else(|| Error::ChannelNotFound(name.to_string()))?
                .name
                .clone(),
            None => self
                .config
                .channels
                .first()
                .ok_or_else(|| Error::ChannelNotFound("<none configured>".to_string()))?
                .name
                .clone(),
        };

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let handle = ControllerHandle {
            cmd_tx,
            snapshot_rx: self.snapshot_tx.subscribe(),
            events: self.events.clone(),
            channels: self.config.channels.iter().map(|c| c.name.clone()).collect(),
        };

        let task = tokio::spawn(self.run(initial, cmd_rx));
        Ok((handle, task))
    }

    async fn run(mut self, initial_channel: String, mut cmd_rx: mpsc::Receiver<Command>) {
        info!("Controller starting on channel '{}'", initial_channel);
        self.switch_channel(&initial_channel);

        loop {
            tokio::select! {
                command = cmd_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(notification) = self.surface_rx.recv() => self.handle_surface(notification),
                Some(internal) = self.internal_rx.recv() => self.handle_internal(internal),
            }
        }

        self.shutdown();
    }

    fn handle_command(&mut self, command: Command) {
        debug!("Command: {:?}", command);
        match command {
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::AdjustVolume(delta) => self.adjust_volume(delta),
            Command::SwitchChannel(name) => self.switch_channel(&name),
            Command::Skip => self.start_selection(SelectionTrigger::Skip),
            Command::ToggleTheme => {
                let theme = self.state.toggle_theme();
                info!("Theme changed to {}", theme);
                self.events.emit_lossy(FtvEvent::ThemeChanged {
                    theme,
                    timestamp: chrono::Utc::now(),
                });
                self.publish();
            }
            Command::Shutdown => {}
        }
    }

    /// Usable widget, or None while missing or not yet ready
    fn ready_handle(&self) -> Option<Arc<dyn PlayerHandle>> {
        if !self.ready {
            return None;
        }
        self.handle.clone()
    }

    fn toggle_play_pause(&mut self) {
        let Some(handle) = self.ready_handle() else {
            debug!("Play/pause ignored: no ready player");
            return;
        };

        // Display flag follows the surface notification, not this command
        if handle.state() == PlayerState::Playing {
            info!("Pause requested");
            handle.pause();
        } else {
            info!("Play requested");
            handle.play();
        }
    }

    fn adjust_volume(&mut self, delta: f64) {
        let volume = self.state.adjust_volume(delta);
        info!("Volume {} ({}%)", volume, volume.percent());

        match self.ready_handle() {
            Some(handle) => handle.set_volume(volume.percent()),
            None => debug!("Volume stored only: no ready player"),
        }

        self.events.emit_lossy(FtvEvent::VolumeChanged {
            display: volume.display(),
            percent: volume.percent(),
            timestamp: chrono::Utc::now(),
        });
        self.publish();
    }

    fn switch_channel(&mut self, name: &str) {
        let Some(channel) = self.config.channel(name).cloned() else {
            warn!("Unknown channel '{}', staying on {:?}", name, self.state.channel);
            return;
        };

        self.cancel_active();
        if let Some(handle) = self.handle.take() {
            handle.destroy();
        }
        self.ready = false;

        let generation = self.state.begin_session(&channel.name);
        let player_config = PlayerConfig::for_channel(&channel, &self.config.player);
        let sink = SurfaceSink::new(generation, self.surface_tx.clone());

        match self.factory.initialize(&player_config, sink) {
            Ok(handle) => {
                info!(
                    "Channel '{}' initialized (source {}, generation {})",
                    channel.name, channel.playlist, generation
                );
                self.handle = Some(handle);
            }
            Err(e) => {
                // Controls stay no-ops until another channel is tuned
                error!("Failed to initialize player for channel '{}': {}", channel.name, e);
            }
        }

        self.events.emit_lossy(FtvEvent::ChannelSwitched {
            channel: channel.name.clone(),
            source: channel.playlist.clone(),
            generation,
            timestamp: chrono::Utc::now(),
        });
        self.publish();
    }

    fn handle_surface(&mut self, notification: SurfaceNotification) {
        if notification.generation != self.state.generation {
            debug!(
                "Dropping {:?} from stale generation {}",
                notification.event, notification.generation
            );
            return;
        }

        match notification.event {
            SurfaceEvent::Ready => {
                self.ready = true;
                if let Some(handle) = &self.handle {
                    handle.set_volume(self.state.volume.percent());
                }
                info!("Player ready (generation {})", notification.generation);
                self.start_selection(SelectionTrigger::Initial);
            }
            SurfaceEvent::StateChanged(player_state) => {
                debug!("Player state: {}", player_state);
                if self.state.apply_player_state(player_state) {
                    self.events.emit_lossy(FtvEvent::PlayingChanged {
                        playing: self.state.playing,
                        state: player_state,
                        timestamp: chrono::Utc::now(),
                    });
                    self.publish();
                }

                match player_state {
                    PlayerState::Playing => self.spawn_orientation_probe(),
                    PlayerState::Ended if self.config.player.auto_advance => {
                        self.start_selection(SelectionTrigger::AutoAdvance)
                    }
                    _ => {}
                }
            }
        }
    }

    fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Verified {
                generation,
                request_id,
                trigger,
                outcome,
            } => self.finish_verification(generation, request_id, trigger, outcome),
            Internal::Orientation {
                generation,
                item_id,
                result,
            } => self.finish_orientation(generation, item_id, result),
        }
    }

    fn spawn_orientation_probe(&self) {
        let Some(probe) = self.probe.clone() else {
            return;
        };
        let Some(item_id) = self.handle.as_ref().and_then(|h| h.current_item()) else {
            return;
        };

        let generation = self.state.generation;
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = probe.probe(&item_id).await;
            let _ = tx.send(Internal::Orientation {
                generation,
                item_id,
                result,
            });
        });
    }

    fn finish_orientation(&mut self, generation: u64, item_id: ItemId, result: Result<Orientation>) {
        if generation != self.state.generation {
            return;
        }
        let current = self.handle.as_ref().and_then(|h| h.current_item());
        if current.as_ref() != Some(&item_id) {
            debug!("Orientation for {} arrived after the item changed", item_id);
            return;
        }

        match result {
            Ok(orientation) => {
                if self.state.orientation != orientation {
                    self.state.orientation = orientation;
                    info!("Orientation of {} is {}", item_id, orientation);
                    self.events.emit_lossy(FtvEvent::OrientationChanged {
                        item_id: item_id.to_string(),
                        orientation,
                        timestamp: chrono::Utc::now(),
                    });
                    self.publish();
                }
            }
            Err(e) => error!("Error checking video orientation for {}: {}", item_id, e),
        }
    }

    fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Cancelling selection request {}", active.id);
            active.token.cancel();
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.snapshot());
    }

    fn shutdown(&mut self) {
        self.cancel_active();
        if let Some(handle) = self.handle.take() {
            handle.destroy();
        }
        self.ready = false;
        info!("Controller stopped");
    }
}

/// Cheap, cloneable front door to a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    cmd_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<ControllerSnapshot>,
    events: EventBus,
    channels: Vec<String>,
}

impl ControllerHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| Error::ControllerClosed)
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.send(Command::TogglePlayPause).await
    }

    pub async fn adjust_volume(&self, delta: f64) -> Result<()> {
        self.send(Command::AdjustVolume(delta)).await
    }

    /// Tune to `name`; unknown names are rejected here
    pub async fn switch_channel(&self, name: &str) -> Result<()> {
        if !self.channels.iter().any(|c| c == name) {
            return Err(Error::ChannelNotFound(name.to_string()));
        }
        self.send(Command::SwitchChannel(name.to_string())).await
    }

    pub async fn skip(&self) -> Result<()> {
        self.send(Command::Skip).await
    }

    pub async fn toggle_theme(&self) -> Result<()> {
        self.send(Command::ToggleTheme).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Configured channel names
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Latest published state
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that sees every future snapshot
    pub fn subscribe_snapshots(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<FtvEvent> {
        self.events.subscribe()
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<ControllerSnapshot>
    where
        F: FnMut(&ControllerSnapshot) -> bool,
    {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| Error::ControllerClosed)?;
        Ok(snapshot.clone())
    }
}
