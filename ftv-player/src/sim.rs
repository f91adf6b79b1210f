//! In-memory player widget
//!
//! Stands in for the real embedding surface in the binary and in tests.
//! Every channel source maps to a fixed playlist; entries listed as blocked
//! refuse to start and stay `Unstarted`, the way embed-restricted videos do.
//! Notifications go out immediately, or are held until [`SimulatedPlayer::flush`]
//! when the factory is built with deferred notifications.

use crate::error::{Error, Result};
use crate::player::{ItemId, PlayerConfig, PlayerFactory, PlayerHandle, SurfaceEvent, SurfaceSink};
use ftv_common::events::PlayerState;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Command received by a simulated widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCommand {
    Initialize { source: String, generation: u64 },
    PlayItemAt { source: String, index: usize },
    Play { source: String },
    Pause { source: String },
    SetVolume { source: String, percent: u8 },
    Destroy { source: String },
}

/// Playlist served for one source
#[derive(Debug, Clone, Default)]
pub struct SimPlaylist {
    pub items: Vec<ItemId>,
    pub blocked: HashSet<ItemId>,
}

impl SimPlaylist {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(|s| ItemId::new(s)).collect(),
            blocked: HashSet::new(),
        }
    }

    /// Mark entries as refusing to play
    pub fn with_blocked<I, S>(mut self, blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked.extend(blocked.into_iter().map(|s| ItemId::new(s)));
        self
    }
}

type CommandLog = Arc<Mutex<Vec<SimCommand>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Factory for simulated widgets
#[derive(Default)]
pub struct SimulatedFactory {
    playlists: HashMap<String, SimPlaylist>,
    deferred: bool,
    log: CommandLog,
    players: Mutex<Vec<Arc<SimulatedPlayer>>>,
}

impl SimulatedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `playlist` for playlist source `source`
    pub fn with_playlist(mut self, source: &str, playlist: SimPlaylist) -> Self {
        self.playlists.insert(source.to_string(), playlist);
        self
    }

    /// Hold notifications until the test flushes them
    pub fn with_deferred_notifications(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Every command received by any widget, in order
    pub fn commands(&self) -> Vec<SimCommand> {
        lock(&self.log).clone()
    }

    /// Widgets created so far, oldest first
    pub fn players(&self) -> Vec<Arc<SimulatedPlayer>> {
        lock(&self.players).clone()
    }

    /// Most recently created widget
    pub fn latest(&self) -> Option<Arc<SimulatedPlayer>> {
        lock(&self.players).last().cloned()
    }
}

impl PlayerFactory for SimulatedFactory {
    fn initialize(&self, config: &PlayerConfig, sink: SurfaceSink) -> Result<Arc<dyn PlayerHandle>> {
        let playlist = self
            .playlists
            .get(&config.source)
            .cloned()
            .ok_or_else(|| Error::Player(format!("unknown playlist source '{}'", config.source)))?;

        lock(&self.log).push(SimCommand::Initialize {
            source: config.source.clone(),
            generation: sink.generation(),
        });

        let player = Arc::new(SimulatedPlayer {
            source: config.source.clone(),
            sink,
            deferred: self.deferred,
            log: self.log.clone(),
            inner: Mutex::new(SimInner {
                playlist,
                state: PlayerState::Unstarted,
                current: None,
                volume: 100,
                destroyed: false,
                pending: Vec::new(),
            }),
        });

        player.notify(&mut lock(&player.inner), SurfaceEvent::Ready);
        lock(&self.players).push(player.clone());
        Ok(player)
    }
}

struct SimInner {
    playlist: SimPlaylist,
    state: PlayerState,
    current: Option<usize>,
    volume: u8,
    destroyed: bool,
    pending: Vec<SurfaceEvent>,
}

/// One simulated widget
pub struct SimulatedPlayer {
    source: String,
    sink: SurfaceSink,
    deferred: bool,
    log: CommandLog,
    inner: Mutex<SimInner>,
}

impl SimulatedPlayer {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn generation(&self) -> u64 {
        self.sink.generation()
    }

    pub fn volume(&self) -> u8 {
        lock(&self.inner).volume
    }

    pub fn is_destroyed(&self) -> bool {
        lock(&self.inner).destroyed
    }

    /// Deliver held notifications
    pub fn flush(&self) {
        let pending = std::mem::take(&mut lock(&self.inner).pending);
        for event in pending {
            self.sink.notify(event);
        }
    }

    /// Make an entry refuse to play from now on
    pub fn block(&self, item: &str) {
        lock(&self.inner).playlist.blocked.insert(ItemId::from(item));
    }

    /// Play the current entry to its end
    pub fn finish_current(&self) {
        let mut inner = lock(&self.inner);
        if inner.destroyed || inner.state != PlayerState::Playing {
            return;
        }
        self.set_state(&mut inner, PlayerState::Ended);
    }

    fn record(&self, command: SimCommand) {
        lock(&self.log).push(command);
    }

    fn notify(&self, inner: &mut SimInner, event: SurfaceEvent) {
        if self.deferred {
            inner.pending.push(event);
        } else {
            self.sink.notify(event);
        }
    }

    fn set_state(&self, inner: &mut SimInner, state: PlayerState) {
        if inner.state != state {
            inner.state = state;
            self.notify(inner, SurfaceEvent::StateChanged(state));
        }
    }

    fn current_is_blocked(inner: &SimInner) -> bool {
        inner
            .current
            .and_then(|i| inner.playlist.items.get(i))
            .map_or(true, |item| inner.playlist.blocked.contains(item))
    }
}

impl PlayerHandle for SimulatedPlayer {
    fn playlist(&self) -> Option<Vec<ItemId>> {
        let inner = lock(&self.inner);
        if inner.destroyed {
            return None;
        }
        Some(inner.playlist.items.clone())
    }

    fn play_item_at(&self, index: usize) {
        self.record(SimCommand::PlayItemAt {
            source: self.source.clone(),
            index,
        });
        let mut inner = lock(&self.inner);
        if inner.destroyed || index >= inner.playlist.items.len() {
            return;
        }

        inner.current = Some(index);
        if Self::current_is_blocked(&inner) {
            debug!("Simulated widget refuses position {}", index);
            // A blocked entry never leaves the unstarted state
            inner.state = PlayerState::Unstarted;
        } else {
            // A fresh load always reports playing, even over a playing entry
            inner.state = PlayerState::Unstarted;
            self.set_state(&mut inner, PlayerState::Playing);
        }
    }

    fn state(&self) -> PlayerState {
        lock(&self.inner).state
    }

    fn current_item(&self) -> Option<ItemId> {
        let inner = lock(&self.inner);
        inner.current.and_then(|i| inner.playlist.items.get(i).cloned())
    }

    fn set_volume(&self, percent: u8) {
        self.record(SimCommand::SetVolume {
            source: self.source.clone(),
            percent,
        });
        lock(&self.inner).volume = percent.min(100);
    }

    fn play(&self) {
        self.record(SimCommand::Play {
            source: self.source.clone(),
        });
        let mut inner = lock(&self.inner);
        if inner.destroyed || Self::current_is_blocked(&inner) {
            return;
        }
        self.set_state(&mut inner, PlayerState::Playing);
    }

    fn pause(&self) {
        self.record(SimCommand::Pause {
            source: self.source.clone(),
        });
        let mut inner = lock(&self.inner);
        if inner.destroyed || inner.state != PlayerState::Playing {
            return;
        }
        self.set_state(&mut inner, PlayerState::Paused);
    }

    fn destroy(&self) {
        self.record(SimCommand::Destroy {
            source: self.source.clone(),
        });
        let mut inner = lock(&self.inner);
        inner.destroyed = true;
        inner.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftv_common::config::{ChannelConfig, PlayerSettings};
    use tokio::sync::mpsc;

    fn config(source: &str) -> PlayerConfig {
        PlayerConfig::for_channel(
            &ChannelConfig {
                name: "test".to_string(),
                playlist: source.to_string(),
            },
            &PlayerSettings::default(),
        )
    }

    #[test]
    fn test_unknown_source_fails() {
        let factory = SimulatedFactory::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(factory.initialize(&config("nope"), SurfaceSink::new(1, tx)).is_err());
    }

    #[test]
    fn test_ready_then_playing() {
        let factory =
            SimulatedFactory::new().with_playlist("P", SimPlaylist::new(["a", "b"]).with_blocked(["b"]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = factory.initialize(&config("P"), SurfaceSink::new(3, tx)).unwrap();

        assert_eq!(rx.try_recv().unwrap().event, SurfaceEvent::Ready);

        handle.play_item_at(0);
        assert_eq!(handle.state(), PlayerState::Playing);
        assert_eq!(
            rx.try_recv().unwrap().event,
            SurfaceEvent::StateChanged(PlayerState::Playing)
        );

        handle.play_item_at(1);
        assert_eq!(handle.state(), PlayerState::Unstarted);
        assert_eq!(handle.current_item(), Some(ItemId::from("b")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_deferred_notifications() {
        let factory = SimulatedFactory::new()
            .with_playlist("P", SimPlaylist::new(["a"]))
            .with_deferred_notifications();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = factory.initialize(&config("P"), SurfaceSink::new(1, tx)).unwrap();
        handle.play_item_at(0);
        assert!(rx.try_recv().is_err());

        factory.latest().unwrap().flush();
        assert_eq!(rx.try_recv().unwrap().event, SurfaceEvent::Ready);
        assert_eq!(
            rx.try_recv().unwrap().event,
            SurfaceEvent::StateChanged(PlayerState::Playing)
        );
    }

    #[test]
    fn test_destroyed_player_ignores_commands() {
        let factory = SimulatedFactory::new().with_playlist("P", SimPlaylist::new(["a"]));
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = factory.initialize(&config("P"), SurfaceSink::new(1, tx)).unwrap();
        handle.destroy();
        handle.play_item_at(0);

        assert_eq!(handle.state(), PlayerState::Unstarted);
        assert!(handle.playlist().is_none());
        assert!(factory.latest().unwrap().is_destroyed());
    }
}
