//! Player widget capability
//!
//! The video widget is an external collaborator. The controller talks to it
//! only through [`PlayerHandle`], creates it through [`PlayerFactory`], and
//! hears back from it through a [`SurfaceSink`].

use crate::error::Result;
use ftv_common::config::{ChannelConfig, ChromeOptions, PlayerSettings};
use ftv_common::events::PlayerState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Opaque identifier of a playlist entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Handle to a live player widget
///
/// All calls are fire-and-forget; the widget confirms state changes
/// asynchronously through the surface sink it was created with.
pub trait PlayerHandle: Send + Sync {
    /// Ordered playlist, or None while the widget has not loaded it
    fn playlist(&self) -> Option<Vec<ItemId>>;

    /// Load and start the entry at `index`
    fn play_item_at(&self, index: usize);

    /// Current widget state
    fn state(&self) -> PlayerState;

    /// Entry currently loaded, if any
    fn current_item(&self) -> Option<ItemId>;

    /// Widget volume, 0-100
    fn set_volume(&self, percent: u8);

    fn play(&self);

    fn pause(&self);

    /// Tear the widget down; the handle is unusable afterwards
    fn destroy(&self);
}

/// Creates player widgets
pub trait PlayerFactory: Send + Sync {
    fn initialize(&self, config: &PlayerConfig, sink: SurfaceSink) -> Result<Arc<dyn PlayerHandle>>;
}

/// Everything a widget needs at creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Playlist source identifier
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub chrome: ChromeOptions,
}

impl PlayerConfig {
    pub fn for_channel(channel: &ChannelConfig, settings: &PlayerSettings) -> Self {
        Self {
            source: channel.playlist.clone(),
            width: settings.width,
            height: settings.height,
            chrome: settings.chrome.clone(),
        }
    }
}

/// Notification from the playback surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Widget finished loading; the handle is usable
    Ready,
    StateChanged(PlayerState),
}

/// Surface notification tagged with the session that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceNotification {
    pub generation: u64,
    pub event: SurfaceEvent,
}

/// Where a widget sends its notifications
///
/// Each sink is bound to one session generation so notifications from a
/// torn-down widget can be told apart from the current one.
#[derive(Debug, Clone)]
pub struct SurfaceSink {
    generation: u64,
    tx: mpsc::UnboundedSender<SurfaceNotification>,
}

impl SurfaceSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<SurfaceNotification>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver a notification; dropped silently once the controller is gone
    pub fn notify(&self, event: SurfaceEvent) {
        let _ = self.tx.send(SurfaceNotification {
            generation: self.generation,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_config_for_channel() {
        let channel = ChannelConfig {
            name: "news".to_string(),
            playlist: "PLnews".to_string(),
        };
        let settings = PlayerSettings::default();
        let config = PlayerConfig::for_channel(&channel, &settings);

        assert_eq!(config.source, "PLnews");
        assert_eq!((config.width, config.height), (640, 360));
        assert!(config.chrome.hide_controls);
    }

    #[test]
    fn test_sink_tags_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = SurfaceSink::new(7, tx);
        sink.notify(SurfaceEvent::Ready);

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.generation, 7);
        assert_eq!(notification.event, SurfaceEvent::Ready);
    }

    #[test]
    fn test_sink_after_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        // Must not panic
        SurfaceSink::new(1, tx).notify(SurfaceEvent::StateChanged(PlayerState::Paused));
    }
}
