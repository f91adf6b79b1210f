//! Event types for the Friday TV event system
//!
//! Provides shared event definitions and the EventBus.

mod playback_types;

pub use playback_types::{Orientation, PlayerState, Theme};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why a rotation selection was requested
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTrigger {
    /// First selection after a handle became ready
    Initial,
    /// User pressed skip
    Skip,
    /// Previous item ended
    AutoAdvance,
}

impl std::fmt::Display for SelectionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionTrigger::Initial => write!(f, "initial"),
            SelectionTrigger::Skip => write!(f, "skip"),
            SelectionTrigger::AutoAdvance => write!(f, "auto_advance"),
        }
    }
}

/// Friday TV event types
///
/// Events are broadcast via EventBus and can be serialized for observers
/// outside the process. All events carry the time they were produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FtvEvent {
    /// Displayed playing flag changed
    ///
    /// Only ever emitted in response to a surface notification, never on
    /// command issuance.
    PlayingChanged {
        playing: bool,
        /// Widget state that caused the change
        state: PlayerState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Display volume changed
    VolumeChanged {
        /// Display scale, 0.0-10.0
        display: f64,
        /// Widget scale, 0-100
        percent: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new channel was initialized
    ChannelSwitched {
        channel: String,
        /// Playlist source identifier of the new channel
        source: String,
        generation: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A rotation selection was committed
    ItemSelected {
        item_id: String,
        /// Playlist position
        index: usize,
        trigger: SelectionTrigger,
        /// Number of positions committed in the current cycle, including this one
        played_count: usize,
        playlist_len: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every position had been played; the cycle restarted
    RotationReset {
        playlist_len: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every candidate failed the playability check
    ///
    /// Non-fatal: playback is left as it was before the attempt.
    SelectionExhausted {
        trigger: SelectionTrigger,
        /// Number of candidates tried
        attempts: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Theme toggled
    ThemeChanged {
        theme: Theme,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Orientation of the current item determined
    OrientationChanged {
        item_id: String,
        orientation: Orientation,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl FtvEvent {
    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            FtvEvent::PlayingChanged { .. } => "PlayingChanged",
            FtvEvent::VolumeChanged { .. } => "VolumeChanged",
            FtvEvent::ChannelSwitched { .. } => "ChannelSwitched",
            FtvEvent::ItemSelected { .. } => "ItemSelected",
            FtvEvent::RotationReset { .. } => "RotationReset",
            FtvEvent::SelectionExhausted { .. } => "SelectionExhausted",
            FtvEvent::ThemeChanged { .. } => "ThemeChanged",
            FtvEvent::OrientationChanged { .. } => "OrientationChanged",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use ftv_common::events::{EventBus, FtvEvent, Theme};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(FtvEvent::ThemeChanged {
///     theme: Theme::Dark,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(matches!(rx.try_recv(), Ok(FtvEvent::ThemeChanged { theme: Theme::Dark, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FtvEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FtvEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: FtvEvent) -> Result<usize, broadcast::error::SendError<FtvEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: FtvEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        let result = bus.emit(FtvEvent::RotationReset {
            playlist_len: 3,
            timestamp: chrono::Utc::now(),
        });
        assert!(result.is_err());

        // Lossy emit never fails
        bus.emit_lossy(FtvEvent::RotationReset {
            playlist_len: 3,
            timestamp: chrono::Utc::now(),
        });
    }

    #[test]
    fn test_subscriber_count_and_capacity() {
        let bus = EventBus::new(42);
        assert_eq!(bus.capacity(), 42);
        assert_eq!(bus.subscriber_count(), 0);

        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_event() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let count = bus
            .emit(FtvEvent::ThemeChanged {
                theme: Theme::Dark,
                timestamp: chrono::Utc::now(),
            })
            .unwrap();
        assert_eq!(count, 2);

        assert_eq!(rx1.recv().await.unwrap().event_type(), "ThemeChanged");
        assert_eq!(rx2.recv().await.unwrap().event_type(), "ThemeChanged");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = FtvEvent::ItemSelected {
            item_id: "abc".to_string(),
            index: 2,
            trigger: SelectionTrigger::AutoAdvance,
            played_count: 1,
            playlist_len: 3,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ItemSelected");
        assert_eq!(json["trigger"], "auto_advance");
        assert_eq!(json["index"], 2);
    }

    #[test]
    fn test_orientation_from_dimensions() {
        assert_eq!(Orientation::from_dimensions(640, 360), Orientation::Horizontal);
        assert_eq!(Orientation::from_dimensions(360, 640), Orientation::Vertical);
        assert_eq!(Orientation::from_dimensions(500, 500), Orientation::Horizontal);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().to_string(), "light");
    }
}
