//! Controller state
//!
//! All mutable front-end state lives in one [`ControllerState`] owned by the
//! controller task. The update methods are the only way it changes; the
//! task publishes a [`ControllerSnapshot`] after every change.

use crate::player::ItemId;
use crate::rotation::{PlayedSet, Selection};
use crate::volume::Volume;
use ftv_common::events::{Orientation, PlayerState, Theme};
use serde::Serialize;

/// Front-end state
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub theme: Theme,
    pub volume: Volume,
    /// Tuned channel name
    pub channel: Option<String>,
    /// Session counter, bumped on every channel (re)initialization
    pub generation: u64,
    pub played: PlayedSet,
    /// Display flag, driven only by surface notifications
    pub playing: bool,
    pub orientation: Orientation,
    /// Last committed selection
    pub current: Option<Selection>,
    /// Rotation cycles restarted in this session
    pub resets: u64,
}

impl ControllerState {
    pub fn new(volume: Volume) -> Self {
        Self {
            volume,
            ..Self::default()
        }
    }

    /// Start a new session on `channel`
    ///
    /// Returns the new generation.
    pub fn begin_session(&mut self, channel: &str) -> u64 {
        self.generation += 1;
        self.channel = Some(channel.to_string());
        self.played.clear();
        self.playing = false;
        self.orientation = Orientation::default();
        self.current = None;
        self.resets = 0;
        self.generation
    }

    /// Apply a surface state notification to the display flag
    ///
    /// Returns true if the flag changed.
    pub fn apply_player_state(&mut self, state: PlayerState) -> bool {
        let playing = state == PlayerState::Playing;
        let changed = self.playing != playing;
        self.playing = playing;
        changed
    }

    /// Step the volume; returns the new value
    pub fn adjust_volume(&mut self, delta: f64) -> Volume {
        self.volume = self.volume.adjusted(delta);
        self.volume
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Record an accepted selection
    pub fn commit(&mut self, selection: Selection) {
        if selection.reset {
            self.resets += 1;
        }
        self.played.apply(&selection);
        self.current = Some(selection);
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            theme: self.theme,
            volume: self.volume.display(),
            volume_percent: self.volume.percent(),
            channel: self.channel.clone(),
            generation: self.generation,
            played: self.played.positions().collect(),
            playing: self.playing,
            orientation: self.orientation,
            current_index: self.current.as_ref().map(|s| s.index),
            current_item: self.current.as_ref().map(|s| s.item_id.clone()),
            resets: self.resets,
        }
    }
}

/// Read-only view of the controller state for observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub theme: Theme,
    /// Display scale, 0.0-10.0
    pub volume: f64,
    /// Widget scale, 0-100
    pub volume_percent: u8,
    pub channel: Option<String>,
    pub generation: u64,
    /// Played positions in ascending order
    pub played: Vec<usize>,
    pub playing: bool,
    pub orientation: Orientation,
    pub current_index: Option<usize>,
    pub current_item: Option<ItemId>,
    pub resets: u64,
}
