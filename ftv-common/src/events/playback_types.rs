//! Playback-related type definitions
//!
//! Supporting types for player widget state and display flags.

use serde::{Deserialize, Serialize};

/// Player widget state as reported by the playback surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Loaded but never started (also what an embed-blocked item stays in)
    Unstarted,
    Playing,
    Paused,
    Ended,
    /// Widget-level failure for the current item
    Error,
}

impl PlayerState {
    /// Whether the state means the current item could not be played
    ///
    /// ```
    /// use ftv_common::events::PlayerState;
    ///
    /// assert!(PlayerState::Unstarted.is_unplayable());
    /// assert!(!PlayerState::Paused.is_unplayable());
    /// ```
    pub fn is_unplayable(self) -> bool {
        matches!(self, PlayerState::Unstarted | PlayerState::Error)
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Unstarted => write!(f, "unstarted"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Ended => write!(f, "ended"),
            PlayerState::Error => write!(f, "error"),
        }
    }
}

/// Color theme of the front-end
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Video orientation, derived from item dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    /// Taller than wide (shorts)
    Vertical,
}

impl Orientation {
    /// Classify by pixel dimensions; square counts as horizontal
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height > width {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}
