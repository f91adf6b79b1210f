//! # Friday TV Player Library (ftv-player)
//!
//! Drives an embedded video-player widget as a "TV channel": picks playlist
//! entries at random without repeats until the playlist is exhausted,
//! optionally checks that the chosen entry actually plays, and exposes
//! play/pause, volume, channel and theme controls.
//!
//! **Architecture:** a single controller task owns all state and consumes
//! commands, surface notifications and internal completions (action →
//! reducer). The widget itself is reached only through the
//! [`player::PlayerHandle`] and [`player::PlayerFactory`] traits.

pub mod controller;
pub mod error;
pub mod orientation;
pub mod player;
pub mod rotation;
pub mod sim;
pub mod verify;
pub mod volume;

pub use controller::{Command, Controller, ControllerHandle, ControllerSnapshot};
pub use error::{Error, Result};
pub use player::{ItemId, PlayerConfig, PlayerFactory, PlayerHandle, SurfaceEvent, SurfaceSink};
pub use rotation::{select_next, CandidatePool, PlayedSet, Selection};
