//! # Friday TV Common Library
//!
//! Shared code for the Friday TV crates including:
//! - Error types
//! - Event types (FtvEvent enum) and the EventBus
//! - Configuration loading and resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
