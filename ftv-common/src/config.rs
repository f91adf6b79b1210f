//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a single TOML file. Every field has a built-in
//! default, so a missing file (or a file that only sets a few keys) is never
//! fatal.
//!
//! # Config file resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `FTV_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/friday-tv/config.toml`)
//! 4. Compiled defaults (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "FTV_CONFIG";

/// Playlist the stock build tunes to
pub const DEFAULT_PLAYLIST: &str = "PLGuEiIpCwgO1N8uHEq-v88e0_PPDhQJEu";

/// Full bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Player widget and controller settings
    #[serde(default)]
    pub player: PlayerSettings,

    /// Which selection triggers run the playability check
    #[serde(default)]
    pub verification: VerificationPolicy,

    /// Channel list; the first entry is tuned at startup
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Player widget and controller settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Display volume (0.0-10.0) applied when a handle becomes ready
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f64,

    /// Wait after `play_item_at` before reading the widget state back
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Select the next item automatically when the current one ends
    #[serde(default = "default_true")]
    pub auto_advance: bool,

    #[serde(default)]
    pub chrome: ChromeOptions,
}

impl PlayerSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            initial_volume: default_initial_volume(),
            settle_delay_ms: default_settle_delay_ms(),
            auto_advance: true,
            chrome: ChromeOptions::default(),
        }
    }
}

/// Widget chrome suppression flags
///
/// Passed through to the widget untouched; none of them affect rotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChromeOptions {
    #[serde(default = "default_true")]
    pub hide_controls: bool,

    #[serde(default = "default_true")]
    pub disable_keyboard: bool,

    #[serde(default)]
    pub show_related: bool,

    #[serde(default = "default_true")]
    pub modest_branding: bool,

    #[serde(default)]
    pub captions: CaptionMode,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            hide_controls: true,
            disable_keyboard: true,
            show_related: false,
            modest_branding: true,
            captions: CaptionMode::default(),
        }
    }
}

/// Caption display mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    #[default]
    Off,
    On,
    /// Leave it to the widget / viewer preference
    Default,
}

/// Playability check per selection trigger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationPolicy {
    #[serde(default = "default_true")]
    pub initial: bool,

    #[serde(default = "default_true")]
    pub skip: bool,

    #[serde(default = "default_true")]
    pub auto_advance: bool,
}

impl VerificationPolicy {
    /// No selection is verified
    pub fn disabled() -> Self {
        Self {
            initial: false,
            skip: false,
            auto_advance: false,
        }
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            initial: true,
            skip: true,
            auto_advance: true,
        }
    }
}

/// A named playlist source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelConfig {
    pub name: String,
    /// Playlist source identifier handed to the widget
    pub playlist: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    360
}

fn default_initial_volume() -> f64 {
    5.0
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_channels() -> Vec<ChannelConfig> {
    vec![ChannelConfig {
        name: "friday".to_string(),
        playlist: DEFAULT_PLAYLIST.to_string(),
    }]
}

impl TomlConfig {
    /// Compiled defaults: one channel, stock player settings
    pub fn compiled_defaults() -> Self {
        Self {
            logging: LoggingConfig::default(),
            player: PlayerSettings::default(),
            verification: VerificationPolicy::default(),
            channels: default_channels(),
        }
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Reject configurations the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(Error::Config("at least one channel is required".to_string()));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.name.trim().is_empty() {
                return Err(Error::Config("channel name must not be empty".to_string()));
            }
            if channel.playlist.trim().is_empty() {
                return Err(Error::Config(format!(
                    "channel '{}' has an empty playlist source",
                    channel.name
                )));
            }
            if !seen.insert(channel.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate channel name '{}'",
                    channel.name
                )));
            }
        }

        let volume = self.player.initial_volume;
        if !(0.0..=10.0).contains(&volume) {
            return Err(Error::Config(format!(
                "initial_volume {} outside 0.0-10.0",
                volume
            )));
        }

        Ok(())
    }

    /// Look up a channel by name
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.name == name)
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self::compiled_defaults()
    }
}

/// Resolves which config file to read
///
/// The platform directory lookup can be overridden so tests never depend on
/// the machine they run on.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env_var_name: String,
    config_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            env_var_name: CONFIG_ENV_VAR.to_string(),
            config_dir: dirs::config_dir(),
        }
    }

    /// Use a different environment variable name
    pub fn with_env_var(mut self, name: &str) -> Self {
        self.env_var_name = name.to_string();
        self
    }

    /// Use a different platform config directory (None disables the lookup)
    pub fn with_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config_dir = dir;
        self
    }

    /// Path of the config file in the platform config directory
    pub fn platform_config_path(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|d| d.join("friday-tv").join("config.toml"))
    }

    /// Pick the config file path by priority
    ///
    /// Returns None when no source names a file (compiled defaults apply).
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory, only if the file exists
        self.platform_config_path().filter(|p| p.exists())
    }

    /// Resolve and load the configuration
    ///
    /// A missing file falls back to compiled defaults with a warning. A file
    /// that exists but fails to parse or validate is an error.
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<TomlConfig> {
        let Some(path) = self.resolve(cli_arg) else {
            info!("No config file found, using compiled defaults");
            return Ok(TomlConfig::compiled_defaults());
        };

        if !path.exists() {
            warn!(
                "Config file {} does not exist, using compiled defaults",
                path.display()
            );
            return Ok(TomlConfig::compiled_defaults());
        }

        info!("Loading config from {}", path.display());
        TomlConfig::load(&path)
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_defaults_are_valid() {
        let config = TomlConfig::compiled_defaults();
        config.validate().unwrap();
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].playlist, DEFAULT_PLAYLIST);
        assert_eq!(config.player.initial_volume, 5.0);
        assert_eq!(config.player.settle_delay(), Duration::from_millis(1000));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_gets_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::compiled_defaults());
    }

    #[test]
    fn test_partial_player_section() {
        let config = TomlConfig::from_toml_str(
            r#"
            [player]
            settle_delay_ms = 250

            [player.chrome]
            captions = "on"
            "#,
        )
        .unwrap();

        assert_eq!(config.player.settle_delay_ms, 250);
        assert_eq!(config.player.width, 640);
        assert!(config.player.chrome.hide_controls);
        assert_eq!(config.player.chrome.captions, CaptionMode::On);
    }

    #[test]
    fn test_rejects_duplicate_channels() {
        let err = TomlConfig::from_toml_str(
            r#"
            [[channels]]
            name = "a"
            playlist = "P1"

            [[channels]]
            name = "a"
            playlist = "P2"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate channel name"));
    }

    #[test]
    fn test_rejects_out_of_range_volume() {
        let err = TomlConfig::from_toml_str("[player]\ninitial_volume = 11.0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_empty_channel_list() {
        let mut config = TomlConfig::compiled_defaults();
        config.channels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_lookup() {
        let config = TomlConfig::compiled_defaults();
        assert!(config.channel("friday").is_some());
        assert!(config.channel("saturday").is_none());
    }
}
