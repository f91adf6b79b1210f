//! Tests for config file resolution and graceful degradation
//!
//! Covers:
//! - Priority order: CLI argument, environment variable, platform directory
//! - Missing config files fall back to compiled defaults
//! - Malformed or invalid files are reported as errors
//!
//! Note: Uses serial_test to prevent ENV variable races. Tests that touch
//! the config environment variable are marked with #[serial].

use ftv_common::config::{CaptionMode, ConfigResolver, TomlConfig};
use ftv_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const TEST_ENV_VAR: &str = "FTV_CONFIG_TEST";

fn resolver_without_platform_dir() -> ConfigResolver {
    ConfigResolver::new()
        .with_env_var(TEST_ENV_VAR)
        .with_config_dir(None)
}

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_no_sources_uses_compiled_defaults() {
    env::remove_var(TEST_ENV_VAR);
    let resolver = resolver_without_platform_dir();

    assert!(resolver.resolve(None).is_none());
    let config = resolver.load(None).unwrap();
    assert_eq!(config, TomlConfig::compiled_defaults());
}

#[test]
#[serial]
fn test_cli_argument_beats_environment() {
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "cli.toml", "[logging]\nlevel = \"debug\"\n");
    let from_env = write_config(&dir, "env.toml", "[logging]\nlevel = \"warn\"\n");
    env::set_var(TEST_ENV_VAR, &from_env);

    let resolver = resolver_without_platform_dir();
    assert_eq!(resolver.resolve(Some(&cli)), Some(cli.clone()));
    assert_eq!(resolver.load(Some(&cli)).unwrap().logging.level, "debug");

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_variable_used_without_cli() {
    let dir = TempDir::new().unwrap();
    let from_env = write_config(
        &dir,
        "env.toml",
        r#"
        [[channels]]
        name = "news"
        playlist = "PLnews"
        "#,
    );
    env::set_var(TEST_ENV_VAR, &from_env);

    let config = resolver_without_platform_dir().load(None).unwrap();
    assert_eq!(config.channels.len(), 1);
    assert_eq!(config.channels[0].name, "news");

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_platform_directory_used_when_file_exists() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("friday-tv")).unwrap();
    fs::write(
        dir.path().join("friday-tv").join("config.toml"),
        "[player.chrome]\ncaptions = \"default\"\n",
    )
    .unwrap();

    let resolver = ConfigResolver::new()
        .with_env_var(TEST_ENV_VAR)
        .with_config_dir(Some(dir.path().to_path_buf()));

    let config = resolver.load(None).unwrap();
    assert_eq!(config.player.chrome.captions, CaptionMode::Default);
}

#[test]
#[serial]
fn test_missing_platform_file_is_skipped() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let resolver = ConfigResolver::new()
        .with_env_var(TEST_ENV_VAR)
        .with_config_dir(Some(dir.path().to_path_buf()));

    assert!(resolver.resolve(None).is_none());
}

#[test]
#[serial]
fn test_missing_explicit_file_falls_back_to_defaults() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = resolver_without_platform_dir().load(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::compiled_defaults());
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let bad = write_config(&dir, "bad.toml", "[player\nwidth = ");

    let err = resolver_without_platform_dir().load(Some(&bad)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
#[serial]
fn test_invalid_values_are_an_error() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let invalid = write_config(&dir, "invalid.toml", "channels = []\n");

    assert!(resolver_without_platform_dir().load(Some(&invalid)).is_err());
}
