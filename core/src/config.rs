//! Configuration management (`config.toml` in the platform config dir)
//!
//! Loading, saving, and defaults for host settings. Settings are stored in
//! TOML format; a missing or unparsable file yields defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use winit::keyboard::KeyCode;

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Window/presentation settings
    #[serde(default)]
    pub video: VideoConfig,
    /// Input settings
    #[serde(default)]
    pub input: InputConfig,
}

/// Window and presentation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Whether to run in fullscreen mode (default: false)
    #[serde(default)]
    pub fullscreen: bool,
    /// Whether to enable vertical sync (default: true)
    #[serde(default = "default_true")]
    pub vsync: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Input configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Pause toggle key name (default: "Space")
    #[serde(default = "default_pause_key")]
    pub pause_key: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pause_key: default_pause_key(),
        }
    }
}

impl InputConfig {
    /// The configured pause key, falling back to Space for unrecognized
    /// names.
    pub fn pause_key_code(&self) -> KeyCode {
        parse_key_name(&self.pause_key).unwrap_or(KeyCode::Space)
    }
}

fn default_true() -> bool {
    true
}

fn default_pause_key() -> String {
    "Space".to_string()
}

/// Parse a key name string to a winit key code.
///
/// Supports the keys a pause binding plausibly lands on; returns `None`
/// for anything unrecognized.
pub fn parse_key_name(s: &str) -> Option<KeyCode> {
    match s {
        "Space" => Some(KeyCode::Space),
        "Enter" => Some(KeyCode::Enter),
        "Escape" | "Esc" => Some(KeyCode::Escape),
        "Tab" => Some(KeyCode::Tab),
        "P" => Some(KeyCode::KeyP),
        "F1" => Some(KeyCode::F1),
        "F2" => Some(KeyCode::F2),
        "F3" => Some(KeyCode::F3),
        "F4" => Some(KeyCode::F4),
        "F5" => Some(KeyCode::F5),
        "F6" => Some(KeyCode::F6),
        "F7" => Some(KeyCode::F7),
        "F8" => Some(KeyCode::F8),
        "F9" => Some(KeyCode::F9),
        "F10" => Some(KeyCode::F10),
        "F11" => Some(KeyCode::F11),
        "F12" => Some(KeyCode::F12),
        _ => None,
    }
}

/// Platform-specific configuration directory.
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.cinderbox", "", "Cinderbox")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Load the configuration from disk, defaulting on any failure.
pub fn load() -> Config {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join("config.toml")).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Save the configuration to disk, creating the directory if needed.
pub fn save(config: &Config) -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir)?;
        let content = toml::to_string_pretty(config)
            .expect("config serialization cannot fail");
        std::fs::write(dir.join("config.toml"), content)?;
    }
    Ok(())
}
