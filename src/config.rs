//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILCOMPOSE_CONFIG` (environment variable)
//! 2. `~/.config/mailcompose/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailcompose\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Compose-session settings.
    pub compose: ComposeConfig,
    /// Send validation limits.
    pub send: SendConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Compose-session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Clipboard filenames treated as "no real name given"; pasted images
    /// carrying one of these get a generated filename instead.
    pub generic_filenames: Vec<String>,
    /// Maximum accepted size for a pasted inline image, in bytes.
    /// Larger pastes are skipped with a warning.
    pub max_inline_image_bytes: usize,
}

/// Send validation limits (mirrors the backend's field constraints).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Maximum length of the recipient address.
    pub max_recipient_len: usize,
    /// Maximum length of the subject line.
    pub max_subject_len: usize,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            generic_filenames: vec![
                "image.png".to_string(),
                "image.jpg".to_string(),
                "image.jpeg".to_string(),
                "unknown.png".to_string(),
            ],
            max_inline_image_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            max_recipient_len: 320,
            max_subject_len: 998,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    // 1. Environment variable override
    if let Ok(env_path) = std::env::var("MAILCOMPOSE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    // 2. Standard config directory
    dirs::config_dir().map(|d| d.join("mailcompose").join("config.toml"))
}
