//! Configuration management for EmbedPlayer
//!
//! This module handles loading and managing playback configuration
//! from various sources including config files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::utils::error::{EmbedPlayerError, Result};

/// Main crate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Playback configuration
    pub player: PlayerConfig,

    /// Controls overlay configuration
    pub overlay: OverlayConfig,

    /// General settings
    pub general: GeneralConfig,
}

/// Playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Initial volume (0 - 100)
    pub default_volume: u32,

    /// Seconds skipped by arrow-key and skip-button seeks
    pub seek_step_secs: f64,

    /// Volume change applied by arrow-key adjustments (0 - 100)
    pub volume_step: u32,

    /// Interval between metric polls while playing, in milliseconds
    pub poll_interval_ms: u64,

    /// Playback rates offered by the rate control
    pub playback_rates: Vec<f64>,
}

/// Controls overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Milliseconds of inactivity before controls hide during playback
    pub hide_delay_ms: u64,

    /// Height of the controls bar in logical pixels
    pub controls_height: f32,

    /// Visual height of the seek bar in logical pixels
    pub seek_bar_height: f32,

    /// Multiplier widening the seek bar's clickable band beyond its visual height
    pub seek_click_tolerance: f32,

    /// Show the video title at the top of the overlay
    pub show_title: bool,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            overlay: OverlayConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 70,
            seek_step_secs: 10.0,
            volume_step: 5,
            poll_interval_ms: 1000,
            playback_rates: vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0],
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: 3000,
            controls_height: 48.0,
            seek_bar_height: 4.0,
            seek_click_tolerance: 7.0,
            show_title: true,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/embedplayer/config.toml on Linux)
    /// 3. User config file (~/.config/embedplayer/config.toml on Linux)
    /// 4. Environment variables (EMBEDPLAYER_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Try to load system config
        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config.merge_from_file(&system_path)?;
            }
        }

        // Try to load user config
        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config.merge_from_file(&user_path)?;
            }
        }

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| EmbedPlayerError::Config("Cannot determine user config path".to_string()))?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EmbedPlayerError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| EmbedPlayerError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&path, toml)
            .map_err(|e| EmbedPlayerError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Poll cadence as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.player.poll_interval_ms)
    }

    /// Auto-hide delay as a Duration
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.overlay.hide_delay_ms)
    }

    /// Merge configuration from a TOML file
    fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EmbedPlayerError::Config(format!("Failed to read config file: {}", e)))?;

        let file_config: Config = toml::from_str(&contents)
            .map_err(|e| EmbedPlayerError::Config(format!("Failed to parse config file: {}", e)))?;

        // TODO: Implement proper merging logic instead of full replacement
        *self = file_config;

        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // Example: EMBEDPLAYER_DEFAULT_VOLUME=50
        if let Ok(volume) = std::env::var("EMBEDPLAYER_DEFAULT_VOLUME") {
            self.player.default_volume = volume.parse()
                .map_err(|_| EmbedPlayerError::Config("Invalid EMBEDPLAYER_DEFAULT_VOLUME".to_string()))?;
        }

        if let Ok(interval) = std::env::var("EMBEDPLAYER_POLL_INTERVAL_MS") {
            self.player.poll_interval_ms = interval.parse()
                .map_err(|_| EmbedPlayerError::Config("Invalid EMBEDPLAYER_POLL_INTERVAL_MS".to_string()))?;
        }

        if let Ok(delay) = std::env::var("EMBEDPLAYER_HIDE_DELAY_MS") {
            self.overlay.hide_delay_ms = delay.parse()
                .map_err(|_| EmbedPlayerError::Config("Invalid EMBEDPLAYER_HIDE_DELAY_MS".to_string()))?;
        }

        if let Ok(log_level) = std::env::var("EMBEDPLAYER_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        // Validate volume range
        if self.player.default_volume > 100 {
            return Err(EmbedPlayerError::Config("Default volume must be between 0 and 100".to_string()));
        }

        if self.player.volume_step == 0 || self.player.volume_step > 100 {
            return Err(EmbedPlayerError::Config("Volume step must be between 1 and 100".to_string()));
        }

        if !self.player.seek_step_secs.is_finite() || self.player.seek_step_secs <= 0.0 {
            return Err(EmbedPlayerError::Config("Seek step must be a positive number of seconds".to_string()));
        }

        // Sub-100ms polling just hammers the engine bridge
        if self.player.poll_interval_ms < 100 {
            return Err(EmbedPlayerError::Config("Poll interval must be at least 100ms".to_string()));
        }

        if self.player.playback_rates.is_empty()
            || self.player.playback_rates.iter().any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(EmbedPlayerError::Config("Playback rates must be a non-empty list of positive numbers".to_string()));
        }

        if self.overlay.hide_delay_ms == 0 {
            return Err(EmbedPlayerError::Config("Hide delay must be non-zero".to_string()));
        }

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(EmbedPlayerError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level,
                valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/embedplayer/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA").ok()
            .map(|p| PathBuf::from(p).join("EmbedPlayer").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/EmbedPlayer/config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return dirs::config_dir()
            .map(|p| p.join("embedplayer").join("config.toml"));

        #[cfg(target_os = "windows")]
        return dirs::config_dir()
            .map(|p| p.join("EmbedPlayer").join("config.toml"));

        #[cfg(target_os = "macos")]
        return dirs::config_dir()
            .map(|p| p.join("EmbedPlayer").join("config.toml"));

        #[allow(unreachable_code)]
        None
    }
}
