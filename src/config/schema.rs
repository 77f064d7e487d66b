use serde::{Deserialize, Serialize};

use crate::backend::local::RepeatMode;
use crate::eq::{EqualizerSettings, GAIN_DB_MAX, GAIN_DB_MIN, INTENSITY_MAX};

/// Top-level engine settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/duet/config.toml` or `~/.config/duet/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `DUET__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub engine: EngineSettings,
    pub equalizer: EqualizerSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Startup volume, 0..1.
    pub volume: f32,
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Default repeat mode.
    pub repeat: RepeatMode,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 0.7,
            shuffle: false,
            repeat: RepeatMode::Off,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// How often the host should call `UnifiedPlayer::tick` (milliseconds).
    pub sync_interval_ms: u64,
    /// Delay before error recovery skips past a failed track (milliseconds).
    pub error_skip_delay_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sync_interval_ms: 200,
            error_skip_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

impl Settings {
    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err("playback.volume must be within 0..1".to_string());
        }
        if self.engine.sync_interval_ms == 0 {
            return Err("engine.sync_interval_ms must be >= 1".to_string());
        }
        if !(0.0..=INTENSITY_MAX).contains(&self.equalizer.intensity) {
            return Err(format!("equalizer.intensity must be within 0..{INTENSITY_MAX}"));
        }
        for band in &self.equalizer.bands {
            if !(GAIN_DB_MIN..=GAIN_DB_MAX).contains(&band.gain_db) {
                return Err(format!(
                    "equalizer gain for {} must be within {GAIN_DB_MIN}..{GAIN_DB_MAX} dB",
                    band.label
                ));
            }
            if band.frequency <= 0.0 {
                return Err(format!("equalizer band {} has a non-positive frequency", band.label));
            }
        }
        Ok(())
    }
}
