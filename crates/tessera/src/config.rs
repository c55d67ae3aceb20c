//! # Engine Configuration
//!
//! Loaded once at startup. Every field has a default, so a config file only
//! needs the values it changes:
//!
//! ```toml
//! entity_capacity = 128
//! random_seed = 42
//!
//! [display]
//! width = 320
//! height = 240
//!
//! [clock]
//! locked_dt_ms = 16
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_render::{DisplayConfig, NO_SPRITE};

use crate::error::{EngineError, EngineResult};

/// Frame clock settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed frame delta in milliseconds. Zero measures real time.
    pub locked_dt_ms: u32,
    /// How often frames per second is recomputed. Zero disables it.
    pub fps_interval_ms: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            locked_dt_ms: 0,
            fps_interval_ms: 2000,
        }
    }
}

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Screen and geometry.
    pub display: DisplayConfig,
    /// Maximum live entities.
    pub entity_capacity: usize,
    /// Maximum live sprites.
    pub sprite_capacity: usize,
    /// Largest entity value, in bytes, a slot may hold.
    pub entity_slot_bytes: usize,
    /// Frame clock.
    pub clock: ClockConfig,
    /// Seed for the game logic random generator.
    pub random_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            entity_capacity: 255,
            sprite_capacity: 255,
            entity_slot_bytes: 128,
            clock: ClockConfig::default(),
            random_seed: 0,
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] on malformed TOML or unknown types.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read and
    /// [`EngineError::Parse`] if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for bad capacities and
    /// [`EngineError::Render`] for a bad display configuration.
    pub fn validate(&self) -> EngineResult<()> {
        self.display.validate()?;
        if self.entity_capacity == 0 || self.entity_capacity >= u32::MAX as usize {
            return Err(EngineError::InvalidConfig(format!(
                "entity_capacity {} out of range",
                self.entity_capacity
            )));
        }
        if self.sprite_capacity == 0 || self.sprite_capacity >= usize::from(NO_SPRITE) {
            return Err(EngineError::InvalidConfig(format!(
                "sprite_capacity {} must be within 1..{NO_SPRITE}",
                self.sprite_capacity
            )));
        }
        if self.entity_slot_bytes == 0 {
            return Err(EngineError::InvalidConfig("entity_slot_bytes is zero".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_toml_str(
            r"
            sprite_capacity = 64
            random_seed = 9

            [display]
            width = 320
            height = 240
            dma_scanlines = 16

            [clock]
            locked_dt_ms = 16
            ",
        )
        .unwrap();

        assert_eq!(config.sprite_capacity, 64);
        assert_eq!(config.random_seed, 9);
        assert_eq!(config.display.width, 320);
        assert_eq!(config.display.dma_scanlines, 16);
        // untouched fields keep their defaults
        assert_eq!(config.display.tile_width, 16);
        assert_eq!(config.entity_capacity, 255);
        assert_eq!(config.clock.locked_dt_ms, 16);
        assert_eq!(config.clock.fps_interval_ms, 2000);
    }

    #[test]
    fn test_type_errors_are_reported() {
        let err = EngineConfig::from_toml_str("entity_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn test_sprite_capacity_must_fit_collision_cells() {
        let config = EngineConfig {
            sprite_capacity: usize::from(NO_SPRITE),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_display_errors_pass_through() {
        let mut config = EngineConfig::default();
        config.display.sprite_width = 10;
        assert!(matches!(config.validate(), Err(EngineError::Render(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
