//! Tunable constants for the monster engine
//!
//! Loaded from JSON; any field left out keeps its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::EngineError;

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Sight radius for perception and fleeing
    pub max_sight: i32,

    /// Monsters at this distance or more are never processed
    pub aaf_limit: i32,

    /// Energy spent per action
    pub energy_per_action: i32,

    /// Breeders stop multiplying once this many are on the floor
    pub max_repro: i32,

    /// Crowding divisor for multiplication
    pub mult_adjust: i32,

    /// Pets further than this go looking for the player
    pub pet_seek_dist: i32,

    /// Glyph of warding resists unless `1d(glyph_break) < level`
    pub glyph_break: i32,

    /// Explosive rune goes off if `1d(rune_break) > level`
    pub rune_break: i32,

    /// One in this many wall-destroying moves is audible
    pub grind_noise: i32,

    /// Scent older than this (relative to the player's cell) is ignored
    pub scent_stale_ticks: u32,

    /// Nightmare difficulty: all monsters are faster
    pub nightmare: bool,
    pub nightmare_speed_bonus: i16,

    /// One in this many turns an awake shape-changer changes form
    pub chameleon_chance: i32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            max_sight: 20,
            aaf_limit: 100,
            energy_per_action: 100,
            max_repro: 100,
            mult_adjust: 8,
            pet_seek_dist: 6,
            glyph_break: 550,
            rune_break: 299,
            grind_noise: 20,
            scent_stale_ticks: 128,
            nightmare: false,
            nightmare_speed_bonus: 5,
            chameleon_chance: 13,
        }
    }
}

impl AiConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: AiConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Reject values that would divide by zero or make no sense
    pub fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("max_sight", self.max_sight),
            ("aaf_limit", self.aaf_limit),
            ("energy_per_action", self.energy_per_action),
            ("mult_adjust", self.mult_adjust),
            ("glyph_break", self.glyph_break),
            ("rune_break", self.rune_break),
            ("grind_noise", self.grind_noise),
            ("chameleon_chance", self.chameleon_chance),
        ];
        for (name, value) in positive {
            if value <= 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.max_repro < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "max_repro must not be negative, got {}",
                self.max_repro
            )));
        }
        if self.pet_seek_dist < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "pet_seek_dist must not be negative, got {}",
                self.pet_seek_dist
            )));
        }
        if self.scent_stale_ticks == 0 {
            return Err(EngineError::InvalidConfig(
                "scent_stale_ticks must be positive".to_string(),
            ));
        }
        if self.aaf_limit < self.max_sight {
            return Err(EngineError::InvalidConfig(format!(
                "aaf_limit ({}) is below max_sight ({})",
                self.aaf_limit, self.max_sight
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_sight, 20);
        assert_eq!(config.scent_stale_ticks, 128);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AiConfig::from_json_str(r#"{ "max_repro": 12, "nightmare": true }"#).unwrap();
        assert_eq!(config.max_repro, 12);
        assert!(config.nightmare);
        assert_eq!(config.pet_seek_dist, 6);
    }

    #[test]
    fn test_rejects_zero_divisor() {
        let err = AiConfig::from_json_str(r#"{ "mult_adjust": 0 }"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(AiConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AiConfig::default();
        config.grind_noise = 7;
        let json = config.to_json().unwrap();
        assert_eq!(AiConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = AiConfig::load(Path::new("/nonexistent/ai.json")).unwrap_err();
        assert!(matches!(err, EngineError::ConfigIo { .. }));
    }
}
