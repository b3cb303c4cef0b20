//! JSON scenario configuration for headless mode

use serde::{Deserialize, Serialize};
use std::path::Path;

use bevy::math::Vec2;

use crate::sim::abilities::DEFAULT_SKILLS_PATH;
use crate::sim::config::SimulationConfig;
use crate::sim::enemy_presets::{EnemyDefinitions, RoomType, DEFAULT_ENEMIES_PATH};
use crate::sim::input::InputCommand;
use crate::sim::player::Archetype;

/// One enemy placed by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub preset: String,
    pub position: [f32; 2],
}

/// A room filled from its preset pool, one enemy per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpawn {
    pub room: RoomType,
    pub positions: Vec<[f32; 2]>,
}

/// Headless scenario loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Label used in logs and the exported metadata
    #[serde(default = "default_name")]
    pub name: String,
    pub archetype: Archetype,
    #[serde(default)]
    pub player_position: [f32; 2],
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    #[serde(default)]
    pub room: Option<RoomSpawn>,
    /// Seed for reproducible runs; entropy when absent
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Fixed simulation steps per second (default: 60)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f32,
    /// Stop after this much simulated time (default: 120)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Player input timeline
    #[serde(default)]
    pub inputs: Vec<InputCommand>,
    /// Tuning overrides; omitted fields keep their defaults
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Where to write the combat log JSON
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default = "default_skills_path")]
    pub skills_path: String,
    #[serde(default = "default_enemies_path")]
    pub enemies_path: String,
}

fn default_name() -> String {
    "scenario".to_string()
}

fn default_tick_rate() -> f32 {
    60.0
}

fn default_max_duration() -> f32 {
    120.0
}

fn default_skills_path() -> String {
    DEFAULT_SKILLS_PATH.to_string()
}

fn default_enemies_path() -> String {
    DEFAULT_ENEMIES_PATH.to_string()
}

impl ScenarioConfig {
    /// A scenario with no enemies and no input, for building up in code.
    pub fn new(archetype: Archetype) -> Self {
        Self {
            name: default_name(),
            archetype,
            player_position: [0.0, 0.0],
            enemies: Vec::new(),
            room: None,
            random_seed: None,
            tick_rate: default_tick_rate(),
            max_duration_secs: default_max_duration(),
            inputs: Vec::new(),
            simulation: SimulationConfig::default(),
            output_path: None,
            skills_path: default_skills_path(),
            enemies_path: default_enemies_path(),
        }
    }

    pub fn with_enemy(mut self, preset: &str, position: [f32; 2]) -> Self {
        self.enemies.push(EnemySpawn {
            preset: preset.to_string(),
            position,
        });
        self
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario file: {}", e))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: ScenarioConfig =
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that need no data files.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err("tick_rate must be positive".to_string());
        }
        if !(self.max_duration_secs.is_finite() && self.max_duration_secs > 0.0) {
            return Err("max_duration_secs must be positive".to_string());
        }
        if self.enemies.is_empty() && self.room.as_ref().map_or(true, |r| r.positions.is_empty()) {
            return Err("scenario needs at least one enemy spawn or a room with positions".to_string());
        }
        for command in &self.inputs {
            if !command.at.is_finite() || command.at < 0.0 {
                return Err(format!("input command time {} must be non-negative", command.at));
            }
        }
        Ok(())
    }

    /// Every hand-placed preset must exist.
    pub fn validate_against(&self, enemies: &EnemyDefinitions) -> Result<(), String> {
        for spawn in &self.enemies {
            if enemies.get(&spawn.preset).is_none() {
                return Err(format!(
                    "Unknown enemy preset: '{}'. Valid presets: {}",
                    spawn.preset,
                    enemies.ids().join(", ")
                ));
            }
        }
        Ok(())
    }

    pub fn player_position(&self) -> Vec2 {
        Vec2::from_array(self.player_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "archetype": "Tech",
            "enemies": [{ "preset": "mutant_wolf", "position": [100.0, 0.0] }]
        }"#;
        let config = ScenarioConfig::from_json_str(json).unwrap();
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.max_duration_secs, 120.0);
        assert_eq!(config.simulation, SimulationConfig::default());
        assert_eq!(config.skills_path, DEFAULT_SKILLS_PATH);
    }

    #[test]
    fn test_scenario_without_enemies_rejected() {
        let json = r#"{ "archetype": "Magic" }"#;
        assert!(ScenarioConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_non_positive_tick_rate_rejected() {
        let mut config = ScenarioConfig::new(Archetype::Tech).with_enemy("bandit", [50.0, 0.0]);
        config.tick_rate = 0.0;
        assert!(config.validate().is_err());
    }
}
