//! Enemy presets and spawning
//!
//! Enemy archetypes are data: `assets/config/enemies.ron` lists each preset's
//! stats, AI ranges, drop table and on-hit effects, plus the preset pools each
//! room type draws from. [`EnemyPreset::build_unit`] turns a preset into a
//! live [`Unit`], applying the elite upgrade on the way.

use std::collections::HashMap;
use std::path::Path;

use bevy::log::info;
use bevy::math::Vec2;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::config::AiConfig;
use super::effects::StatusEffect;
use super::unit::{BaseStats, Unit, UnitId, UnitKind};

pub const DEFAULT_ENEMIES_PATH: &str = "assets/config/enemies.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyCategory {
    Animal,
    Plant,
    Humanoid,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Entrance,
    Normal,
    Elite,
    Boss,
    Hidden,
}

/// One row of a drop table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropEntry {
    pub item_id: String,
    /// Probability in `[0, 1]`
    pub chance: f32,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

/// AI ranges and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyAiStats {
    pub detect_range: f32,
    pub attack_range: f32,
    pub patrol_range: f32,
    /// Health fraction at or below which a non-elite flees
    pub flee_health_percent: f32,
    /// Health fraction at or below which an elite-tier enemy enrages
    #[serde(default)]
    pub enrage_health_percent: Option<f32>,
}

/// Stat block as written in the presets file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetStats {
    pub max_health: f32,
    pub attack: f32,
    pub defense: f32,
    pub speed: f32,
    pub crit_rate: f32,
    pub crit_damage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyPreset {
    pub id: String,
    pub name: String,
    pub category: EnemyCategory,
    #[serde(default)]
    pub is_elite: bool,
    pub stats: PresetStats,
    pub ai: EnemyAiStats,
    #[serde(default)]
    pub drops: Vec<DropEntry>,
    #[serde(default)]
    pub on_hit_effects: Vec<StatusEffect>,
}

/// Enemy-side data carried by a live unit.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyProfile {
    pub preset_id: String,
    /// `<preset>_<n>`, unique per simulation
    pub instance_key: String,
    pub category: EnemyCategory,
    pub is_elite: bool,
    pub ai: EnemyAiStats,
    pub drops: Vec<DropEntry>,
    pub on_hit_effects: Vec<StatusEffect>,
    pub spawn_position: Vec2,
}

impl EnemyProfile {
    /// Elites and bosses can enrage; only elites are barred from fleeing.
    pub fn is_elite_tier(&self) -> bool {
        self.is_elite || self.category == EnemyCategory::Boss
    }
}

impl EnemyPreset {
    /// Create the unit, doubling health and boosting attack for elites.
    pub fn build_unit(&self, id: UnitId, instance: u32, spawn: Vec2, ai_config: &AiConfig) -> Unit {
        let s = &self.stats;
        let mut stats = BaseStats::new(s.max_health, s.attack, s.defense, s.speed, s.crit_rate, s.crit_damage);
        if self.is_elite {
            stats.max_health *= ai_config.elite_health_multiplier;
            stats.health = stats.max_health;
            stats.attack *= ai_config.elite_attack_multiplier;
        }

        let profile = EnemyProfile {
            preset_id: self.id.clone(),
            instance_key: format!("{}_{}", self.id, instance),
            category: self.category,
            is_elite: self.is_elite,
            ai: self.ai,
            drops: self.drops.clone(),
            on_hit_effects: self.on_hit_effects.clone(),
            spawn_position: spawn,
        };

        Unit::new(id, self.name.clone(), stats, spawn, UnitKind::Enemy(profile))
    }

    fn validate(&self) -> Result<(), String> {
        let s = &self.stats;
        if !(s.max_health.is_finite() && s.max_health > 0.0) {
            return Err(format!("{}: max_health must be positive", self.id));
        }
        let non_negative = [
            ("attack", s.attack),
            ("defense", s.defense),
            ("speed", s.speed),
            ("detect_range", self.ai.detect_range),
            ("attack_range", self.ai.attack_range),
            ("patrol_range", self.ai.patrol_range),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{}: {} must be non-negative, got {}", self.id, field, value));
            }
        }
        if !(0.0..=1.0).contains(&s.crit_rate) {
            return Err(format!("{}: crit_rate must be within [0, 1]", self.id));
        }
        for drop in &self.drops {
            if drop.min_quantity > drop.max_quantity {
                return Err(format!("{}: drop {} has min > max", self.id, drop.item_id));
            }
            if !(0.0..=1.0).contains(&drop.chance) {
                return Err(format!("{}: drop {} chance must be within [0, 1]", self.id, drop.item_id));
            }
        }
        if self.on_hit_effects.iter().any(|e| !e.is_well_formed()) {
            return Err(format!("{}: malformed on-hit effect", self.id));
        }
        Ok(())
    }
}

/// Root structure of `enemies.ron`
#[derive(Debug, Serialize, Deserialize)]
pub struct EnemiesConfig {
    pub enemies: Vec<EnemyPreset>,
    #[serde(default)]
    pub rooms: HashMap<RoomType, Vec<String>>,
}

/// All enemy presets, keyed by id.
#[derive(Resource, Debug, Clone)]
pub struct EnemyDefinitions {
    presets: HashMap<String, EnemyPreset>,
    rooms: HashMap<RoomType, Vec<String>>,
}

impl Default for EnemyDefinitions {
    /// Load from the default config file.
    /// Panics if the file cannot be loaded - use for tests only.
    fn default() -> Self {
        load_enemy_definitions(DEFAULT_ENEMIES_PATH)
            .expect("Failed to load enemy definitions in Default impl")
    }
}

impl EnemyDefinitions {
    pub fn new(config: EnemiesConfig) -> Self {
        Self {
            presets: config
                .enemies
                .into_iter()
                .map(|preset| (preset.id.clone(), preset))
                .collect(),
            rooms: config.rooms,
        }
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let config: EnemiesConfig =
            ron::from_str(contents).map_err(|e| format!("Failed to parse enemies: {}", e))?;
        let total = config.enemies.len();
        let definitions = Self::new(config);
        if definitions.presets.len() != total {
            return Err("Duplicate enemy preset ids".to_string());
        }
        definitions.validate()?;
        Ok(definitions)
    }

    pub fn get(&self, id: &str) -> Option<&EnemyPreset> {
        self.presets.get(id)
    }

    /// Preset ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Presets that may appear in a room of this type (empty for safe rooms).
    pub fn enemies_for_room(&self, room: RoomType) -> &[String] {
        self.rooms.get(&room).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn validate(&self) -> Result<(), String> {
        for preset in self.presets.values() {
            preset.validate()?;
        }
        for (room, ids) in &self.rooms {
            if let Some(unknown) = ids.iter().find(|id| !self.presets.contains_key(*id)) {
                return Err(format!("Room {:?} references unknown preset {}", room, unknown));
            }
        }
        Ok(())
    }
}

/// Load enemy definitions from a RON file.
pub fn load_enemy_definitions(path: impl AsRef<Path>) -> Result<EnemyDefinitions, String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let definitions = EnemyDefinitions::from_ron_str(&contents)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    info!("Loaded {} enemy presets from {}", definitions.presets.len(), path.display());
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_WOLF: &str = r#"(
        enemies: [
            (
                id: "wolf",
                name: "Wolf",
                category: Animal,
                stats: (max_health: 50.0, attack: 10.0, defense: 5.0, speed: 180.0, crit_rate: 0.05, crit_damage: 1.3),
                ai: (detect_range: 250.0, attack_range: 40.0, patrol_range: 150.0, flee_health_percent: 0.2),
            ),
        ],
        rooms: { Normal: ["wolf"] },
    )"#;

    #[test]
    fn test_parse_minimal_preset() {
        let defs = EnemyDefinitions::from_ron_str(ONE_WOLF).unwrap();
        let wolf = defs.get("wolf").unwrap();
        assert_eq!(wolf.category, EnemyCategory::Animal);
        assert!(!wolf.is_elite);
        assert_eq!(wolf.ai.enrage_health_percent, None);
        assert_eq!(defs.enemies_for_room(RoomType::Normal), ["wolf".to_string()]);
        assert!(defs.enemies_for_room(RoomType::Entrance).is_empty());
    }

    #[test]
    fn test_unknown_room_preset_rejected() {
        let broken = ONE_WOLF.replace(r#"Normal: ["wolf"]"#, r#"Normal: ["bear"]"#);
        assert!(EnemyDefinitions::from_ron_str(&broken).is_err());
    }

    #[test]
    fn test_elite_upgrade_applied_at_creation() {
        let defs = EnemyDefinitions::from_ron_str(ONE_WOLF).unwrap();
        let mut preset = defs.get("wolf").unwrap().clone();
        preset.is_elite = true;

        let unit = preset.build_unit(UnitId(2), 0, Vec2::new(5.0, 5.0), &AiConfig::default());
        assert_eq!(unit.stats.max_health, 100.0);
        assert_eq!(unit.stats.health, 100.0);
        assert_eq!(unit.stats.attack, 15.0);
        assert_eq!(unit.enemy_profile().unwrap().spawn_position, Vec2::new(5.0, 5.0));
        assert_eq!(unit.enemy_profile().unwrap().instance_key, "wolf_0");
    }
}
