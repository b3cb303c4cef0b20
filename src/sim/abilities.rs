//! Data-driven player skills
//!
//! Each archetype has a basic attack plus three skills (`skill_1`, `skill_2`,
//! `ultimate`), defined in `assets/config/skills.ron`. At runtime every one of
//! them is wrapped in an [`AbilitySlot`] that owns its own cooldown.

use std::collections::HashMap;
use std::path::Path;

use bevy::log::info;
use bevy::math::Vec2;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::count_down;
use super::damage::{DamageCategory, DamageIntent};
use super::effects::StatusEffect;
use super::player::Archetype;
use super::unit::UnitId;

pub const BASIC_ATTACK_ID: &str = "basic_attack";
pub const SKILL_1_ID: &str = "skill_1";
pub const SKILL_2_ID: &str = "skill_2";
pub const ULTIMATE_ID: &str = "ultimate";

/// Skills every archetype must define, besides the basic attack.
pub const REQUIRED_SKILLS: [&str; 3] = [SKILL_1_ID, SKILL_2_ID, ULTIMATE_ID];

pub const DEFAULT_SKILLS_PATH: &str = "assets/config/skills.ron";

/// How a skill picks its victims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Targeting {
    /// Closest living enemy within `range`
    #[default]
    Nearest,
    /// Every living enemy within `range` of the caster
    Area,
}

/// Configuration for a single skill, loaded from RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillConfig {
    pub name: String,
    pub cooldown: f32,
    /// Mana cost, only charged to archetypes that have mana
    #[serde(default)]
    pub mana_cost: f32,
    /// Flat damage
    #[serde(default)]
    pub damage: f32,
    /// Added damage per point of the caster's attack stat
    #[serde(default)]
    pub attack_scaling: f32,
    pub category: DamageCategory,
    pub range: f32,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub effects: Vec<StatusEffect>,
    #[serde(default)]
    pub knockback: f32,
    /// Overrides the caster's crit rate
    #[serde(default)]
    pub crit_chance: Option<f32>,
}

impl SkillConfig {
    pub fn base_damage(&self, attack: f32) -> f32 {
        self.damage + attack * self.attack_scaling
    }

    fn validate(&self, id: &str) -> Result<(), String> {
        let numbers = [
            ("cooldown", self.cooldown),
            ("mana_cost", self.mana_cost),
            ("damage", self.damage),
            ("attack_scaling", self.attack_scaling),
            ("range", self.range),
            ("knockback", self.knockback),
        ];
        for (field, value) in numbers {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{id}: {field} must be a non-negative number, got {value}"));
            }
        }
        if self.effects.iter().any(|e| !e.is_well_formed()) {
            return Err(format!("{id}: malformed status effect"));
        }
        Ok(())
    }
}

/// One archetype's loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeKit {
    pub basic_attack: SkillConfig,
    pub skills: HashMap<String, SkillConfig>,
}

/// Root structure of `skills.ron`
#[derive(Debug, Serialize, Deserialize)]
pub struct SkillsConfig {
    pub archetypes: HashMap<Archetype, ArchetypeKit>,
}

/// Every archetype's kit.
#[derive(Resource, Debug, Clone)]
pub struct SkillDefinitions {
    kits: HashMap<Archetype, ArchetypeKit>,
}

impl Default for SkillDefinitions {
    /// Load from the default config file.
    /// Panics if the file cannot be loaded - use for tests only.
    fn default() -> Self {
        load_skill_definitions(DEFAULT_SKILLS_PATH)
            .expect("Failed to load skill definitions in Default impl")
    }
}

impl SkillDefinitions {
    pub fn new(config: SkillsConfig) -> Self {
        Self {
            kits: config.archetypes,
        }
    }

    /// Parse and validate RON text.
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let config: SkillsConfig =
            ron::from_str(contents).map_err(|e| format!("Failed to parse skills: {}", e))?;
        let definitions = Self::new(config);
        definitions.validate()?;
        Ok(definitions)
    }

    pub fn kit(&self, archetype: Archetype) -> Option<&ArchetypeKit> {
        self.kits.get(&archetype)
    }

    /// Check that both archetypes exist, each with the required skills and sane numbers.
    pub fn validate(&self) -> Result<(), String> {
        for archetype in [Archetype::Tech, Archetype::Magic] {
            let kit = self
                .kits
                .get(&archetype)
                .ok_or_else(|| format!("Missing kit for archetype {:?}", archetype))?;

            let missing: Vec<&str> = REQUIRED_SKILLS
                .into_iter()
                .filter(|id| !kit.skills.contains_key(*id))
                .collect();
            if !missing.is_empty() {
                return Err(format!("{:?} is missing skills: {:?}", archetype, missing));
            }

            kit.basic_attack.validate(BASIC_ATTACK_ID)?;
            for (id, skill) in &kit.skills {
                skill.validate(id)?;
            }
        }
        Ok(())
    }
}

/// Load skill definitions from a RON file.
pub fn load_skill_definitions(path: impl AsRef<Path>) -> Result<SkillDefinitions, String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let definitions = SkillDefinitions::from_ron_str(&contents)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    info!("Loaded skill kits for {} archetypes from {}", definitions.kits.len(), path.display());
    Ok(definitions)
}

/// A cooldown-gated skill instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilitySlot {
    pub id: String,
    pub config: SkillConfig,
    cooldown_remaining: f32,
}

impl AbilitySlot {
    pub fn new(id: impl Into<String>, config: SkillConfig) -> Self {
        Self {
            id: id.into(),
            config,
            cooldown_remaining: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining <= 0.0
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    /// Overwrite the remaining cooldown (save restore).
    pub fn set_cooldown_remaining(&mut self, remaining: f32) {
        self.cooldown_remaining = if remaining.is_finite() { remaining.max(0.0) } else { 0.0 };
    }

    pub fn start_cooldown(&mut self) {
        self.cooldown_remaining = self.config.cooldown.max(0.0);
    }

    /// Count the cooldown down. Returns `true` only on the tick it becomes ready.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.cooldown_remaining <= 0.0 {
            return false;
        }
        count_down(&mut self.cooldown_remaining, dt);
        self.cooldown_remaining <= 0.0
    }
}

/// An ability the player just used, ready to be resolved against the world.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityCast {
    pub skill_id: String,
    pub caster: UnitId,
    pub origin: Vec2,
    pub facing: Vec2,
    pub targeting: Targeting,
    pub range: f32,
    pub intent: DamageIntent,
}

impl AbilityCast {
    pub fn from_slot(slot: &AbilitySlot, caster: UnitId, origin: Vec2, facing: Vec2, attack: f32) -> Self {
        let config = &slot.config;
        let mut intent = DamageIntent::new(config.base_damage(attack), config.category)
            .with_effects(config.effects.iter().cloned())
            .with_knockback(config.knockback)
            .from_source(caster);
        intent.crit_chance = config.crit_chance;

        Self {
            skill_id: slot.id.clone(),
            caster,
            origin,
            facing,
            targeting: config.targeting,
            range: config.range,
            intent,
        }
    }
}
