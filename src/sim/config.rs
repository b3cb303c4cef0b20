//! Simulation tuning
//!
//! Plain structs injected into the [`Simulation`](super::Simulation) context.
//! Every field defaults to the matching constant in [`super::constants`], and
//! every struct deserializes with `#[serde(default)]` so scenario files only
//! need to name the values they override.

use serde::{Deserialize, Serialize};

use super::constants::*;

/// Damage pipeline and unit-level tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Crit multiplier when the attacker has none (or is absent)
    pub default_crit_multiplier: f32,
    /// `K` in `defense / (defense + K)`
    pub defense_coefficient: f32,
    /// Grace window granted to the player after an enemy attack lands
    pub hit_invincibility: f32,
    /// Concurrent status effect cap per unit
    pub max_status_effects: usize,
    /// Knockback deceleration for newly created units (units/s²)
    pub knockback_deceleration: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            default_crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            defense_coefficient: DEFENSE_COEFFICIENT,
            hit_invincibility: HIT_INVINCIBILITY_TIME,
            max_status_effects: MAX_STATUS_EFFECTS,
            knockback_deceleration: KNOCKBACK_DECELERATION,
        }
    }
}

/// Player ability and resource tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub dodge_cooldown: f32,
    pub dodge_distance: f32,
    /// Length of the dodge and of its invincibility window
    pub dodge_invincibility: f32,
    pub reload_time: f32,
    pub max_ammo: u32,
    /// Mana per second while meditating
    pub meditate_rate: f32,
    /// Mana spent by each Magic basic attack
    pub basic_attack_mana_cost: f32,
    pub hurt_stagger: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            dodge_cooldown: DODGE_COOLDOWN,
            dodge_distance: DODGE_DISTANCE,
            dodge_invincibility: DODGE_INVINCIBILITY_TIME,
            reload_time: RELOAD_TIME,
            max_ammo: MAX_AMMO,
            meditate_rate: MEDITATE_MANA_PER_SEC,
            basic_attack_mana_cost: BASIC_ATTACK_MANA_COST,
            hurt_stagger: HURT_STAGGER_TIME,
        }
    }
}

impl PlayerConfig {
    /// Constant dodge speed so that the full distance is covered during the invincibility window.
    pub fn dodge_speed(&self) -> f32 {
        if self.dodge_invincibility > 0.0 {
            self.dodge_distance / self.dodge_invincibility
        } else {
            0.0
        }
    }
}

/// Enemy AI tuning shared by every brain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub patrol_wait: f32,
    pub attack_interval: f32,
    pub arrival_epsilon: f32,
    /// Per-tick probability that an idle enemy starts patrolling
    pub idle_wake_chance: f32,
    pub elite_health_multiplier: f32,
    pub elite_attack_multiplier: f32,
    pub enrage_attack_multiplier: f32,
    pub enrage_speed_multiplier: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            patrol_wait: PATROL_WAIT_TIME,
            attack_interval: ATTACK_INTERVAL,
            arrival_epsilon: PATROL_ARRIVAL_EPSILON,
            idle_wake_chance: IDLE_WAKE_CHANCE,
            elite_health_multiplier: ELITE_HEALTH_MULTIPLIER,
            elite_attack_multiplier: ELITE_ATTACK_MULTIPLIER,
            enrage_attack_multiplier: ENRAGE_ATTACK_MULTIPLIER,
            enrage_speed_multiplier: ENRAGE_SPEED_MULTIPLIER,
        }
    }
}

/// Everything the simulation context is tuned by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub combat: CombatConfig,
    pub player: PlayerConfig,
    pub ai: AiConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dodge_speed_covers_distance_in_window() {
        let config = PlayerConfig::default();
        assert!((config.dodge_speed() * config.dodge_invincibility - config.dodge_distance).abs() < 1e-3);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "combat": { "max_status_effects": 3 } }"#).unwrap();
        assert_eq!(config.combat.max_status_effects, 3);
        assert_eq!(config.combat.defense_coefficient, DEFENSE_COEFFICIENT);
        assert_eq!(config.player, PlayerConfig::default());
    }
}
