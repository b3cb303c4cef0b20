//! Shared fixtures for unit tests.

use bevy::math::Vec2;

use crate::combat::events::CombatEvents;

use super::abilities::SkillDefinitions;
use super::config::{CombatConfig, SimulationConfig};
use super::enemy_presets::{EnemyAiStats, EnemyCategory, EnemyDefinitions, EnemyProfile};
use super::loot::RewardLedger;
use super::player::{Archetype, PlayerController};
use super::rng::GameRng;
use super::unit::{BaseStats, Unit, UnitId, UnitKind};
use super::{CombatContext, Simulation};

/// Owns everything a [`CombatContext`] borrows.
pub struct ContextHarness {
    pub config: CombatConfig,
    pub rng: GameRng,
    pub events: CombatEvents,
    pub rewards: RewardLedger,
}

impl ContextHarness {
    pub fn new(seed: u64) -> Self {
        Self {
            config: CombatConfig::default(),
            rng: GameRng::from_seed(seed),
            events: CombatEvents::default(),
            rewards: RewardLedger::default(),
        }
    }

    pub fn ctx(&mut self) -> CombatContext<'_> {
        CombatContext::new(&self.config, &mut self.rng, &mut self.events, &mut self.rewards)
    }
}

/// A Tech player at the origin with the given max health.
pub fn player_unit(id: UnitId, max_health: f32) -> Unit {
    let mut stats = Archetype::Tech.base_stats();
    stats.max_health = max_health;
    stats.health = max_health;
    Unit::new(
        id,
        "Player",
        stats,
        Vec2::ZERO,
        UnitKind::Player {
            archetype: Archetype::Tech,
        },
    )
}

pub fn enemy_profile(category: EnemyCategory) -> EnemyProfile {
    EnemyProfile {
        preset_id: "test_enemy".to_string(),
        instance_key: "test_enemy_0".to_string(),
        category,
        is_elite: false,
        ai: EnemyAiStats {
            detect_range: 250.0,
            attack_range: 40.0,
            patrol_range: 150.0,
            flee_health_percent: 0.2,
            enrage_health_percent: None,
        },
        drops: Vec::new(),
        on_hit_effects: Vec::new(),
        spawn_position: Vec2::ZERO,
    }
}

/// A plain animal at the origin: attack 10, no defense, speed 100.
pub fn enemy_unit(id: UnitId, name: &str, max_health: f32) -> Unit {
    Unit::new(
        id,
        name,
        BaseStats::new(max_health, 10.0, 0.0, 100.0, 0.0, 1.5),
        Vec2::ZERO,
        UnitKind::Enemy(enemy_profile(EnemyCategory::Animal)),
    )
}

pub fn player_with_controller(archetype: Archetype) -> (Unit, PlayerController) {
    let skills = SkillDefinitions::default();
    let kit = skills.kit(archetype).expect("kit for archetype");
    let unit = archetype.build_unit(UnitId(0), Vec2::ZERO);
    let controller = PlayerController::new(&unit, archetype, kit, SimulationConfig::default().player);
    (unit, controller)
}

/// A simulation over the bundled definitions with a fixed seed.
pub fn test_simulation() -> Simulation {
    Simulation::new(
        SimulationConfig::default(),
        SkillDefinitions::default(),
        EnemyDefinitions::default(),
        GameRng::from_seed(42),
    )
}
