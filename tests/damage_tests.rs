//! Integration tests for the damage pipeline and status effects
//!
//! These tests drive `resolve_damage` and the `Simulation` context through the
//! public API and check the mitigation formula, crits, invincibility,
//! effect capacity and knockback.

use bevy::math::Vec2;

use wastelandsim::combat::events::{CombatEvent, CombatEvents, EffectRemovalReason};
use wastelandsim::sim::abilities::SkillDefinitions;
use wastelandsim::sim::config::{CombatConfig, SimulationConfig};
use wastelandsim::sim::damage::{resolve_damage, DamageCategory, DamageIntent};
use wastelandsim::sim::effects::{EffectApplication, StatusEffect, StatusEffectKind};
use wastelandsim::sim::enemy_presets::EnemyDefinitions;
use wastelandsim::sim::input::InputFrame;
use wastelandsim::sim::loot::RewardLedger;
use wastelandsim::sim::player::Archetype;
use wastelandsim::sim::rng::GameRng;
use wastelandsim::sim::unit::{Unit, UnitId};
use wastelandsim::sim::{CombatContext, Simulation};

struct Harness {
    config: CombatConfig,
    rng: GameRng,
    events: CombatEvents,
    rewards: RewardLedger,
}

impl Harness {
    fn new(seed: u64) -> Self {
        Self {
            config: CombatConfig::default(),
            rng: GameRng::from_seed(seed),
            events: CombatEvents::default(),
            rewards: RewardLedger::default(),
        }
    }

    fn hit(&mut self, attacker: Option<&Unit>, target: &mut Unit, intent: &DamageIntent) -> u32 {
        let snapshot = attacker.map(Unit::snapshot);
        let mut ctx = CombatContext::new(&self.config, &mut self.rng, &mut self.events, &mut self.rewards);
        resolve_damage(snapshot.as_ref(), Some(target), intent, &mut ctx).final_damage
    }
}

fn target_with_defense(defense: f32) -> Unit {
    let mut unit = Archetype::Tech.build_unit(UnitId(1), Vec2::ZERO);
    unit.stats.max_health = 1000.0;
    unit.stats.health = 1000.0;
    unit.stats.defense = defense;
    unit
}

fn simulation(seed: u64) -> Simulation {
    Simulation::new(
        SimulationConfig::default(),
        SkillDefinitions::default(),
        EnemyDefinitions::default(),
        GameRng::from_seed(seed),
    )
}

// =============================================================================
// Mitigation
// =============================================================================

#[test]
fn test_physical_damage_halved_when_defense_equals_coefficient() {
    let mut harness = Harness::new(1);
    let intent = DamageIntent::new(50.0, DamageCategory::Physical).with_crit_chance(0.0);

    assert_eq!(harness.hit(None, &mut target_with_defense(0.0), &intent), 50);
    assert_eq!(harness.hit(None, &mut target_with_defense(100.0), &intent), 25);
}

#[test]
fn test_magical_damage_mitigated_like_physical() {
    let mut harness = Harness::new(1);
    let intent = DamageIntent::new(50.0, DamageCategory::Magical).with_crit_chance(0.0);
    assert_eq!(harness.hit(None, &mut target_with_defense(100.0), &intent), 25);
}

#[test]
fn test_true_damage_identical_at_any_defense() {
    let mut harness = Harness::new(1);
    let intent = DamageIntent::new(50.0, DamageCategory::True).with_crit_chance(0.0);

    let low = harness.hit(None, &mut target_with_defense(0.0), &intent);
    let high = harness.hit(None, &mut target_with_defense(999.0), &intent);
    assert_eq!(low, 50);
    assert_eq!(low, high);
}

#[test]
fn test_positive_damage_never_rounds_to_zero() {
    let mut harness = Harness::new(1);
    let intent = DamageIntent::new(1.0, DamageCategory::Physical).with_crit_chance(0.0);
    assert_eq!(harness.hit(None, &mut target_with_defense(10_000.0), &intent), 1);
}

// =============================================================================
// Crits
// =============================================================================

#[test]
fn test_guaranteed_crit_uses_attacker_multiplier() {
    let mut harness = Harness::new(3);
    let mut attacker = Archetype::Magic.build_unit(UnitId(0), Vec2::ZERO);
    attacker.stats.crit_damage = 2.0;
    let intent = DamageIntent::new(40.0, DamageCategory::True).with_crit_chance(1.0);

    assert_eq!(harness.hit(Some(&attacker), &mut target_with_defense(0.0), &intent), 80);
    assert!(harness.events.iter().any(|e| matches!(
        e,
        CombatEvent::DamageResolved { is_crit: true, damage: 80, .. }
    )));
}

#[test]
fn test_crit_without_attacker_uses_default_multiplier() {
    let mut harness = Harness::new(3);
    let intent = DamageIntent::new(40.0, DamageCategory::True).with_crit_chance(1.0);
    assert_eq!(harness.hit(None, &mut target_with_defense(0.0), &intent), 60);
}

#[test]
fn test_same_seed_same_crits() {
    let intent = DamageIntent::new(30.0, DamageCategory::True).with_crit_chance(0.5);
    let run = |seed| {
        let mut harness = Harness::new(seed);
        (0..50)
            .map(|_| harness.hit(None, &mut target_with_defense(0.0), &intent))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(99), run(99));
}

// =============================================================================
// Health bounds
// =============================================================================

#[test]
fn test_health_stays_within_bounds_under_random_hits() {
    let mut harness = Harness::new(17);
    let mut dice = GameRng::from_seed(18);
    let mut target = target_with_defense(5.0);
    target.stats.max_health = 200.0;
    target.stats.health = 200.0;

    for _ in 0..200 {
        let amount = dice.random_range(0.0, 60.0);
        let intent = DamageIntent::new(amount, DamageCategory::Physical);
        harness.hit(None, &mut target, &intent);
        if dice.roll(0.3) {
            target.heal(dice.random_range(0.0, 80.0));
        }
        assert!(target.stats.health >= 0.0);
        assert!(target.stats.health <= target.stats.max_health);
        assert_eq!(target.is_dead(), target.stats.health == 0.0);
    }
}

#[test]
fn test_dead_target_ignores_further_damage() {
    let mut harness = Harness::new(1);
    let mut target = target_with_defense(0.0);
    let lethal = DamageIntent::new(5000.0, DamageCategory::True);
    harness.hit(None, &mut target, &lethal);
    assert!(target.is_dead());

    assert_eq!(harness.hit(None, &mut target, &lethal), 0);
    let deaths = harness
        .events
        .iter()
        .filter(|e| matches!(e, CombatEvent::UnitDied { .. }))
        .count();
    assert_eq!(deaths, 1);
}

// =============================================================================
// Invincibility & effects
// =============================================================================

#[test]
fn test_invincible_target_blocks_damage_but_keeps_effects() {
    let mut harness = Harness::new(1);
    let mut target = target_with_defense(0.0);
    target.set_invincible(0.3);
    let intent = DamageIntent::new(40.0, DamageCategory::Physical)
        .with_effect(StatusEffect::new(StatusEffectKind::Burn, 3.0, 2.0).with_tick_interval(1.0));

    assert_eq!(harness.hit(None, &mut target, &intent), 0);
    assert_eq!(target.stats.health, 1000.0);
    assert!(target.has_effect(StatusEffectKind::Burn));
    assert_eq!(target.effects.len(), 1);
    assert!(harness
        .events
        .iter()
        .any(|e| matches!(e, CombatEvent::DamageResolved { blocked: true, .. })));
}

#[test]
fn test_reapplying_same_kind_never_duplicates() {
    let mut sim = simulation(1);
    let player = sim.spawn_player(Archetype::Tech, Vec2::ZERO).unwrap();
    let slow = StatusEffect::new(StatusEffectKind::Slow, 2.0, 30.0);

    assert_eq!(sim.apply_effect(player, &slow), EffectApplication::Added);
    for _ in 0..5 {
        assert_eq!(sim.apply_effect(player, &slow), EffectApplication::Refreshed);
    }
    let unit = sim.unit(player).unwrap();
    assert_eq!(unit.effects.len(), 1);
    assert!((unit.current_speed() - 105.0).abs() < 1e-3);
}

#[test]
fn test_effect_capacity_evicts_oldest() {
    let mut config = SimulationConfig::default();
    config.combat.max_status_effects = 3;
    let mut sim = Simulation::new(
        config,
        SkillDefinitions::default(),
        EnemyDefinitions::default(),
        GameRng::from_seed(1),
    );
    let player = sim.spawn_player(Archetype::Tech, Vec2::ZERO).unwrap();
    for kind in [StatusEffectKind::Poison, StatusEffectKind::Burn, StatusEffectKind::Slow] {
        sim.apply_effect(player, &StatusEffect::new(kind, 10.0, 1.0));
    }
    sim.drain_events();

    // Refreshing at capacity keeps everything
    assert_eq!(
        sim.apply_effect(player, &StatusEffect::new(StatusEffectKind::Poison, 10.0, 1.0)),
        EffectApplication::Refreshed
    );
    assert_eq!(sim.unit(player).unwrap().effects.len(), 3);

    // A new kind pushes out the oldest entry
    assert_eq!(
        sim.apply_effect(player, &StatusEffect::new(StatusEffectKind::Bleed, 10.0, 1.0)),
        EffectApplication::Added
    );
    let kinds: Vec<StatusEffectKind> = sim.unit(player).unwrap().effects.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![StatusEffectKind::Burn, StatusEffectKind::Slow, StatusEffectKind::Bleed]
    );
    assert!(sim.drain_events().iter().any(|e| matches!(
        e,
        CombatEvent::EffectRemoved {
            kind: StatusEffectKind::Poison,
            reason: EffectRemovalReason::Evicted,
            ..
        }
    )));
}

#[test]
fn test_poison_ticks_then_expires_in_simulation() {
    let mut sim = simulation(1);
    let player = sim.spawn_player(Archetype::Tech, Vec2::ZERO).unwrap();
    sim.apply_effect(
        player,
        &StatusEffect::new(StatusEffectKind::Poison, 2.0, 5.0).with_tick_interval(1.0),
    );

    for _ in 0..10 {
        sim.tick(0.25, &InputFrame::idle());
    }

    let unit = sim.unit(player).unwrap();
    assert!(unit.effects.is_empty());
    // Ticks as remaining crosses 2.0 and 1.0; reaching exactly 0 is not a crossing
    assert_eq!(unit.stats.health, 90.0);
    let events = sim.drain_events();
    let ticks = events
        .iter()
        .filter(|e| matches!(e, CombatEvent::EffectTick { .. }))
        .count();
    assert_eq!(ticks, 2);
    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::EffectRemoved { reason: EffectRemovalReason::Expired, .. }
    )));
}

// =============================================================================
// Knockback & area damage
// =============================================================================

#[test]
fn test_knockback_pushes_away_from_attacker() {
    let mut harness = Harness::new(1);
    let attacker = Archetype::Tech.build_unit(UnitId(0), Vec2::ZERO);
    let mut target = target_with_defense(0.0);
    target.position = Vec2::new(10.0, 0.0);

    let intent = DamageIntent::new(5.0, DamageCategory::Physical)
        .with_crit_chance(0.0)
        .with_knockback(200.0);
    harness.hit(Some(&attacker), &mut target, &intent);

    let velocity = target.knockback_velocity();
    assert!(velocity.x > 0.0);
    assert!(velocity.y.abs() < 1e-6);
}

#[test]
fn test_area_damage_hits_only_units_in_radius() {
    let mut sim = simulation(5);
    let player = sim.spawn_player(Archetype::Tech, Vec2::ZERO).unwrap();
    let near = sim.spawn_enemy("mutant_bear", Vec2::new(50.0, 0.0)).unwrap();
    let edge = sim.spawn_enemy("mutant_bear", Vec2::new(0.0, 100.0)).unwrap();
    let far = sim.spawn_enemy("mutant_bear", Vec2::new(300.0, 0.0)).unwrap();

    let intent = DamageIntent::new(20.0, DamageCategory::True).with_crit_chance(0.0);
    let hits = sim.resolve_area_damage(Some(player), Vec2::ZERO, 100.0, &intent, &[player]);

    let ids: Vec<UnitId> = hits.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![near, edge]);
    assert_eq!(sim.unit(far).unwrap().stats.health, 120.0);
    assert_eq!(sim.unit(player).unwrap().stats.health, 100.0);
}
