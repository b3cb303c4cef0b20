//! Unit tests for combat log recording, query and aggregation methods
//!
//! These tests verify that the CombatLog correctly:
//! - Renders each event kind as a readable line
//! - Aggregates damage by source and per target
//! - Counts killing blows and fresh effect applications
//! - Exports a run as JSON

use bevy::math::Vec2;
use regex::Regex;

use wastelandsim::combat::events::{CombatEvent, EffectRemovalReason};
use wastelandsim::combat::log::{
    CombatLog, CombatLogEventType, RunMetadata, StructuredEventData, ENVIRONMENT_SOURCE,
};
use wastelandsim::sim::abilities::SkillDefinitions;
use wastelandsim::sim::config::SimulationConfig;
use wastelandsim::sim::damage::{DamageCategory, DamageIntent};
use wastelandsim::sim::effects::StatusEffectKind;
use wastelandsim::sim::enemy_ai::AiState;
use wastelandsim::sim::enemy_presets::EnemyDefinitions;
use wastelandsim::sim::input::InputFrame;
use wastelandsim::sim::loot::LootDrop;
use wastelandsim::sim::player::Archetype;
use wastelandsim::sim::rng::GameRng;
use wastelandsim::sim::unit::UnitId;
use wastelandsim::sim::Simulation;

const PLAYER: UnitId = UnitId(0);
const WOLF: UnitId = UnitId(1);
const BANDIT: UnitId = UnitId(2);

fn hit(attacker: Option<UnitId>, target: UnitId, damage: u32, is_crit: bool) -> CombatEvent {
    CombatEvent::DamageResolved {
        attacker,
        target,
        damage,
        is_crit,
        category: DamageCategory::Physical,
        blocked: false,
    }
}

/// Log with a player, a wolf and a bandit already registered.
fn create_test_log() -> CombatLog {
    let mut log = CombatLog::default();
    for (unit, name) in [(PLAYER, "Scavenger"), (WOLF, "Mutant Wolf"), (BANDIT, "Bandit")] {
        log.record(&CombatEvent::UnitSpawned {
            unit,
            name: name.to_string(),
        });
    }
    log
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_spawn_lines_use_name_and_id() {
    let log = create_test_log();
    let lines = log.render_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "[   0.00] Mutant Wolf #1 enters the fight");
}

#[test]
fn test_damage_line_format() {
    let mut log = create_test_log();
    log.match_time = 12.5;
    log.record(&hit(Some(PLAYER), WOLF, 22, true));
    log.record(&hit(Some(WOLF), PLAYER, 9, false));

    let re = Regex::new(r"^\[\s*\d+\.\d{2}\] (.+) hits (.+) for (\d+) Physical damage( \(CRIT\))?$").unwrap();
    let lines = log.render_lines();

    let crit = re.captures(&lines[3]).expect("crit hit line");
    assert_eq!(&crit[1], "Scavenger #0");
    assert_eq!(&crit[2], "Mutant Wolf #1");
    assert_eq!(&crit[3], "22");
    assert!(crit.get(4).is_some());
    assert!(lines[3].starts_with("[  12.50]"));

    let plain = re.captures(&lines[4]).expect("plain hit line");
    assert_eq!(&plain[3], "9");
    assert!(plain.get(4).is_none());
}

#[test]
fn test_blocked_hit_line() {
    let mut log = create_test_log();
    log.record(&CombatEvent::DamageResolved {
        attacker: Some(WOLF),
        target: PLAYER,
        damage: 0,
        is_crit: false,
        category: DamageCategory::Physical,
        blocked: true,
    });
    assert!(log.entries[3].message.ends_with("but it is invincible"));
}

#[test]
fn test_effect_and_behavior_lines() {
    let mut log = create_test_log();
    log.record(&CombatEvent::EffectApplied {
        target: PLAYER,
        kind: StatusEffectKind::Bleed,
        refreshed: false,
    });
    log.record(&CombatEvent::EffectTick {
        target: PLAYER,
        kind: StatusEffectKind::Bleed,
        damage: 2,
    });
    log.record(&CombatEvent::EffectRemoved {
        target: PLAYER,
        kind: StatusEffectKind::Bleed,
        reason: EffectRemovalReason::Expired,
    });
    log.record(&CombatEvent::AiStateChanged {
        unit: WOLF,
        from: AiState::Chase,
        to: AiState::Attack,
    });
    log.record(&CombatEvent::Enraged { unit: BANDIT });

    let messages: Vec<&str> = log.entries[3..].iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Bleed applied to Scavenger #0",
            "Scavenger #0 takes 2 Bleed damage",
            "Bleed removed from Scavenger #0 (Expired)",
            "Mutant Wolf #1: Chase -> Attack",
            "Bandit #2 becomes enraged!",
        ]
    );
}

#[test]
fn test_death_and_loot_lines() {
    let mut log = create_test_log();
    log.record(&CombatEvent::UnitDied {
        unit: BANDIT,
        name: "Bandit".to_string(),
        killer: Some(PLAYER),
    });
    log.record(&CombatEvent::LootDropped {
        unit: BANDIT,
        drop: LootDrop::Currency { amount: 17 },
    });
    log.record(&CombatEvent::LootDropped {
        unit: BANDIT,
        drop: LootDrop::Item {
            item_id: "essence_human".to_string(),
            quantity: 2,
        },
    });
    log.record(&CombatEvent::UnitDied {
        unit: WOLF,
        name: "Mutant Wolf".to_string(),
        killer: None,
    });

    let re = Regex::new(r"^Bandit #2 dropped (\d+ currency|\w+ x\d+)$").unwrap();
    assert_eq!(log.entries[3].message, "Bandit #2 was killed by Scavenger #0");
    assert!(re.is_match(&log.entries[4].message));
    assert!(re.is_match(&log.entries[5].message));
    assert_eq!(log.entries[6].message, "Mutant Wolf #1 died");
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_filter_and_recent() {
    let mut log = create_test_log();
    log.record(&hit(Some(PLAYER), WOLF, 10, false));
    log.record(&CombatEvent::EffectTick {
        target: WOLF,
        kind: StatusEffectKind::Burn,
        damage: 3,
    });
    log.record(&CombatEvent::SkillUsed {
        unit: PLAYER,
        skill_id: "skill_1".to_string(),
    });

    assert_eq!(log.filter_by_type(CombatLogEventType::Spawn).len(), 3);
    assert_eq!(log.hp_changes_only().len(), 2);

    let recent = log.recent(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1].event_type, CombatLogEventType::SkillUsed);
    assert_eq!(log.recent(100).len(), log.entries.len());
}

#[test]
fn test_damage_by_source_ignores_blocked_and_ticks() {
    let mut log = create_test_log();
    log.record(&hit(Some(PLAYER), WOLF, 14, false));
    log.record(&hit(Some(PLAYER), BANDIT, 21, true));
    log.record(&hit(Some(WOLF), PLAYER, 9, false));
    log.record(&CombatEvent::DamageResolved {
        attacker: Some(WOLF),
        target: PLAYER,
        damage: 0,
        is_crit: false,
        category: DamageCategory::Physical,
        blocked: true,
    });
    log.record(&hit(None, WOLF, 5, false));
    log.record(&CombatEvent::EffectTick {
        target: PLAYER,
        kind: StatusEffectKind::Bleed,
        damage: 2,
    });

    let by_source = log.damage_by_source();
    assert_eq!(by_source["Scavenger #0"], 35);
    assert_eq!(by_source["Mutant Wolf #1"], 9);
    assert_eq!(by_source[ENVIRONMENT_SOURCE], 5);

    assert_eq!(log.total_damage_dealt("Scavenger #0"), 35);
    assert_eq!(log.total_damage_dealt("Nobody"), 0);
    assert_eq!(log.total_damage_taken("Scavenger #0"), 11);
    assert_eq!(log.total_damage_taken("Mutant Wolf #1"), 19);
}

#[test]
fn test_killing_blows_and_effect_counts() {
    let mut log = create_test_log();
    for unit in [WOLF, BANDIT] {
        log.record(&CombatEvent::UnitDied {
            unit,
            name: String::new(),
            killer: Some(PLAYER),
        });
    }
    for refreshed in [false, true, true] {
        log.record(&CombatEvent::EffectApplied {
            target: WOLF,
            kind: StatusEffectKind::Slow,
            refreshed,
        });
    }
    log.record(&CombatEvent::EffectApplied {
        target: BANDIT,
        kind: StatusEffectKind::Burn,
        refreshed: false,
    });

    assert_eq!(log.killing_blows("Scavenger #0"), 2);
    assert_eq!(log.killing_blows("Mutant Wolf #1"), 0);

    let counts = log.effects_applied_by_kind();
    assert_eq!(counts[&StatusEffectKind::Slow], 1);
    assert_eq!(counts[&StatusEffectKind::Burn], 1);
    assert!(!counts.contains_key(&StatusEffectKind::Poison));
}

// =============================================================================
// Recording a live simulation
// =============================================================================

#[test]
fn test_records_simulation_events_in_order() {
    let mut sim = Simulation::new(
        SimulationConfig::default(),
        SkillDefinitions::default(),
        EnemyDefinitions::default(),
        GameRng::from_seed(4),
    );
    let player = sim.spawn_player(Archetype::Tech, Vec2::ZERO).unwrap();
    let bandit = sim.spawn_enemy("bandit", Vec2::new(250.0, 0.0)).unwrap();
    sim.resolve_damage_between(
        Some(player),
        bandit,
        &DamageIntent::new(1000.0, DamageCategory::True),
    );
    sim.tick(0.1, &InputFrame::idle());

    let mut log = CombatLog::default();
    for event in sim.drain_events() {
        log.record(&event);
    }

    let types: Vec<CombatLogEventType> = log.entries.iter().map(|e| e.event_type).collect();
    let death = types.iter().position(|t| *t == CombatLogEventType::Death).unwrap();
    let damage = types.iter().position(|t| *t == CombatLogEventType::Damage).unwrap();
    assert!(damage < death);
    // Bandits always drop currency
    assert!(types[death + 1..].contains(&CombatLogEventType::Loot));

    assert_eq!(log.killing_blows(&log.name_of(player)), 1);
    let loot = log
        .entries
        .iter()
        .find_map(|e| match &e.data {
            Some(StructuredEventData::Loot { drop: LootDrop::Currency { amount }, .. }) => Some(*amount),
            _ => None,
        })
        .unwrap();
    assert!((10..=25).contains(&loot));
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_save_to_file_writes_metadata_and_entries() {
    let mut log = create_test_log();
    log.record(&hit(Some(PLAYER), WOLF, 14, false));

    let path = std::env::temp_dir().join(format!("wastelandsim_log_{}.json", std::process::id()));
    let path = path.to_string_lossy().into_owned();
    let metadata = RunMetadata {
        scenario: "log export".to_string(),
        outcome: "Victory".to_string(),
        elapsed: 3.0,
        seed: Some(9),
        final_state: Default::default(),
    };

    let written = log.save_to_file(&metadata, Some(&path)).unwrap();
    assert_eq!(written, path);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["metadata"]["scenario"], "log export");
    assert_eq!(json["metadata"]["seed"], 9);
    assert_eq!(json["entries"].as_array().unwrap().len(), 4);
    assert_eq!(json["entries"][3]["event_type"], "Damage");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_save_to_unwritable_path_errors() {
    let log = create_test_log();
    let metadata = RunMetadata {
        scenario: "bad path".to_string(),
        outcome: "Timeout".to_string(),
        elapsed: 0.0,
        seed: None,
        final_state: Default::default(),
    };
    let err = log
        .save_to_file(&metadata, Some("/nonexistent_dir/nested/log.json"))
        .unwrap_err();
    assert!(err.starts_with("Failed to write"));
}
