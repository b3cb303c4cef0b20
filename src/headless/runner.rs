//! Headless scenario execution
//!
//! Builds a bevy app from `MinimalPlugins` plus [`CombatPlugin`], steps it at a
//! fixed timestep with `TimeUpdateStrategy::ManualDuration`, and stops when the
//! player dies, every enemy is dead, or the time limit is reached.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use serde::Serialize;
use std::time::Duration;

use crate::combat::events::CombatEvent;
use crate::combat::log::{CombatLog, CombatLogEventType, RunMetadata};
use crate::combat::{CombatPlugin, CombatSystemPhase};
use crate::sim::abilities::load_skill_definitions;
use crate::sim::enemy_presets::load_enemy_definitions;
use crate::sim::input::ScriptedInput;
use crate::sim::loot::{RewardLedger, RewardSink};
use crate::sim::rng::GameRng;
use crate::sim::snapshot::{EnemySnapshot, PlayerSnapshot};
use crate::sim::Simulation;

use super::config::ScenarioConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioOutcome {
    /// Every enemy died
    Victory,
    /// The player died
    Defeat,
    /// Time ran out with both sides standing
    Timeout,
}

/// Result of a completed headless scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub outcome: ScenarioOutcome,
    /// Simulated seconds
    pub elapsed: f32,
    pub player: Option<PlayerSnapshot>,
    pub enemies_spawned: usize,
    pub enemies_defeated: usize,
    pub surviving_enemies: Vec<EnemySnapshot>,
    /// Everything the defeated enemies dropped
    pub rewards: RewardLedger,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub log_path: Option<String>,
    pub random_seed: Option<u64>,
}

/// Rewards collected from forwarded `LootDropped` events.
#[derive(Resource, Default)]
pub struct ScenarioRewards(pub RewardLedger);

fn collect_rewards(mut events: EventReader<CombatEvent>, mut rewards: ResMut<ScenarioRewards>) {
    for event in events.read() {
        if let CombatEvent::LootDropped { unit, drop } = event {
            rewards.0.grant(*unit, drop);
        }
    }
}

/// Run a scenario to completion.
///
/// `install_logging` adds bevy's `LogPlugin`; leave it off when a subscriber
/// is already installed (tests, repeated runs in one process).
pub fn run_headless_scenario(config: ScenarioConfig, install_logging: bool) -> Result<ScenarioResult, String> {
    config.validate()?;
    let skills = load_skill_definitions(&config.skills_path)?;
    let enemies = load_enemy_definitions(&config.enemies_path)?;
    config.validate_against(&enemies)?;

    let rng = match config.random_seed {
        Some(seed) => GameRng::from_seed(seed),
        None => GameRng::from_entropy(),
    };
    let random_seed = rng.seed;

    let mut simulation = Simulation::new(config.simulation.clone(), skills, enemies, rng);
    let player_id = simulation
        .spawn_player(config.archetype, config.player_position())
        .ok_or_else(|| format!("No skill kit for {:?}", config.archetype))?;

    let mut enemies_spawned = 0;
    for spawn in &config.enemies {
        if simulation.spawn_enemy(&spawn.preset, Vec2::from_array(spawn.position)).is_some() {
            enemies_spawned += 1;
        }
    }
    if let Some(room) = &config.room {
        let positions: Vec<Vec2> = room.positions.iter().copied().map(Vec2::from_array).collect();
        enemies_spawned += simulation.spawn_room(room.room, &positions).len();
    }
    if enemies_spawned == 0 {
        return Err("Scenario spawned no enemies".to_string());
    }

    let step = Duration::from_secs_f32(1.0 / config.tick_rate);
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if install_logging {
        app.add_plugins(LogPlugin::default());
    }
    // Virtual time clamps large steps otherwise
    app.world_mut().resource_mut::<Time<Virtual>>().set_max_delta(step);
    app.add_plugins(CombatPlugin)
        .insert_resource(TimeUpdateStrategy::ManualDuration(step))
        .insert_resource(ScriptedInput::new(config.inputs.clone()))
        .insert_resource(simulation)
        .init_resource::<ScenarioRewards>()
        .add_systems(Update, collect_rewards.after(CombatSystemPhase::Report));

    app.world_mut().resource_mut::<CombatLog>().log(
        CombatLogEventType::MatchEvent,
        format!("Scenario '{}' started", config.name),
    );
    info!(
        "Starting scenario '{}': {:?} vs {} enemies, seed {:?}",
        config.name, config.archetype, enemies_spawned, random_seed
    );

    app.finish();
    app.cleanup();

    // The first update only initializes time, so allow one extra frame.
    let max_frames = (config.max_duration_secs * config.tick_rate).ceil() as u64 + 1;
    let mut outcome = ScenarioOutcome::Timeout;
    for _ in 0..max_frames {
        app.update();

        let simulation = app.world().resource::<Simulation>();
        if simulation.is_game_over() {
            outcome = ScenarioOutcome::Defeat;
            break;
        }
        if simulation.live_enemy_count() == 0 {
            outcome = ScenarioOutcome::Victory;
            break;
        }
        if simulation.elapsed() >= config.max_duration_secs {
            break;
        }
    }

    let world = app.world_mut();
    let snapshot = world.resource::<Simulation>().snapshot();
    let elapsed = snapshot.elapsed;
    let rewards = world.resource::<ScenarioRewards>().0.clone();

    let mut combat_log = world.resource_mut::<CombatLog>();
    combat_log.log(
        CombatLogEventType::MatchEvent,
        format!("Scenario ended: {:?} after {:.2}s", outcome, elapsed),
    );
    info!("Scenario '{}' ended: {:?} after {:.2}s", config.name, outcome, elapsed);

    let player_name = combat_log.name_of(player_id);
    let enemies_defeated = combat_log
        .filter_by_type(CombatLogEventType::Death)
        .len()
        .saturating_sub(usize::from(outcome == ScenarioOutcome::Defeat));
    let damage_dealt = combat_log.total_damage_dealt(&player_name);
    let damage_taken = combat_log.total_damage_taken(&player_name);

    let log_path = match &config.output_path {
        Some(path) => {
            let metadata = RunMetadata {
                scenario: config.name.clone(),
                outcome: format!("{:?}", outcome),
                elapsed,
                seed: random_seed,
                final_state: snapshot.clone(),
            };
            Some(combat_log.save_to_file(&metadata, Some(path))?)
        }
        None => None,
    };

    Ok(ScenarioResult {
        outcome,
        elapsed,
        player: snapshot.player,
        enemies_spawned,
        enemies_defeated,
        surviving_enemies: snapshot.enemies,
        rewards,
        damage_dealt,
        damage_taken,
        log_path,
        random_seed,
    })
}
