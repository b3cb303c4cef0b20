//! Combat systems
//!
//! The only ECS systems in the crate. Everything they call into is plain Rust.

use bevy::prelude::*;

use crate::sim::input::{InputFrame, ScriptedInput};
use crate::sim::Simulation;

use super::events::CombatEvent;
use super::log::CombatLog;
use super::SimulationSpeed;

/// Replace the input frame with the scripted timeline's frame, when one is installed.
pub fn apply_scripted_input(
    script: Option<ResMut<ScriptedInput>>,
    simulation: Res<Simulation>,
    mut frame: ResMut<InputFrame>,
) {
    if let Some(mut script) = script {
        *frame = script.frame_at(simulation.elapsed());
    }
}

/// Advance the simulation by the frame's delta, scaled by [`SimulationSpeed`].
pub fn advance_simulation(
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    input: Res<InputFrame>,
    mut simulation: ResMut<Simulation>,
) {
    let dt = time.delta_secs() * speed.multiplier;
    simulation.tick(dt, &*input);
}

/// Drain this tick's events into the combat log and the bevy event queue.
pub fn forward_combat_events(
    mut simulation: ResMut<Simulation>,
    mut combat_log: ResMut<CombatLog>,
    mut writer: EventWriter<CombatEvent>,
) {
    combat_log.match_time = simulation.elapsed();
    for event in simulation.drain_events() {
        combat_log.record(&event);
        writer.send(event);
    }
}
