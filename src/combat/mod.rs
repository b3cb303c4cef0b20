//! Combat integration
//!
//! Hooks the plain-Rust [`Simulation`](crate::sim::Simulation) into a bevy app:
//! - [`CombatEvent`](events::CombatEvent) registered as a bevy event
//! - the simulation advanced from `Time` every `Update`
//! - drained events forwarded to readers and to the [`CombatLog`](log::CombatLog)

use bevy::prelude::*;

pub mod events;
pub mod log;
pub mod systems;

use crate::sim::input::InputFrame;
use crate::sim::Simulation;
use events::CombatEvent;
use systems::*;

/// Plugin for the combat simulation. Systems only run once a `Simulation` resource exists.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CombatEvent>()
            .init_resource::<log::CombatLog>()
            .init_resource::<SimulationSpeed>()
            .init_resource::<InputFrame>();

        configure_combat_system_ordering(app);

        app.add_systems(
            Update,
            (
                apply_scripted_input.in_set(CombatSystemPhase::Input),
                advance_simulation.in_set(CombatSystemPhase::Simulate),
                forward_combat_events.in_set(CombatSystemPhase::Report),
            )
                .run_if(resource_exists::<Simulation>),
        );
    }
}

/// System sets for the per-frame combat pipeline, in execution order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombatSystemPhase {
    /// Refresh the current [`InputFrame`]
    Input,
    /// Tick the simulation
    Simulate,
    /// Drain events into the log and the bevy event queue
    Report,
}

fn configure_combat_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            CombatSystemPhase::Input,
            CombatSystemPhase::Simulate,
            CombatSystemPhase::Report,
        )
            .chain(),
    );
}

/// Scales the simulated time per frame
#[derive(Resource)]
pub struct SimulationSpeed {
    /// 0.0 = paused, 1.0 = normal, 2.0 = double
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn normal_speed(&mut self) {
        self.multiplier = 1.0;
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_phases_are_distinct() {
        assert_ne!(CombatSystemPhase::Input, CombatSystemPhase::Simulate);
        assert_ne!(CombatSystemPhase::Simulate, CombatSystemPhase::Report);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut speed = SimulationSpeed::default();
        speed.pause();
        assert!(speed.is_paused());
        speed.normal_speed();
        assert_eq!(speed.multiplier, 1.0);
    }
}
