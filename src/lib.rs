//! WastelandSim - real-time combat core for a 2D wasteland action game
//!
//! Units, status effects and damage, the player's ability and resource
//! controller, and the enemy AI state machine, plus a bevy plugin and a
//! headless runner around them.
//!
//! This library exposes the core modules for testing and reuse.

pub mod cli;
pub mod combat;
pub mod headless;
pub mod sim;

// Re-export commonly used types
pub use combat::events::CombatEvent;
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::ScenarioConfig;
pub use sim::Simulation;
