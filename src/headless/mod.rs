//! Headless mode for scripted, reproducible combat runs
//!
//! Runs one room of combat without any graphical output, suitable for
//! automated testing, balancing and AI agent integration.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario scenario.json --seed 7
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "name": "wolf_ambush",
//!   "archetype": "Tech",
//!   "enemies": [{ "preset": "mutant_wolf", "position": [120.0, 0.0] }],
//!   "random_seed": 7,
//!   "max_duration_secs": 30,
//!   "inputs": [
//!     { "at": 0.0, "press": "Attack" },
//!     { "at": 2.0, "tap": "Skill1" }
//!   ]
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::ScenarioConfig;
pub use runner::{run_headless_scenario, ScenarioOutcome, ScenarioResult};
