//! Plain-data snapshots for save/load collaborators.

use serde::{Deserialize, Serialize};

use super::enemy_ai::AiState;
use super::player::Archetype;
use super::unit::UnitId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownSnapshot {
    pub skill_id: String,
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub archetype: Archetype,
    pub health: f32,
    pub max_health: f32,
    pub position: [f32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammo: Option<u32>,
    pub dodge_cooldown: f32,
    pub cooldowns: Vec<CooldownSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub unit: UnitId,
    pub preset_id: String,
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    pub position: [f32; 2],
    pub ai_state: AiState,
    pub enraged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub elapsed: f32,
    pub player: Option<PlayerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
}
