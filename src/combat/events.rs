//! Combat events
//!
//! Everything the simulation wants the outside world (UI, audio, analytics,
//! the combat log) to know about is pushed as a [`CombatEvent`] onto the
//! outbound [`CombatEvents`] queue. The queue is drained once per tick, so the
//! order of events inside a tick is exactly the order they happened in.

use bevy::prelude::Event;

use crate::sim::damage::DamageCategory;
use crate::sim::effects::StatusEffectKind;
use crate::sim::enemy_ai::AiState;
use crate::sim::loot::LootDrop;
use crate::sim::unit::UnitId;

/// A notification emitted by the simulation core.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// A unit entered the simulation
    UnitSpawned { unit: UnitId, name: String },
    /// The damage pipeline finished resolving one intent against one target
    DamageResolved {
        attacker: Option<UnitId>,
        target: UnitId,
        damage: u32,
        is_crit: bool,
        category: DamageCategory,
        /// Target was invincible, nothing was subtracted
        blocked: bool,
    },
    /// A periodic effect ticked and dealt damage
    EffectTick {
        target: UnitId,
        kind: StatusEffectKind,
        damage: u32,
    },
    /// A status effect was added, or an existing one of the same kind refreshed
    EffectApplied {
        target: UnitId,
        kind: StatusEffectKind,
        refreshed: bool,
    },
    /// A status effect left a unit
    EffectRemoved {
        target: UnitId,
        kind: StatusEffectKind,
        reason: EffectRemovalReason,
    },
    /// A unit's health reached zero
    UnitDied {
        unit: UnitId,
        name: String,
        killer: Option<UnitId>,
    },
    /// The player used a basic attack or a skill
    SkillUsed { unit: UnitId, skill_id: String },
    /// An enemy brain switched states
    AiStateChanged {
        unit: UnitId,
        from: AiState,
        to: AiState,
    },
    /// An elite enemy enraged (one-way)
    Enraged { unit: UnitId },
    /// An enemy death produced a reward
    LootDropped { unit: UnitId, drop: LootDrop },
    /// The player died
    GameOver { player: UnitId },
}

/// Why a status effect was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectRemovalReason {
    /// Duration ran out
    Expired,
    /// Removed explicitly (cleanse, death cleanup)
    Cleared,
    /// Pushed out by a newer effect while at capacity
    Evicted,
}

/// Outbound event queue owned by the simulation context.
#[derive(Debug, Default)]
pub struct CombatEvents {
    queue: Vec<CombatEvent>,
}

impl CombatEvents {
    pub fn push(&mut self, event: CombatEvent) {
        self.queue.push(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatEvent> {
        self.queue.iter()
    }
}
