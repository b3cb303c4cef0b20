//! Status effects
//!
//! Timed modifiers attached to a unit. Damage-over-time kinds (Poison, Burn,
//! Bleed, Radiation) deal periodic True damage; Slow scales movement speed.
//!
//! A unit holds at most one effect per kind. Re-applying a kind refreshes the
//! existing entry instead of stacking it, and only a genuinely new kind can
//! push the oldest entry out when the unit is at capacity.

use bevy::log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::events::{CombatEvent, CombatEvents, EffectRemovalReason};

use super::constants::MAX_STATUS_EFFECTS;
use super::unit::Unit;
use super::CombatContext;

/// Ordered list of a unit's active effects, oldest first.
pub type ActiveEffects = SmallVec<[StatusEffect; MAX_STATUS_EFFECTS]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusEffectKind {
    Poison,
    Burn,
    Slow,
    Bleed,
    Radiation,
}

impl StatusEffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatusEffectKind::Poison => "Poison",
            StatusEffectKind::Burn => "Burn",
            StatusEffectKind::Slow => "Slow",
            StatusEffectKind::Bleed => "Bleed",
            StatusEffectKind::Radiation => "Radiation",
        }
    }

    /// Whether periodic ticks of this kind deal damage.
    pub fn deals_damage(&self) -> bool {
        !matches!(self, StatusEffectKind::Slow)
    }
}

/// A timed modifier.
///
/// `magnitude` is damage per tick for damage-over-time kinds and percent
/// speed reduction for Slow. `tick_interval == 0` means the effect never ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusEffectKind,
    pub duration: f32,
    pub magnitude: f32,
    #[serde(default)]
    pub tick_interval: f32,
    #[serde(default)]
    pub remaining_time: f32,
}

impl StatusEffect {
    pub fn new(kind: StatusEffectKind, duration: f32, magnitude: f32) -> Self {
        Self {
            kind,
            duration,
            magnitude,
            tick_interval: 0.0,
            remaining_time: duration,
        }
    }

    pub fn with_tick_interval(mut self, interval: f32) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn is_well_formed(&self) -> bool {
        self.duration.is_finite()
            && self.duration > 0.0
            && self.magnitude.is_finite()
            && self.tick_interval.is_finite()
            && self.tick_interval >= 0.0
    }
}

/// Result of [`apply_effect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectApplication {
    Added,
    Refreshed,
    Rejected,
}

impl EffectApplication {
    pub fn applied(&self) -> bool {
        !matches!(self, EffectApplication::Rejected)
    }
}

/// Add `effect` to `unit`, or refresh the existing effect of the same kind.
///
/// A refresh resets remaining time and duration to the incoming duration and
/// keeps the larger magnitude; the tick interval is left as it was. A new
/// kind arriving at `capacity` evicts the oldest entry first. Dead units and
/// malformed effects are rejected.
pub fn apply_effect(
    unit: &mut Unit,
    effect: &StatusEffect,
    capacity: usize,
    events: &mut CombatEvents,
) -> EffectApplication {
    if unit.is_dead() {
        debug!("{}: ignoring {} on a dead unit", unit.name, effect.kind.name());
        return EffectApplication::Rejected;
    }
    if !effect.is_well_formed() {
        debug!("{}: rejecting malformed {} effect", unit.name, effect.kind.name());
        return EffectApplication::Rejected;
    }

    if let Some(existing) = unit.effects.iter_mut().find(|e| e.kind == effect.kind) {
        existing.duration = effect.duration;
        existing.remaining_time = effect.duration;
        existing.magnitude = existing.magnitude.max(effect.magnitude);
        events.push(CombatEvent::EffectApplied {
            target: unit.id,
            kind: effect.kind,
            refreshed: true,
        });
        return EffectApplication::Refreshed;
    }

    if capacity == 0 {
        return EffectApplication::Rejected;
    }

    while unit.effects.len() >= capacity {
        let evicted = unit.effects.remove(0);
        debug!("{}: {} evicted by {}", unit.name, evicted.kind.name(), effect.kind.name());
        events.push(CombatEvent::EffectRemoved {
            target: unit.id,
            kind: evicted.kind,
            reason: EffectRemovalReason::Evicted,
        });
    }

    let mut added = effect.clone();
    added.remaining_time = added.duration;
    unit.effects.push(added);
    events.push(CombatEvent::EffectApplied {
        target: unit.id,
        kind: effect.kind,
        refreshed: false,
    });

    debug_assert!(unit.effects.len() <= capacity);
    EffectApplication::Added
}

/// Whether the countdown from `before` to `after` crossed a multiple of `interval`.
fn crossed_tick_boundary(before: f32, after: f32, interval: f32) -> bool {
    (after / interval).floor() != (before / interval).floor()
}

/// Per-tick damage of a damage-over-time effect: rounded, at least 1.
pub fn tick_damage(magnitude: f32) -> f32 {
    magnitude.round().max(1.0)
}

/// Decrement every effect, fire due ticks, then drop expired entries.
///
/// Tick damage is True damage with no attacker and goes through
/// [`Unit::take_damage`], so it respects invincibility and can kill.
pub fn advance_effects(unit: &mut Unit, dt: f32, ctx: &mut CombatContext) {
    if unit.effects.is_empty() {
        return;
    }

    let mut due: SmallVec<[(StatusEffectKind, f32); MAX_STATUS_EFFECTS]> = SmallVec::new();
    for effect in unit.effects.iter_mut() {
        let before = effect.remaining_time;
        effect.remaining_time -= dt;
        if effect.tick_interval > 0.0
            && crossed_tick_boundary(before, effect.remaining_time, effect.tick_interval)
        {
            due.push((effect.kind, effect.magnitude));
        }
    }

    for (kind, magnitude) in due {
        if !kind.deals_damage() {
            continue;
        }
        let dealt = unit.take_damage(tick_damage(magnitude), None, ctx);
        if dealt > 0.0 {
            ctx.events.push(CombatEvent::EffectTick {
                target: unit.id,
                kind,
                damage: dealt.round() as u32,
            });
        }
    }

    let mut index = 0;
    while index < unit.effects.len() {
        if unit.effects[index].remaining_time <= 0.0 {
            let expired = unit.effects.remove(index);
            ctx.events.push(CombatEvent::EffectRemoved {
                target: unit.id,
                kind: expired.kind,
                reason: EffectRemovalReason::Expired,
            });
        } else {
            index += 1;
        }
    }
}

/// Base speed scaled by `(1 - magnitude / 100)` for every Slow present, floored at zero.
pub fn modified_speed(base_speed: f32, effects: &[StatusEffect]) -> f32 {
    effects
        .iter()
        .filter(|e| e.kind == StatusEffectKind::Slow)
        .fold(base_speed, |speed, slow| speed * (1.0 - slow.magnitude / 100.0))
        .max(0.0)
}
