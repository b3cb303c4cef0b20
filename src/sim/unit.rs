//! Unit model
//!
//! A [`Unit`] is anything with health that can be hit: the player or an
//! enemy. It owns its stats, its status effects, its invincibility window and
//! its knockback motion, and it is the only place health ever changes.
//!
//! Units never hold references to each other. Cross-unit reads go through a
//! [`UnitSnapshot`] taken at a well-defined point of the tick.

use std::fmt;

use bevy::log::{debug, info};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::events::{CombatEvent, CombatEvents, EffectRemovalReason};

use super::effects::{self, ActiveEffects, StatusEffect, StatusEffectKind};
use super::enemy_presets::EnemyProfile;
use super::loot;
use super::player::Archetype;
use super::{count_down, CombatContext};

/// Opaque, never-reused handle of a unit inside the simulation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Base combat statistics.
///
/// `health` stays within `[0, max_health]`; go through [`Unit::take_damage`],
/// [`Unit::heal`] or [`Unit::set_health`] rather than writing it directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_health: f32,
    pub health: f32,
    pub attack: f32,
    pub defense: f32,
    /// Movement speed in units per second
    pub speed: f32,
    /// Probability in `[0, 1]`
    pub crit_rate: f32,
    /// Multiplier applied on a critical hit (>= 1)
    pub crit_damage: f32,
}

impl BaseStats {
    /// Stats at full health.
    pub fn new(
        max_health: f32,
        attack: f32,
        defense: f32,
        speed: f32,
        crit_rate: f32,
        crit_damage: f32,
    ) -> Self {
        Self {
            max_health,
            health: max_health,
            attack,
            defense,
            speed,
            crit_rate,
            crit_damage,
        }
    }
}

/// Which side a unit fights on, plus side-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitKind {
    Player { archetype: Archetype },
    Enemy(EnemyProfile),
}

/// Read-only view of a unit used for cross-unit reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub attack: f32,
    pub crit_rate: f32,
    pub crit_damage: f32,
    pub is_dead: bool,
    pub is_player: bool,
}

impl UnitSnapshot {
    pub fn health_percent(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub stats: BaseStats,
    pub position: Vec2,
    pub kind: UnitKind,
    /// Active status effects, oldest first
    pub effects: ActiveEffects,
    pub knockback_deceleration: f32,
    invincibility_remaining: f32,
    knockback_velocity: Vec2,
    is_dead: bool,
}

impl Unit {
    pub fn new(id: UnitId, name: impl Into<String>, stats: BaseStats, position: Vec2, kind: UnitKind) -> Self {
        debug_assert!(stats.max_health > 0.0, "unit needs positive max health");
        let mut stats = stats;
        stats.health = stats.health.clamp(0.0, stats.max_health);
        Self {
            id,
            name: name.into(),
            stats,
            position,
            kind,
            effects: ActiveEffects::new(),
            knockback_deceleration: super::constants::KNOCKBACK_DECELERATION,
            invincibility_remaining: 0.0,
            knockback_velocity: Vec2::ZERO,
            is_dead: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, UnitKind::Player { .. })
    }

    pub fn enemy_profile(&self) -> Option<&EnemyProfile> {
        match &self.kind {
            UnitKind::Enemy(profile) => Some(profile),
            UnitKind::Player { .. } => None,
        }
    }

    pub fn health_percent(&self) -> f32 {
        if self.stats.max_health > 0.0 {
            self.stats.health / self.stats.max_health
        } else {
            0.0
        }
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Speed after every Slow effect is applied multiplicatively.
    pub fn current_speed(&self) -> f32 {
        effects::modified_speed(self.stats.speed, &self.effects)
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility_remaining > 0.0
    }

    pub fn invincibility_remaining(&self) -> f32 {
        self.invincibility_remaining
    }

    /// Start (or restart) an invincibility window. Negative durations clamp to zero.
    pub fn set_invincible(&mut self, duration: f32) {
        if self.is_dead {
            return;
        }
        self.invincibility_remaining = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    }

    pub fn knockback_velocity(&self) -> Vec2 {
        self.knockback_velocity
    }

    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            position: self.position,
            health: self.stats.health,
            max_health: self.stats.max_health,
            attack: self.stats.attack,
            crit_rate: self.stats.crit_rate,
            crit_damage: self.stats.crit_damage,
            is_dead: self.is_dead,
            is_player: self.is_player(),
        }
    }

    /// Subtract `amount` from health and return what was actually removed.
    ///
    /// No-op on dead or invincible units. Reaching zero health kills the unit
    /// exactly once: the death event is queued first, then the death hook for
    /// the unit's side runs (game over for the player, loot for enemies).
    pub fn take_damage(&mut self, amount: f32, source: Option<UnitId>, ctx: &mut CombatContext) -> f32 {
        if self.is_dead || self.is_invincible() || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }

        let before = self.stats.health;
        self.stats.health = (self.stats.health - amount).max(0.0);
        let dealt = before - self.stats.health;

        if self.stats.health <= 0.0 {
            self.die(source, ctx);
        }

        debug_assert!(self.stats.health >= 0.0 && self.stats.health <= self.stats.max_health);
        dealt
    }

    /// Restore health up to max. Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.stats.health;
        self.stats.health = (self.stats.health + amount).min(self.stats.max_health);
        self.stats.health - before
    }

    /// Overwrite health, clamped to `[0, max_health]`. Ignored on dead units.
    ///
    /// Used when restoring saved state; it never triggers death.
    pub fn set_health(&mut self, value: f32) {
        if self.is_dead || !value.is_finite() {
            return;
        }
        self.stats.health = value.clamp(0.0, self.stats.max_health);
    }

    /// Replace the knockback velocity with `direction * force`.
    pub fn apply_knockback(&mut self, direction: Vec2, force: f32) {
        if self.is_dead || !force.is_finite() || force <= 0.0 {
            return;
        }
        self.knockback_velocity = direction.normalize_or_zero() * force;
    }

    /// Move toward `point` by at most `max_step`, never overshooting.
    pub fn move_toward(&mut self, point: Vec2, max_step: f32) {
        if self.is_dead || max_step <= 0.0 {
            return;
        }
        let offset = point - self.position;
        let distance = offset.length();
        if distance <= max_step {
            self.position = point;
        } else {
            self.position += offset / distance * max_step;
        }
    }

    /// Move directly away from `point` by `step`.
    pub fn move_away_from(&mut self, point: Vec2, step: f32) {
        if self.is_dead || step <= 0.0 {
            return;
        }
        self.position += (self.position - point).normalize_or_zero() * step;
    }

    /// Advance one simulation step: invincibility, knockback, status effects.
    ///
    /// Does nothing once the unit is dead.
    pub fn tick(&mut self, dt: f32, ctx: &mut CombatContext) {
        if self.is_dead {
            return;
        }

        count_down(&mut self.invincibility_remaining, dt);
        self.update_knockback(dt);
        effects::advance_effects(self, dt, ctx);
    }

    fn update_knockback(&mut self, dt: f32) {
        let speed = self.knockback_velocity.length();
        if speed <= 0.0 {
            return;
        }

        // Displace with the current velocity first, then decelerate.
        self.position += self.knockback_velocity * dt;

        let reduced = speed - self.knockback_deceleration * dt;
        if reduced <= 0.0 {
            self.knockback_velocity = Vec2::ZERO;
        } else {
            self.knockback_velocity *= reduced / speed;
        }
    }

    pub fn has_effect(&self, kind: StatusEffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn effect(&self, kind: StatusEffectKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    /// Remove the effect of `kind`, if present.
    pub fn remove_effect(&mut self, kind: StatusEffectKind, events: &mut CombatEvents) -> bool {
        let Some(index) = self.effects.iter().position(|e| e.kind == kind) else {
            return false;
        };
        self.effects.remove(index);
        events.push(CombatEvent::EffectRemoved {
            target: self.id,
            kind,
            reason: EffectRemovalReason::Cleared,
        });
        true
    }

    /// Remove every effect, oldest first.
    pub fn clear_all_effects(&mut self, events: &mut CombatEvents) {
        for effect in self.effects.drain(..) {
            events.push(CombatEvent::EffectRemoved {
                target: self.id,
                kind: effect.kind,
                reason: EffectRemovalReason::Cleared,
            });
        }
    }

    fn die(&mut self, killer: Option<UnitId>, ctx: &mut CombatContext) {
        if self.is_dead {
            return;
        }
        self.is_dead = true;
        self.knockback_velocity = Vec2::ZERO;
        self.invincibility_remaining = 0.0;

        info!("{} {} died", self.name, self.id);
        ctx.events.push(CombatEvent::UnitDied {
            unit: self.id,
            name: self.name.clone(),
            killer,
        });

        match &self.kind {
            UnitKind::Player { .. } => {
                ctx.events.push(CombatEvent::GameOver { player: self.id });
            }
            UnitKind::Enemy(profile) => {
                let drops = loot::roll_loot(profile, ctx.rng);
                debug!("{} dropped {} reward(s)", self.name, drops.len());
                for drop in drops {
                    ctx.rewards.grant(self.id, &drop);
                    ctx.events.push(CombatEvent::LootDropped { unit: self.id, drop });
                }
            }
        }
    }
}
