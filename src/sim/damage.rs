//! Damage pipeline
//!
//! [`resolve_damage`] turns a [`DamageIntent`] into a [`DamageOutcome`]:
//!
//! 1. Roll the crit (intent override, else attacker crit rate, else no crit)
//! 2. Apply defense mitigation `base * (1 - d / (d + K))` unless the category is True
//! 3. Round; any positive base deals at least 1
//! 4. Subtract through [`Unit::take_damage`] (invincible targets block the hit)
//! 5. Attach the intent's status effects to a still-living target, even when
//!    invincibility blocked the damage
//! 6. Push the target away from the attacker when the intent carries knockback
//!
//! Invalid intents (no target, dead target, non-finite numbers) resolve to an
//! empty outcome instead of failing.

use bevy::log::debug;
use serde::{Deserialize, Serialize};

use crate::combat::events::CombatEvent;

use super::effects::{self, StatusEffect};
use super::unit::{Unit, UnitId, UnitSnapshot};
use super::CombatContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageCategory {
    Physical,
    Magical,
    /// Ignores defense
    True,
}

/// A request to damage one target.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageIntent {
    pub base_damage: f32,
    pub category: DamageCategory,
    /// Overrides the attacker's crit rate. `Some(0.0)` can never crit.
    pub crit_chance: Option<f32>,
    pub effects: Vec<StatusEffect>,
    /// Knockback force; zero for none
    pub knockback: f32,
    /// Attribution when the attacker snapshot is not supplied
    pub source: Option<UnitId>,
}

impl DamageIntent {
    pub fn new(base_damage: f32, category: DamageCategory) -> Self {
        Self {
            base_damage,
            category,
            crit_chance: None,
            effects: Vec::new(),
            knockback: 0.0,
            source: None,
        }
    }

    pub fn with_crit_chance(mut self, chance: f32) -> Self {
        self.crit_chance = Some(chance);
        self
    }

    pub fn with_effect(mut self, effect: StatusEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = StatusEffect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn with_knockback(mut self, force: f32) -> Self {
        self.knockback = force;
        self
    }

    pub fn from_source(mut self, source: UnitId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_well_formed(&self) -> bool {
        self.base_damage.is_finite()
            && self.base_damage >= 0.0
            && self.knockback.is_finite()
            && self.knockback >= 0.0
            && self.crit_chance.map_or(true, f32::is_finite)
    }
}

/// What actually happened to the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageOutcome {
    /// Integer damage subtracted from the target's health
    pub final_damage: u32,
    pub is_crit: bool,
    /// Target was invincible when the hit landed
    pub is_blocked: bool,
    pub effects_applied: Vec<StatusEffect>,
    pub target_died: bool,
}

impl DamageOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn landed(&self) -> bool {
        self.final_damage > 0
    }
}

/// `base * (1 - d / (d + K))`; negative defense counts as zero.
pub fn mitigate(base: f32, defense: f32, coefficient: f32) -> f32 {
    let defense = defense.max(0.0);
    if defense + coefficient <= 0.0 {
        return base;
    }
    base * (1.0 - defense / (defense + coefficient))
}

/// Round `raw` to an integer, with a floor of 1 whenever `base` was positive.
pub fn finalize_damage(raw: f32, base: f32) -> u32 {
    if base <= 0.0 {
        return 0;
    }
    raw.round().max(1.0) as u32
}

/// Resolve one damage intent against one target.
pub fn resolve_damage(
    attacker: Option<&UnitSnapshot>,
    target: Option<&mut Unit>,
    intent: &DamageIntent,
    ctx: &mut CombatContext,
) -> DamageOutcome {
    let Some(target) = target else {
        debug!("damage intent without a target ignored");
        return DamageOutcome::none();
    };
    if target.is_dead() {
        debug!("damage intent against dead {} ignored", target.name);
        return DamageOutcome::none();
    }
    if !intent.is_well_formed() {
        debug!("malformed damage intent against {} ignored", target.name);
        return DamageOutcome::none();
    }

    let crit_chance = intent
        .crit_chance
        .or_else(|| attacker.map(|a| a.crit_rate))
        .unwrap_or(0.0);
    let is_crit = crit_chance > 0.0 && ctx.rng.roll(crit_chance);

    let mut raw = intent.base_damage;
    if is_crit {
        raw *= attacker
            .map(|a| a.crit_damage)
            .unwrap_or(ctx.config.default_crit_multiplier);
    }
    if intent.category != DamageCategory::True {
        raw = mitigate(raw, target.stats.defense, ctx.config.defense_coefficient);
    }
    let damage = finalize_damage(raw, intent.base_damage);

    let attacker_id = attacker.map(|a| a.id).or(intent.source);
    let is_blocked = target.is_invincible();
    let dealt = if is_blocked {
        0.0
    } else {
        target.take_damage(damage as f32, attacker_id, ctx)
    };
    let final_damage = dealt.round() as u32;

    let mut effects_applied = Vec::new();
    if target.is_alive() {
        for effect in &intent.effects {
            let result =
                effects::apply_effect(target, effect, ctx.config.max_status_effects, ctx.events);
            if result.applied() {
                effects_applied.push(effect.clone());
            }
        }
    }

    if intent.knockback > 0.0 && target.is_alive() {
        if let Some(attacker) = attacker.filter(|a| !a.is_dead) {
            let direction = (target.position - attacker.position).normalize_or_zero();
            target.apply_knockback(direction, intent.knockback);
        }
    }

    ctx.events.push(CombatEvent::DamageResolved {
        attacker: attacker_id,
        target: target.id,
        damage: final_damage,
        is_crit,
        category: intent.category,
        blocked: is_blocked,
    });

    DamageOutcome {
        final_damage,
        is_crit,
        is_blocked,
        effects_applied,
        target_died: target.is_dead(),
    }
}

/// Heal a target. Returns the amount restored; zero for missing or dead targets.
pub fn heal_unit(target: Option<&mut Unit>, amount: f32) -> f32 {
    target.map_or(0.0, |unit| unit.heal(amount))
}
