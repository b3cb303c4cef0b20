//! Player ability & resource controller
//!
//! Owns the player's state machine, dodge, ability cooldowns and the
//! archetype-specific resource loop:
//!
//! - **Tech** fires ammo and recovers it in bulk with an uninterruptible reload
//! - **Magic** spends mana and recovers it by meditating, which any movement cancels
//!
//! Every rejected action (on cooldown, out of resource, gated by
//! [`PlayerController::can_act`]) is a silent no-op with a `debug!` line.
//! Actions that hit something return an [`AbilityCast`] for the simulation to
//! resolve; the controller itself only ever touches the player unit.

use bevy::log::{debug, info};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::events::{CombatEvent, CombatEvents};

use super::abilities::{AbilityCast, AbilitySlot, ArchetypeKit, BASIC_ATTACK_ID, SKILL_1_ID, SKILL_2_ID, ULTIMATE_ID};
use super::config::PlayerConfig;
use super::count_down;
use super::input::{InputAction, InputSource};
use super::unit::{BaseStats, Unit, UnitId, UnitKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Firearms, ammo and reloads
    Tech,
    /// Spells, mana and meditation
    Magic,
}

impl Archetype {
    pub fn display_name(&self) -> &'static str {
        match self {
            Archetype::Tech => "Scavenger",
            Archetype::Magic => "Mystic",
        }
    }

    pub fn base_stats(&self) -> BaseStats {
        match self {
            Archetype::Tech => BaseStats::new(100.0, 15.0, 10.0, 150.0, 0.1, 1.5),
            Archetype::Magic => BaseStats::new(80.0, 20.0, 5.0, 130.0, 0.15, 1.8),
        }
    }

    pub fn max_mana(&self) -> Option<f32> {
        match self {
            Archetype::Tech => None,
            Archetype::Magic => Some(100.0),
        }
    }

    /// Build the player unit for this archetype.
    pub fn build_unit(&self, id: UnitId, position: Vec2) -> Unit {
        Unit::new(
            id,
            self.display_name(),
            self.base_stats(),
            position,
            UnitKind::Player { archetype: *self },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    Idle,
    Moving,
    Attacking,
    Dodging,
    Reloading,
    Meditating,
    Hurt,
    Dead,
}

/// The archetype's recovery loop. One variant per archetype, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchetypeResource {
    Ammo {
        current: u32,
        max: u32,
        reload_remaining: f32,
    },
    Mana {
        current: f32,
        max: f32,
        meditating: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Dodge {
    direction: Vec2,
    remaining: f32,
}

/// Ability controller for the single player unit.
#[derive(Debug, Clone)]
pub struct PlayerController {
    pub unit: UnitId,
    archetype: Archetype,
    config: PlayerConfig,
    state: PlayerState,
    facing: Vec2,
    basic_attack: AbilitySlot,
    skills: Vec<AbilitySlot>,
    dodge_cooldown: f32,
    dodge: Option<Dodge>,
    resource: ArchetypeResource,
    hurt_remaining: f32,
    last_health: f32,
}

impl PlayerController {
    pub fn new(unit: &Unit, archetype: Archetype, kit: &ArchetypeKit, config: PlayerConfig) -> Self {
        let resource = match archetype.max_mana() {
            Some(max) => ArchetypeResource::Mana {
                current: max,
                max,
                meditating: false,
            },
            None => ArchetypeResource::Ammo {
                current: config.max_ammo,
                max: config.max_ammo,
                reload_remaining: 0.0,
            },
        };

        let mut skills: Vec<AbilitySlot> = kit
            .skills
            .iter()
            .map(|(id, skill)| AbilitySlot::new(id.clone(), skill.clone()))
            .collect();
        skills.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            unit: unit.id,
            archetype,
            config,
            state: PlayerState::Idle,
            facing: Vec2::X,
            basic_attack: AbilitySlot::new(BASIC_ATTACK_ID, kit.basic_attack.clone()),
            skills,
            dodge_cooldown: 0.0,
            dodge: None,
            resource,
            hurt_remaining: 0.0,
            last_health: unit.stats.health,
        }
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn resource(&self) -> &ArchetypeResource {
        &self.resource
    }

    pub fn is_dodging(&self) -> bool {
        self.dodge.is_some()
    }

    pub fn dodge_cooldown_remaining(&self) -> f32 {
        self.dodge_cooldown
    }

    pub fn is_reloading(&self) -> bool {
        matches!(self.resource, ArchetypeResource::Ammo { reload_remaining, .. } if reload_remaining > 0.0)
    }

    pub fn is_meditating(&self) -> bool {
        matches!(self.resource, ArchetypeResource::Mana { meditating: true, .. })
    }

    pub fn ammo(&self) -> Option<u32> {
        match self.resource {
            ArchetypeResource::Ammo { current, .. } => Some(current),
            ArchetypeResource::Mana { .. } => None,
        }
    }

    pub fn mana(&self) -> Option<f32> {
        match self.resource {
            ArchetypeResource::Mana { current, .. } => Some(current),
            ArchetypeResource::Ammo { .. } => None,
        }
    }

    /// Ammo as a fraction of the magazine. Archetypes without ammo read as full.
    pub fn ammo_percent(&self) -> f32 {
        match self.resource {
            ArchetypeResource::Ammo { current, max, .. } if max > 0 => current as f32 / max as f32,
            _ => 1.0,
        }
    }

    /// Mana as a fraction of the pool. Archetypes without mana read as full.
    pub fn mana_percent(&self) -> f32 {
        match self.resource {
            ArchetypeResource::Mana { current, max, .. } if max > 0.0 => current / max,
            _ => 1.0,
        }
    }

    pub fn basic_attack(&self) -> &AbilitySlot {
        &self.basic_attack
    }

    pub fn skill(&self, id: &str) -> Option<&AbilitySlot> {
        if id == BASIC_ATTACK_ID {
            return Some(&self.basic_attack);
        }
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn skills(&self) -> impl Iterator<Item = &AbilitySlot> {
        std::iter::once(&self.basic_attack).chain(self.skills.iter())
    }

    fn slot_mut(&mut self, id: &str) -> Option<&mut AbilitySlot> {
        if id == BASIC_ATTACK_ID {
            return Some(&mut self.basic_attack);
        }
        self.skills.iter_mut().find(|s| s.id == id)
    }

    /// Not dead, not dodging, not reloading, not meditating, and the game allows input.
    pub fn can_act(&self, unit: &Unit, controls_enabled: bool) -> bool {
        controls_enabled
            && !unit.is_dead()
            && self.dodge.is_none()
            && self.state != PlayerState::Reloading
            && self.state != PlayerState::Meditating
    }

    // ==========================================================================
    // Restore
    // ==========================================================================

    /// Overwrite mana (clamped to the pool). Ignored for Tech.
    pub fn set_mana(&mut self, value: f32) {
        if let ArchetypeResource::Mana { current, max, .. } = &mut self.resource {
            if value.is_finite() {
                *current = value.clamp(0.0, *max);
            }
        }
    }

    /// Overwrite ammo (clamped to the magazine). Ignored for Magic.
    pub fn set_ammo(&mut self, value: u32) {
        if let ArchetypeResource::Ammo { current, max, .. } = &mut self.resource {
            *current = value.min(*max);
        }
    }

    pub fn set_cooldown(&mut self, skill_id: &str, remaining: f32) -> bool {
        match self.slot_mut(skill_id) {
            Some(slot) => {
                slot.set_cooldown_remaining(remaining);
                true
            }
            None => false,
        }
    }

    pub fn set_dodge_cooldown(&mut self, remaining: f32) {
        self.dodge_cooldown = if remaining.is_finite() { remaining.max(0.0) } else { 0.0 };
    }

    // ==========================================================================
    // Per-tick update
    // ==========================================================================

    /// Advance timers. Call after the unit itself has ticked.
    pub fn update(&mut self, unit: &mut Unit, dt: f32) {
        if unit.is_dead() {
            self.enter_dead();
            return;
        }

        self.basic_attack.tick(dt);
        for slot in &mut self.skills {
            if slot.tick(dt) {
                debug!("{} is ready", slot.id);
            }
        }

        count_down(&mut self.dodge_cooldown, dt);
        self.update_dodge(unit, dt);
        self.update_reload(dt);
        self.update_meditation(dt);
        self.update_hurt(unit, dt);
    }

    fn enter_dead(&mut self) {
        if self.state == PlayerState::Dead {
            return;
        }
        self.state = PlayerState::Dead;
        self.dodge = None;
        match &mut self.resource {
            ArchetypeResource::Ammo { reload_remaining, .. } => *reload_remaining = 0.0,
            ArchetypeResource::Mana { meditating, .. } => *meditating = false,
        }
        info!("Player died");
    }

    fn update_dodge(&mut self, unit: &mut Unit, dt: f32) {
        let Some(dodge) = self.dodge.as_mut() else {
            return;
        };

        let step = dt.min(dodge.remaining);
        unit.position += dodge.direction * self.config.dodge_speed() * step;
        count_down(&mut dodge.remaining, dt);

        if dodge.remaining <= 0.0 {
            self.dodge = None;
            self.state = PlayerState::Idle;
            debug!("Dodge finished");
        }
    }

    fn update_reload(&mut self, dt: f32) {
        let ArchetypeResource::Ammo { current, max, reload_remaining } = &mut self.resource else {
            return;
        };
        if *reload_remaining <= 0.0 {
            return;
        }
        count_down(reload_remaining, dt);
        if *reload_remaining <= 0.0 {
            *current = *max;
            self.state = PlayerState::Idle;
            info!("Reload complete ({}/{})", max, max);
        }
    }

    fn update_meditation(&mut self, dt: f32) {
        if let ArchetypeResource::Mana { current, max, meditating: true } = &mut self.resource {
            *current = (*current + self.config.meditate_rate * dt).min(*max);
        }
    }

    fn update_hurt(&mut self, unit: &Unit, dt: f32) {
        let health = unit.stats.health;
        if health < self.last_health
            && matches!(self.state, PlayerState::Idle | PlayerState::Moving | PlayerState::Attacking)
        {
            self.state = PlayerState::Hurt;
            self.hurt_remaining = self.config.hurt_stagger;
        } else if self.state == PlayerState::Hurt {
            count_down(&mut self.hurt_remaining, dt);
            if self.hurt_remaining <= 0.0 {
                self.state = PlayerState::Idle;
            }
        }
        self.last_health = health;
    }

    // ==========================================================================
    // Actions
    // ==========================================================================

    /// Move along `direction * current_speed * dt`. Zero input settles into Idle.
    pub fn move_by(&mut self, unit: &mut Unit, direction: Vec2, dt: f32, controls_enabled: bool) {
        if !self.can_act(unit, controls_enabled) {
            return;
        }

        if direction.length_squared() > 0.0 {
            let direction = direction.normalize_or_zero();
            unit.position += direction * unit.current_speed() * dt;
            self.facing = direction;
            self.state = PlayerState::Moving;
        } else if self.state != PlayerState::Hurt {
            self.state = PlayerState::Idle;
        }
    }

    /// Start a dodge toward `direction`, or toward the facing when it is zero.
    pub fn dodge(&mut self, unit: &mut Unit, direction: Vec2, controls_enabled: bool) -> bool {
        if !self.can_act(unit, controls_enabled) {
            return false;
        }
        if self.dodge_cooldown > 0.0 {
            debug!("Dodge on cooldown ({:.2}s)", self.dodge_cooldown);
            return false;
        }

        let direction = if direction.length_squared() > 0.0 {
            direction.normalize_or_zero()
        } else {
            self.facing
        };

        self.dodge = Some(Dodge {
            direction,
            remaining: self.config.dodge_invincibility,
        });
        self.dodge_cooldown = self.config.dodge_cooldown;
        self.state = PlayerState::Dodging;
        unit.set_invincible(self.config.dodge_invincibility);

        debug!("Dodging toward ({:.2}, {:.2})", direction.x, direction.y);
        true
    }

    /// Basic attack. Tech spends one round; Magic spends mana.
    pub fn attack(&mut self, unit: &mut Unit, controls_enabled: bool, events: &mut CombatEvents) -> Option<AbilityCast> {
        if !self.can_act(unit, controls_enabled) {
            return None;
        }
        if !self.basic_attack.is_ready() {
            return None;
        }

        match &mut self.resource {
            ArchetypeResource::Ammo { current, .. } => {
                if *current == 0 {
                    debug!("Out of ammo, reload needed");
                    return None;
                }
                *current -= 1;
            }
            ArchetypeResource::Mana { current, .. } => {
                let cost = self.config.basic_attack_mana_cost;
                if *current < cost {
                    debug!("Not enough mana for a basic attack ({:.0}/{:.0})", current, cost);
                    return None;
                }
                *current = (*current - cost).max(0.0);
            }
        }

        self.basic_attack.start_cooldown();
        self.state = PlayerState::Attacking;
        events.push(CombatEvent::SkillUsed {
            unit: unit.id,
            skill_id: BASIC_ATTACK_ID.to_string(),
        });

        Some(AbilityCast::from_slot(
            &self.basic_attack,
            unit.id,
            unit.position,
            self.facing,
            unit.stats.attack,
        ))
    }

    /// Use a skill by id. Mana is checked before anything is spent.
    pub fn use_skill(
        &mut self,
        unit: &mut Unit,
        skill_id: &str,
        controls_enabled: bool,
        events: &mut CombatEvents,
    ) -> Option<AbilityCast> {
        if !self.can_act(unit, controls_enabled) {
            return None;
        }

        let Some(index) = self.skills.iter().position(|s| s.id == skill_id) else {
            debug!("Unknown skill {}", skill_id);
            return None;
        };
        if !self.skills[index].is_ready() {
            debug!("{} not ready ({:.2}s)", skill_id, self.skills[index].cooldown_remaining());
            return None;
        }

        let cost = self.skills[index].config.mana_cost;
        if let ArchetypeResource::Mana { current, .. } = &mut self.resource {
            if cost > 0.0 {
                if *current < cost {
                    debug!("Not enough mana for {} ({:.0}/{:.0})", skill_id, current, cost);
                    return None;
                }
                *current = (*current - cost).max(0.0);
            }
        }

        let slot = &mut self.skills[index];
        slot.start_cooldown();
        self.state = PlayerState::Attacking;
        info!("Player uses {} ({})", slot.config.name, slot.id);
        events.push(CombatEvent::SkillUsed {
            unit: unit.id,
            skill_id: slot.id.clone(),
        });

        Some(AbilityCast::from_slot(
            slot,
            unit.id,
            unit.position,
            self.facing,
            unit.stats.attack,
        ))
    }

    pub fn use_ultimate(&mut self, unit: &mut Unit, controls_enabled: bool, events: &mut CombatEvents) -> Option<AbilityCast> {
        self.use_skill(unit, ULTIMATE_ID, controls_enabled, events)
    }

    /// Tech only. Ignored with a full magazine or while already reloading.
    pub fn reload(&mut self, unit: &Unit, controls_enabled: bool) -> bool {
        if !self.can_act(unit, controls_enabled) {
            return false;
        }
        let reload_time = self.config.reload_time;
        let ArchetypeResource::Ammo { current, max, reload_remaining } = &mut self.resource else {
            return false;
        };
        if *reload_remaining > 0.0 || *current >= *max {
            return false;
        }

        if reload_time <= 0.0 {
            *current = *max;
            return true;
        }
        *reload_remaining = reload_time;
        self.state = PlayerState::Reloading;
        debug!("Reloading");
        true
    }

    /// Magic only. Starts meditating until released or cancelled by movement.
    pub fn meditate(&mut self, unit: &Unit, controls_enabled: bool) -> bool {
        if !self.can_act(unit, controls_enabled) {
            return false;
        }
        let ArchetypeResource::Mana { meditating, .. } = &mut self.resource else {
            return false;
        };
        *meditating = true;
        self.state = PlayerState::Meditating;
        debug!("Meditating");
        true
    }

    pub fn stop_meditate(&mut self) {
        if let ArchetypeResource::Mana { meditating, .. } = &mut self.resource {
            *meditating = false;
        }
        if self.state == PlayerState::Meditating {
            self.state = PlayerState::Idle;
        }
    }

    /// Map one frame of input onto actions, in order: move, dodge, attack,
    /// skills, reload/meditate, stop meditating.
    pub fn handle_input(
        &mut self,
        unit: &mut Unit,
        input: &dyn InputSource,
        dt: f32,
        controls_enabled: bool,
        events: &mut CombatEvents,
    ) -> SmallVec<[AbilityCast; 4]> {
        let mut casts = SmallVec::new();
        if unit.is_dead() {
            return casts;
        }

        let movement = input.movement();
        if self.is_meditating() && movement.length_squared() > 0.0 {
            self.stop_meditate();
        }

        self.move_by(unit, movement, dt, controls_enabled);

        if input.just_pressed(InputAction::Dodge) {
            self.dodge(unit, movement, controls_enabled);
        }

        if input.is_pressed(InputAction::Attack) {
            casts.extend(self.attack(unit, controls_enabled, events));
        }

        let skill_bindings = [
            (InputAction::Skill1, SKILL_1_ID),
            (InputAction::Skill2, SKILL_2_ID),
            (InputAction::Ultimate, ULTIMATE_ID),
        ];
        for (action, skill_id) in skill_bindings {
            if input.just_pressed(action) {
                casts.extend(self.use_skill(unit, skill_id, controls_enabled, events));
            }
        }

        if input.just_pressed(InputAction::Reload) {
            match self.archetype {
                Archetype::Tech => {
                    self.reload(unit, controls_enabled);
                }
                Archetype::Magic => {
                    self.meditate(unit, controls_enabled);
                }
            }
        }

        if input.just_released(InputAction::Reload) && self.is_meditating() {
            self.stop_meditate();
        }

        casts
    }
}
