//! Enemy AI state machine
//!
//! One [`EnemyBrain`] per enemy. Each tick the brain re-evaluates its state in
//! strict priority order, first match wins regardless of the current state:
//!
//! 1. **Enrage**: elite-tier at or below the enrage threshold, not yet enraged.
//!    The stat boost is permanent; the state itself is left on the next tick.
//! 2. **Flee**: at or below the flee threshold, not elite
//! 3. **Attack**: target within attack range
//! 4. **Chase**: target within detection range
//! 5. **Patrol**: fallback, unless already idling or patrolling
//!
//! The brain reads its target only through a [`UnitSnapshot`] and only ever
//! mutates its own unit. Attacks come back as a [`DamageIntent`] for the
//! simulation to resolve.

use std::f32::consts::TAU;

use bevy::log::{debug, info};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::events::{CombatEvent, CombatEvents};

use super::config::AiConfig;
use super::count_down;
use super::damage::{DamageCategory, DamageIntent};
use super::enemy_presets::EnemyProfile;
use super::rng::GameRng;
use super::unit::{Unit, UnitId, UnitSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Patrol,
    Chase,
    Attack,
    Flee,
    Enrage,
}

#[derive(Debug, Clone)]
pub struct EnemyBrain {
    pub unit: UnitId,
    config: AiConfig,
    state: AiState,
    patrol_target: Option<Vec2>,
    patrol_wait: f32,
    attack_cooldown: f32,
    enraged: bool,
}

impl EnemyBrain {
    pub fn new(unit: UnitId, config: AiConfig) -> Self {
        Self {
            unit,
            config,
            state: AiState::Idle,
            patrol_target: None,
            patrol_wait: 0.0,
            attack_cooldown: 0.0,
            enraged: false,
        }
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn is_enraged(&self) -> bool {
        self.enraged
    }

    pub fn patrol_target(&self) -> Option<Vec2> {
        self.patrol_target
    }

    pub fn is_patrol_waiting(&self) -> bool {
        self.patrol_wait > 0.0
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    /// Run one decision tick. Returns an attack to resolve against the target, if any.
    pub fn update(
        &mut self,
        enemy: &mut Unit,
        target: Option<&UnitSnapshot>,
        dt: f32,
        rng: &mut GameRng,
        events: &mut CombatEvents,
    ) -> Option<DamageIntent> {
        if enemy.is_dead() {
            return None;
        }
        let profile = enemy.enemy_profile()?.clone();
        let target = target.filter(|t| !t.is_dead);

        count_down(&mut self.attack_cooldown, dt);
        count_down(&mut self.patrol_wait, dt);

        if let Some(next) = self.select_state(enemy, &profile, target) {
            self.change_state(enemy, next, events);
        }

        match self.state {
            AiState::Idle => {
                if rng.roll(self.config.idle_wake_chance) {
                    self.change_state(enemy, AiState::Patrol, events);
                }
                None
            }
            AiState::Patrol => {
                self.patrol(enemy, &profile, dt, rng);
                None
            }
            AiState::Chase => {
                if let Some(target) = target {
                    enemy.move_toward(target.position, enemy.current_speed() * dt);
                }
                None
            }
            AiState::Attack => target.and_then(|t| self.try_attack(enemy, &profile, t)),
            AiState::Flee => {
                if let Some(target) = target {
                    enemy.move_away_from(target.position, enemy.current_speed() * dt);
                    if enemy.distance_to(target.position) > profile.ai.detect_range * 2.0 {
                        self.change_state(enemy, AiState::Patrol, events);
                    }
                }
                None
            }
            AiState::Enrage => {
                let target = target?;
                if enemy.distance_to(target.position) > profile.ai.attack_range {
                    enemy.move_toward(target.position, enemy.current_speed() * dt);
                    None
                } else {
                    self.try_attack(enemy, &profile, target)
                }
            }
        }
    }

    /// The state the priority rules pick this tick, or `None` to stay put.
    pub fn select_state(&self, enemy: &Unit, profile: &EnemyProfile, target: Option<&UnitSnapshot>) -> Option<AiState> {
        let health = enemy.health_percent();

        let distance = target.map(|t| enemy.distance_to(t.position));

        let wants = if !self.enraged && self.should_enrage(profile, health) {
            Some(AiState::Enrage)
        } else if !profile.is_elite && health <= profile.ai.flee_health_percent {
            Some(AiState::Flee)
        } else if distance.is_some_and(|d| d <= profile.ai.attack_range) {
            Some(AiState::Attack)
        } else if distance.is_some_and(|d| d <= profile.ai.detect_range) {
            Some(AiState::Chase)
        } else if matches!(self.state, AiState::Idle | AiState::Patrol) {
            None
        } else {
            Some(AiState::Patrol)
        };

        wants.filter(|state| *state != self.state)
    }

    fn should_enrage(&self, profile: &EnemyProfile, health: f32) -> bool {
        profile.is_elite_tier()
            && profile
                .ai
                .enrage_health_percent
                .is_some_and(|threshold| health <= threshold)
    }

    fn change_state(&mut self, enemy: &mut Unit, next: AiState, events: &mut CombatEvents) {
        if next == self.state {
            return;
        }
        let previous = self.state;
        self.state = next;
        debug!("{} {}: {:?} -> {:?}", enemy.name, enemy.id, previous, next);

        match next {
            AiState::Patrol => {
                self.patrol_wait = self.config.patrol_wait;
                self.patrol_target = None;
            }
            AiState::Enrage => self.enter_enrage(enemy, events),
            _ => {}
        }

        events.push(CombatEvent::AiStateChanged {
            unit: enemy.id,
            from: previous,
            to: next,
        });
    }

    fn enter_enrage(&mut self, enemy: &mut Unit, events: &mut CombatEvents) {
        if self.enraged {
            return;
        }
        self.enraged = true;
        enemy.stats.attack *= self.config.enrage_attack_multiplier;
        enemy.stats.speed *= self.config.enrage_speed_multiplier;
        info!("{} {} is enraged!", enemy.name, enemy.id);
        events.push(CombatEvent::Enraged { unit: enemy.id });
    }

    fn patrol(&mut self, enemy: &mut Unit, profile: &EnemyProfile, dt: f32, rng: &mut GameRng) {
        if self.is_patrol_waiting() {
            return;
        }

        let destination = match self.patrol_target {
            Some(point) => point,
            None => {
                let angle = rng.random_range(0.0, TAU);
                let radius = rng.random_range(0.0, profile.ai.patrol_range);
                let point = profile.spawn_position + Vec2::new(angle.cos(), angle.sin()) * radius;
                self.patrol_target = Some(point);
                point
            }
        };

        enemy.move_toward(destination, enemy.current_speed() * dt);

        if enemy.distance_to(destination) < self.config.arrival_epsilon {
            self.patrol_wait = self.config.patrol_wait;
            self.patrol_target = None;
        }
    }

    fn try_attack(&mut self, enemy: &Unit, profile: &EnemyProfile, target: &UnitSnapshot) -> Option<DamageIntent> {
        if self.attack_cooldown > 0.0 || enemy.distance_to(target.position) > profile.ai.attack_range {
            return None;
        }
        self.attack_cooldown = self.config.attack_interval;
        debug!("{} {} attacks {}", enemy.name, enemy.id, target.id);

        Some(
            DamageIntent::new(enemy.stats.attack, DamageCategory::Physical)
                .with_effects(profile.on_hit_effects.iter().cloned())
                .from_source(enemy.id),
        )
    }
}
