//! Simulation core
//!
//! Everything that decides combat outcomes lives under this module and is
//! plain Rust with no ECS scheduling: units, status effects, the damage
//! pipeline, the player controller and the enemy brains. [`Simulation`] owns
//! all of it and advances it one tick at a time:
//!
//! 1. Every live unit ticks (invincibility, knockback, status effects)
//! 2. The player controller updates its timers, then reads input; casts resolve
//! 3. Each enemy brain decides against a snapshot of the player
//! 4. Enemy attacks resolve against the player
//! 5. Dead enemies are despawned
//!
//! Outbound [`CombatEvent`]s accumulate in order and are drained by the caller
//! once per tick. The bevy integration in [`crate::combat`] does that draining.

pub mod abilities;
pub mod config;
pub mod constants;
pub mod damage;
pub mod effects;
pub mod enemy_ai;
pub mod enemy_presets;
pub mod input;
pub mod loot;
pub mod player;
pub mod registry;
pub mod rng;
pub mod snapshot;
pub mod unit;

#[cfg(test)]
pub(crate) mod test_support;

use bevy::log::{debug, info, warn};
use bevy::math::Vec2;
use bevy::prelude::Resource;
use smallvec::SmallVec;

use crate::combat::events::{CombatEvent, CombatEvents};

use abilities::{AbilityCast, SkillDefinitions, Targeting};
use config::{CombatConfig, SimulationConfig};
use damage::{DamageIntent, DamageOutcome};
use effects::{EffectApplication, StatusEffect};
use enemy_ai::EnemyBrain;
use enemy_presets::{EnemyDefinitions, EnemyPreset, RoomType};
use input::InputSource;
use loot::{DiscardRewards, RewardSink};
use player::{Archetype, PlayerController};
use registry::{UnitRegistry, WorldQuery};
use rng::GameRng;
use snapshot::{CooldownSnapshot, EnemySnapshot, PlayerSnapshot, SimulationSnapshot};
use unit::{Unit, UnitId};

/// Remaining time below this counts as elapsed.
pub(crate) const TIMER_EPSILON: f32 = 1e-4;

/// Count a timer down by `dt`, snapping to zero once it is (almost) spent.
pub(crate) fn count_down(timer: &mut f32, dt: f32) {
    *timer -= dt;
    if *timer <= TIMER_EPSILON {
        *timer = 0.0;
    }
}

/// The collaborators a unit needs while taking damage or dying.
pub struct CombatContext<'a> {
    pub config: &'a CombatConfig,
    pub rng: &'a mut GameRng,
    pub events: &'a mut CombatEvents,
    pub rewards: &'a mut dyn RewardSink,
}

impl<'a> CombatContext<'a> {
    pub fn new(
        config: &'a CombatConfig,
        rng: &'a mut GameRng,
        events: &'a mut CombatEvents,
        rewards: &'a mut dyn RewardSink,
    ) -> Self {
        Self {
            config,
            rng,
            events,
            rewards,
        }
    }
}

/// The whole combat simulation for one room.
#[derive(Resource)]
pub struct Simulation {
    config: SimulationConfig,
    skills: SkillDefinitions,
    enemies: EnemyDefinitions,
    registry: UnitRegistry,
    player: Option<PlayerController>,
    brains: Vec<EnemyBrain>,
    rng: GameRng,
    events: CombatEvents,
    rewards: Box<dyn RewardSink>,
    spawn_counter: u32,
    /// Input gate owned by the surrounding game state (pause, dialogs, cutscenes)
    pub controls_enabled: bool,
    elapsed: f32,
    game_over: bool,
}

impl Simulation {
    pub fn new(
        config: SimulationConfig,
        skills: SkillDefinitions,
        enemies: EnemyDefinitions,
        rng: GameRng,
    ) -> Self {
        Self {
            config,
            skills,
            enemies,
            registry: UnitRegistry::default(),
            player: None,
            brains: Vec::new(),
            rng,
            events: CombatEvents::default(),
            rewards: Box::new(DiscardRewards),
            spawn_counter: 0,
            controls_enabled: true,
            elapsed: 0.0,
            game_over: false,
        }
    }

    /// Route loot to `sink` instead of discarding it.
    pub fn with_rewards(mut self, sink: Box<dyn RewardSink>) -> Self {
        self.rewards = sink;
        self
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn enemy_definitions(&self) -> &EnemyDefinitions {
        &self.enemies
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.registry.get(id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.registry.get_mut(id)
    }

    pub fn player_id(&self) -> Option<UnitId> {
        self.player.as_ref().map(|c| c.unit)
    }

    pub fn player_unit(&self) -> Option<&Unit> {
        self.registry.get(self.player_id()?)
    }

    pub fn player_controller(&self) -> Option<&PlayerController> {
        self.player.as_ref()
    }

    pub fn brain(&self, id: UnitId) -> Option<&EnemyBrain> {
        self.brains.iter().find(|b| b.unit == id)
    }

    pub fn brains(&self) -> impl Iterator<Item = &EnemyBrain> {
        self.brains.iter()
    }

    pub fn live_enemy_count(&self) -> usize {
        self.registry.enemies().filter(|u| u.is_alive()).count()
    }

    pub fn events(&self) -> &CombatEvents {
        &self.events
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    // ==========================================================================
    // Spawning
    // ==========================================================================

    /// Spawn the player. There is only ever one; a second call returns the existing id.
    pub fn spawn_player(&mut self, archetype: Archetype, position: Vec2) -> Option<UnitId> {
        if let Some(existing) = self.player_id() {
            warn!("Player already spawned as {}", existing);
            return Some(existing);
        }
        let Some(kit) = self.skills.kit(archetype).cloned() else {
            warn!("No skill kit for {:?}", archetype);
            return None;
        };

        let deceleration = self.config.combat.knockback_deceleration;
        let id = self.registry.spawn(|id| {
            let mut unit = archetype.build_unit(id, position);
            unit.knockback_deceleration = deceleration;
            unit
        });

        let unit = self.registry.get(id)?;
        self.player = Some(PlayerController::new(unit, archetype, &kit, self.config.player.clone()));
        self.events.push(CombatEvent::UnitSpawned {
            unit: id,
            name: unit.name.clone(),
        });
        info!("Spawned {} ({:?}) at ({:.0}, {:.0})", unit.name, archetype, position.x, position.y);
        Some(id)
    }

    /// Spawn an enemy by preset id. Unknown ids are ignored.
    pub fn spawn_enemy(&mut self, preset_id: &str, position: Vec2) -> Option<UnitId> {
        let Some(preset) = self.enemies.get(preset_id).cloned() else {
            warn!("Unknown enemy preset: {}", preset_id);
            return None;
        };
        Some(self.spawn_enemy_from(&preset, position))
    }

    pub fn spawn_enemy_from(&mut self, preset: &EnemyPreset, position: Vec2) -> UnitId {
        let instance = self.spawn_counter;
        self.spawn_counter += 1;

        let ai_config = self.config.ai.clone();
        let deceleration = self.config.combat.knockback_deceleration;
        let id = self.registry.spawn(|id| {
            let mut unit = preset.build_unit(id, instance, position, &ai_config);
            unit.knockback_deceleration = deceleration;
            unit
        });
        self.brains.push(EnemyBrain::new(id, ai_config));
        self.events.push(CombatEvent::UnitSpawned {
            unit: id,
            name: preset.name.clone(),
        });
        info!("Spawned {} {} at ({:.0}, {:.0})", preset.name, id, position.x, position.y);
        id
    }

    /// Fill a room: one random preset from the room's pool per position.
    pub fn spawn_room(&mut self, room: RoomType, positions: &[Vec2]) -> Vec<UnitId> {
        let pool = self.enemies.enemies_for_room(room).to_vec();
        if pool.is_empty() {
            debug!("{:?} rooms have no enemies", room);
            return Vec::new();
        }
        positions
            .iter()
            .filter_map(|position| {
                let pick = self.rng.random_u32_inclusive(0, pool.len() as u32 - 1) as usize;
                self.spawn_enemy(&pool[pick], *position)
            })
            .collect()
    }

    // ==========================================================================
    // Tick
    // ==========================================================================

    /// Advance the whole simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32, input: &dyn InputSource) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;

        {
            let mut ctx = CombatContext::new(
                &self.config.combat,
                &mut self.rng,
                &mut self.events,
                &mut *self.rewards,
            );
            for unit in self.registry.iter_mut() {
                unit.tick(dt, &mut ctx);
            }
        }

        // Enemies decide against where the player stood at the start of the tick
        let target = self.registry.current_target();

        let controls = self.controls_enabled && !self.game_over;
        let mut casts: SmallVec<[AbilityCast; 4]> = SmallVec::new();
        if let Some(controller) = self.player.as_mut() {
            if let Some(unit) = self.registry.get_mut(controller.unit) {
                controller.update(unit, dt);
                casts = controller.handle_input(unit, input, dt, controls, &mut self.events);
            }
        }
        for cast in &casts {
            self.execute_cast(cast);
        }

        let mut attacks: Vec<(UnitId, DamageIntent)> = Vec::new();
        for brain in &mut self.brains {
            let Some(enemy) = self.registry.get_mut(brain.unit) else {
                continue;
            };
            if let Some(intent) = brain.update(enemy, target.as_ref(), dt, &mut self.rng, &mut self.events) {
                attacks.push((brain.unit, intent));
            }
        }
        if let Some(target) = target {
            for (attacker, intent) in attacks {
                let outcome = self.resolve_damage_between(Some(attacker), target.id, &intent);
                if outcome.landed() && !outcome.target_died {
                    let grace = self.config.combat.hit_invincibility;
                    if let Some(player) = self.registry.get_mut(target.id) {
                        player.set_invincible(grace);
                    }
                }
            }
        }

        self.despawn_dead_enemies();

        if !self.game_over && self.player_unit().is_some_and(Unit::is_dead) {
            self.game_over = true;
            self.controls_enabled = false;
            info!("Game over at {:.2}s", self.elapsed);
        }
    }

    fn despawn_dead_enemies(&mut self) {
        let dead: Vec<UnitId> = self
            .registry
            .enemies()
            .filter(|u| u.is_dead())
            .map(|u| u.id)
            .collect();
        for id in dead {
            self.brains.retain(|b| b.unit != id);
            self.registry.remove(id);
            debug!("Despawned {}", id);
        }
    }

    // ==========================================================================
    // Combat operations
    // ==========================================================================

    /// Resolve one intent from `attacker` (if still present) against `target`.
    pub fn resolve_damage_between(
        &mut self,
        attacker: Option<UnitId>,
        target: UnitId,
        intent: &DamageIntent,
    ) -> DamageOutcome {
        let attacker = attacker.and_then(|id| self.registry.get(id)).map(Unit::snapshot);
        let mut ctx = CombatContext::new(
            &self.config.combat,
            &mut self.rng,
            &mut self.events,
            &mut *self.rewards,
        );
        damage::resolve_damage(attacker.as_ref(), self.registry.get_mut(target), intent, &mut ctx)
    }

    /// Apply `intent` to every living unit within `radius` of `center`, nearest first.
    pub fn resolve_area_damage(
        &mut self,
        attacker: Option<UnitId>,
        center: Vec2,
        radius: f32,
        intent: &DamageIntent,
        exclude: &[UnitId],
    ) -> Vec<(UnitId, DamageOutcome)> {
        let victims: Vec<UnitId> = self
            .registry
            .units_within(center, radius)
            .into_iter()
            .map(|s| s.id)
            .filter(|id| !exclude.contains(id))
            .collect();
        victims
            .into_iter()
            .map(|id| (id, self.resolve_damage_between(attacker, id, intent)))
            .collect()
    }

    pub fn heal(&mut self, target: UnitId, amount: f32) -> f32 {
        damage::heal_unit(self.registry.get_mut(target), amount)
    }

    pub fn apply_effect(&mut self, target: UnitId, effect: &StatusEffect) -> EffectApplication {
        let capacity = self.config.combat.max_status_effects;
        match self.registry.get_mut(target) {
            Some(unit) => effects::apply_effect(unit, effect, capacity, &mut self.events),
            None => EffectApplication::Rejected,
        }
    }

    fn execute_cast(&mut self, cast: &AbilityCast) -> Vec<(UnitId, DamageOutcome)> {
        match cast.targeting {
            Targeting::Nearest => match self.registry.nearest_enemy(cast.origin, cast.range) {
                Some(target) => {
                    let outcome = self.resolve_damage_between(Some(cast.caster), target.id, &cast.intent);
                    vec![(target.id, outcome)]
                }
                None => {
                    debug!("{} found no target within {:.0}", cast.skill_id, cast.range);
                    Vec::new()
                }
            },
            Targeting::Area => self.resolve_area_damage(
                Some(cast.caster),
                cast.origin,
                cast.range,
                &cast.intent,
                &[cast.caster],
            ),
        }
    }

    // ==========================================================================
    // Direct player actions
    // ==========================================================================

    fn with_player<R>(
        &mut self,
        action: impl FnOnce(&mut PlayerController, &mut Unit, bool, &mut CombatEvents) -> R,
    ) -> Option<R> {
        let controls = self.controls_enabled && !self.game_over;
        let controller = self.player.as_mut()?;
        let unit = self.registry.get_mut(controller.unit)?;
        Some(action(controller, unit, controls, &mut self.events))
    }

    fn run_cast(&mut self, cast: Option<AbilityCast>) -> Option<Vec<(UnitId, DamageOutcome)>> {
        cast.map(|cast| self.execute_cast(&cast))
    }

    /// Basic attack. Returns the hits, or `None` if the attack was rejected.
    pub fn player_attack(&mut self) -> Option<Vec<(UnitId, DamageOutcome)>> {
        let cast = self.with_player(|c, u, controls, events| c.attack(u, controls, events)).flatten();
        self.run_cast(cast)
    }

    /// Use a skill by id. Returns the hits, or `None` if the skill was rejected.
    pub fn player_use_skill(&mut self, skill_id: &str) -> Option<Vec<(UnitId, DamageOutcome)>> {
        let cast = self
            .with_player(|c, u, controls, events| c.use_skill(u, skill_id, controls, events))
            .flatten();
        self.run_cast(cast)
    }

    pub fn player_use_ultimate(&mut self) -> Option<Vec<(UnitId, DamageOutcome)>> {
        self.player_use_skill(abilities::ULTIMATE_ID)
    }

    pub fn player_dodge(&mut self, direction: Vec2) -> bool {
        self.with_player(|c, u, controls, _| c.dodge(u, direction, controls))
            .unwrap_or(false)
    }

    pub fn player_reload(&mut self) -> bool {
        self.with_player(|c, u, controls, _| c.reload(u, controls))
            .unwrap_or(false)
    }

    pub fn player_meditate(&mut self) -> bool {
        self.with_player(|c, u, controls, _| c.meditate(u, controls))
            .unwrap_or(false)
    }

    pub fn player_stop_meditate(&mut self) {
        self.with_player(|c, _, _, _| c.stop_meditate());
    }

    /// Set the player's ammo (Tech) directly, e.g. when restoring a save.
    pub fn set_player_ammo(&mut self, ammo: u32) {
        if let Some(controller) = self.player.as_mut() {
            controller.set_ammo(ammo);
        }
    }

    /// Set the player's mana (Magic) directly, e.g. when restoring a save.
    pub fn set_player_mana(&mut self, mana: f32) {
        if let Some(controller) = self.player.as_mut() {
            controller.set_mana(mana);
        }
    }

    // ==========================================================================
    // Snapshots
    // ==========================================================================

    pub fn snapshot(&self) -> SimulationSnapshot {
        let player = self.player.as_ref().and_then(|controller| {
            let unit = self.registry.get(controller.unit)?;
            Some(PlayerSnapshot {
                archetype: controller.archetype(),
                health: unit.stats.health,
                max_health: unit.stats.max_health,
                position: unit.position.to_array(),
                mana: controller.mana(),
                ammo: controller.ammo(),
                dodge_cooldown: controller.dodge_cooldown_remaining(),
                cooldowns: controller
                    .skills()
                    .map(|slot| CooldownSnapshot {
                        skill_id: slot.id.clone(),
                        remaining: slot.cooldown_remaining(),
                    })
                    .collect(),
            })
        });

        let enemies = self
            .brains
            .iter()
            .filter_map(|brain| {
                let unit = self.registry.get(brain.unit)?;
                let profile = unit.enemy_profile()?;
                Some(EnemySnapshot {
                    unit: unit.id,
                    preset_id: profile.preset_id.clone(),
                    name: unit.name.clone(),
                    health: unit.stats.health,
                    max_health: unit.stats.max_health,
                    position: unit.position.to_array(),
                    ai_state: brain.state(),
                    enraged: brain.is_enraged(),
                })
            })
            .collect();

        SimulationSnapshot {
            elapsed: self.elapsed,
            player,
            enemies,
        }
    }

    /// Restore the player's persisted state. Returns false without a matching player.
    pub fn restore_player(&mut self, snapshot: &PlayerSnapshot) -> bool {
        let Some(controller) = self.player.as_mut() else {
            return false;
        };
        if controller.archetype() != snapshot.archetype {
            warn!(
                "Snapshot is for {:?}, player is {:?}",
                snapshot.archetype,
                controller.archetype()
            );
            return false;
        }
        let Some(unit) = self.registry.get_mut(controller.unit) else {
            return false;
        };

        unit.set_health(snapshot.health);
        unit.position = Vec2::from_array(snapshot.position);
        if let Some(mana) = snapshot.mana {
            controller.set_mana(mana);
        }
        if let Some(ammo) = snapshot.ammo {
            controller.set_ammo(ammo);
        }
        controller.set_dodge_cooldown(snapshot.dodge_cooldown);
        for cooldown in &snapshot.cooldowns {
            controller.set_cooldown(&cooldown.skill_id, cooldown.remaining);
        }
        true
    }
}
