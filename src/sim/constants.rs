//! Combat Constants
//!
//! Centralized location for the tuning numbers used throughout the simulation.
//! The config structs in this crate default to these values; tests and
//! scenarios override them through the structs, never by editing call sites.

// ============================================================================
// Damage
// ============================================================================

/// Crit multiplier used when the attacker is unknown or has no crit damage stat.
pub const DEFAULT_CRIT_MULTIPLIER: f32 = 1.5;

/// Constant in the defense mitigation formula: `defense / (defense + K)`.
pub const DEFENSE_COEFFICIENT: f32 = 100.0;

/// Grace window granted to the player after an enemy attack lands.
pub const HIT_INVINCIBILITY_TIME: f32 = 0.5;

/// Linear knockback deceleration in units/s².
pub const KNOCKBACK_DECELERATION: f32 = 500.0;

// ============================================================================
// Status Effects
// ============================================================================

/// Maximum number of concurrent status effects on one unit.
pub const MAX_STATUS_EFFECTS: usize = 5;

// ============================================================================
// Player
// ============================================================================

/// Dodge cooldown in seconds, counted from the moment the dodge starts.
pub const DODGE_COOLDOWN: f32 = 1.5;

/// Total distance covered by one dodge.
pub const DODGE_DISTANCE: f32 = 150.0;

/// Invincibility window (and dodge duration) in seconds.
pub const DODGE_INVINCIBILITY_TIME: f32 = 0.3;

/// Time for a full reload (Tech archetype).
pub const RELOAD_TIME: f32 = 1.5;

/// Magazine size (Tech archetype).
pub const MAX_AMMO: u32 = 30;

/// Mana restored per second while meditating (Magic archetype).
pub const MEDITATE_MANA_PER_SEC: f32 = 10.0;

/// Mana cost of a Magic basic attack.
pub const BASIC_ATTACK_MANA_COST: f32 = 5.0;

/// How long the player stays in Hurt after losing health.
pub const HURT_STAGGER_TIME: f32 = 0.2;

// ============================================================================
// Enemy AI
// ============================================================================

/// Pause at each patrol point before picking the next one.
pub const PATROL_WAIT_TIME: f32 = 2.0;

/// Minimum time between two enemy attacks.
pub const ATTACK_INTERVAL: f32 = 1.5;

/// Distance under which a patrol point counts as reached.
pub const PATROL_ARRIVAL_EPSILON: f32 = 10.0;

/// Per-tick chance for an idle enemy to start patrolling.
pub const IDLE_WAKE_CHANCE: f32 = 0.01;

/// Elite max-health multiplier applied at creation.
pub const ELITE_HEALTH_MULTIPLIER: f32 = 2.0;

/// Elite attack multiplier applied at creation.
pub const ELITE_ATTACK_MULTIPLIER: f32 = 1.5;

/// Attack multiplier applied once on entering Enrage.
pub const ENRAGE_ATTACK_MULTIPLIER: f32 = 1.5;

/// Speed multiplier applied once on entering Enrage.
pub const ENRAGE_SPEED_MULTIPLIER: f32 = 1.2;

// ============================================================================
// Loot
// ============================================================================

/// Currency dropped by humanoid enemies, inclusive range.
pub const HUMANOID_CURRENCY_MIN: u32 = 10;
pub const HUMANOID_CURRENCY_MAX: u32 = 29;

/// Monster essence dropped by every enemy, inclusive range.
pub const ESSENCE_MIN: u32 = 1;
pub const ESSENCE_MAX: u32 = 5;

/// Item id used for the essence drop.
pub const ESSENCE_ITEM_ID: &str = "monster_essence";
