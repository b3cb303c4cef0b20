//! Combat logging
//!
//! Records every drained [`CombatEvent`] as a readable line plus structured
//! data for post-run analysis, and exports the whole run as JSON.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sim::damage::DamageCategory;
use crate::sim::effects::StatusEffectKind;
use crate::sim::loot::LootDrop;
use crate::sim::snapshot::SimulationSnapshot;
use crate::sim::unit::UnitId;

use super::events::CombatEvent;

/// Name used for damage with no attacking unit (status effect ticks).
pub const ENVIRONMENT_SOURCE: &str = "Environment";

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Seconds since the simulation started
    pub timestamp: f32,
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

impl CombatLogEntry {
    /// `[   1.25] message`
    pub fn render(&self) -> String {
        format!("[{:>7.2}] {}", self.timestamp, self.message)
    }
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatLogEventType {
    Spawn,
    Damage,
    /// Damage from a status effect tick
    EffectTick,
    SkillUsed,
    EffectApplied,
    EffectRemoved,
    Death,
    /// AI state changes and enrage
    Behavior,
    Loot,
    /// Scenario start/end and similar
    MatchEvent,
}

/// Machine-readable payload for the entries analysis cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuredEventData {
    Damage {
        source: String,
        target: String,
        amount: u32,
        is_crit: bool,
        category: DamageCategory,
        blocked: bool,
    },
    EffectTick {
        target: String,
        kind: StatusEffectKind,
        amount: u32,
    },
    EffectApplied {
        target: String,
        kind: StatusEffectKind,
        refreshed: bool,
    },
    Death {
        unit: String,
        killer: Option<String>,
    },
    Loot {
        unit: String,
        drop: LootDrop,
    },
}

/// Everything saved next to the entries in a log export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub scenario: String,
    pub outcome: String,
    pub elapsed: f32,
    pub seed: Option<u64>,
    pub final_state: SimulationSnapshot,
}

#[derive(Serialize)]
struct LogExport<'a> {
    metadata: &'a RunMetadata,
    entries: &'a [CombatLogEntry],
}

/// The combat log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation time, stamped onto new entries
    pub match_time: f32,
    names: HashMap<UnitId, String>,
}

impl CombatLog {
    /// Clear the log for a new run
    pub fn clear(&mut self) {
        self.entries.clear();
        self.names.clear();
        self.match_time = 0.0;
    }

    /// Add a plain entry with no structured data
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(&mut self, event_type: CombatLogEventType, message: String, data: Option<StructuredEventData>) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
            data,
        });
    }

    pub fn register_unit(&mut self, unit: UnitId, name: impl Into<String>) {
        self.names.insert(unit, name.into());
    }

    /// Display name of a unit: `Name #id`, or just `#id` if it never spawned here.
    pub fn name_of(&self, unit: UnitId) -> String {
        match self.names.get(&unit) {
            Some(name) => format!("{} {}", name, unit),
            None => unit.to_string(),
        }
    }

    /// Translate one simulation event into a log entry.
    pub fn record(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::UnitSpawned { unit, name } => {
                self.register_unit(*unit, name.clone());
                let message = format!("{} enters the fight", self.name_of(*unit));
                self.log(CombatLogEventType::Spawn, message);
            }
            CombatEvent::DamageResolved {
                attacker,
                target,
                damage,
                is_crit,
                category,
                blocked,
            } => {
                let source = attacker.map_or_else(|| ENVIRONMENT_SOURCE.to_string(), |a| self.name_of(a));
                let target_name = self.name_of(*target);
                let message = if *blocked {
                    format!("{} hits {} but it is invincible", source, target_name)
                } else {
                    format!(
                        "{} hits {} for {} {:?} damage{}",
                        source,
                        target_name,
                        damage,
                        category,
                        if *is_crit { " (CRIT)" } else { "" }
                    )
                };
                let data = StructuredEventData::Damage {
                    source,
                    target: target_name,
                    amount: *damage,
                    is_crit: *is_crit,
                    category: *category,
                    blocked: *blocked,
                };
                self.push(CombatLogEventType::Damage, message, Some(data));
            }
            CombatEvent::EffectTick { target, kind, damage } => {
                let target_name = self.name_of(*target);
                let message = format!("{} takes {} {} damage", target_name, damage, kind.name());
                let data = StructuredEventData::EffectTick {
                    target: target_name,
                    kind: *kind,
                    amount: *damage,
                };
                self.push(CombatLogEventType::EffectTick, message, Some(data));
            }
            CombatEvent::EffectApplied { target, kind, refreshed } => {
                let target_name = self.name_of(*target);
                let verb = if *refreshed { "refreshed on" } else { "applied to" };
                let message = format!("{} {} {}", kind.name(), verb, target_name);
                let data = StructuredEventData::EffectApplied {
                    target: target_name,
                    kind: *kind,
                    refreshed: *refreshed,
                };
                self.push(CombatLogEventType::EffectApplied, message, Some(data));
            }
            CombatEvent::EffectRemoved { target, kind, reason } => {
                let message = format!("{} removed from {} ({:?})", kind.name(), self.name_of(*target), reason);
                self.log(CombatLogEventType::EffectRemoved, message);
            }
            CombatEvent::UnitDied { unit, killer, .. } => {
                let unit_name = self.name_of(*unit);
                let killer_name = killer.map(|k| self.name_of(k));
                let message = match &killer_name {
                    Some(killer) => format!("{} was killed by {}", unit_name, killer),
                    None => format!("{} died", unit_name),
                };
                let data = StructuredEventData::Death {
                    unit: unit_name,
                    killer: killer_name,
                };
                self.push(CombatLogEventType::Death, message, Some(data));
            }
            CombatEvent::SkillUsed { unit, skill_id } => {
                let message = format!("{} uses {}", self.name_of(*unit), skill_id);
                self.log(CombatLogEventType::SkillUsed, message);
            }
            CombatEvent::AiStateChanged { unit, from, to } => {
                let message = format!("{}: {:?} -> {:?}", self.name_of(*unit), from, to);
                self.log(CombatLogEventType::Behavior, message);
            }
            CombatEvent::Enraged { unit } => {
                let message = format!("{} becomes enraged!", self.name_of(*unit));
                self.log(CombatLogEventType::Behavior, message);
            }
            CombatEvent::LootDropped { unit, drop } => {
                let unit_name = self.name_of(*unit);
                let message = match drop {
                    LootDrop::Currency { amount } => format!("{} dropped {} currency", unit_name, amount),
                    LootDrop::Item { item_id, quantity } => {
                        format!("{} dropped {} x{}", unit_name, item_id, quantity)
                    }
                };
                let data = StructuredEventData::Loot {
                    unit: unit_name,
                    drop: drop.clone(),
                };
                self.push(CombatLogEventType::Loot, message, Some(data));
            }
            CombatEvent::GameOver { player } => {
                let message = format!("Game over: {} has fallen", self.name_of(*player));
                self.log(CombatLogEventType::MatchEvent, message);
            }
        }
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Only health-changing events (hits and effect ticks)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::EffectTick
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    fn data(&self) -> impl Iterator<Item = &StructuredEventData> {
        self.entries.iter().filter_map(|e| e.data.as_ref())
    }

    /// Total landed hit damage per source name. Effect ticks are not attributed.
    pub fn damage_by_source(&self) -> HashMap<String, u64> {
        let mut totals = HashMap::new();
        for data in self.data() {
            if let StructuredEventData::Damage { source, amount, blocked: false, .. } = data {
                *totals.entry(source.clone()).or_insert(0) += u64::from(*amount);
            }
        }
        totals
    }

    pub fn total_damage_dealt(&self, source: &str) -> u64 {
        self.damage_by_source().get(source).copied().unwrap_or(0)
    }

    /// Hit and effect tick damage taken by `target`.
    pub fn total_damage_taken(&self, target: &str) -> u64 {
        self.data()
            .map(|data| match data {
                StructuredEventData::Damage { target: t, amount, blocked: false, .. } if t == target => {
                    u64::from(*amount)
                }
                StructuredEventData::EffectTick { target: t, amount, .. } if t == target => u64::from(*amount),
                _ => 0,
            })
            .sum()
    }

    pub fn killing_blows(&self, killer: &str) -> usize {
        self.data()
            .filter(|data| {
                matches!(data, StructuredEventData::Death { killer: Some(k), .. } if k == killer)
            })
            .count()
    }

    /// Fresh applications per effect kind (refreshes excluded).
    pub fn effects_applied_by_kind(&self) -> HashMap<StatusEffectKind, usize> {
        let mut counts = HashMap::new();
        for data in self.data() {
            if let StructuredEventData::EffectApplied { kind, refreshed: false, .. } = data {
                *counts.entry(*kind).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Every entry rendered as a line.
    pub fn render_lines(&self) -> Vec<String> {
        self.entries.iter().map(CombatLogEntry::render).collect()
    }

    // ==========================================================================
    // Export
    // ==========================================================================

    /// Write metadata plus all entries as pretty JSON. Returns the path written.
    ///
    /// Without an explicit path the file goes to `logs/combat_log_<unix secs>.json`.
    pub fn save_to_file(&self, metadata: &RunMetadata, path: Option<&str>) -> Result<String, String> {
        let path = match path {
            Some(path) => path.to_string(),
            None => {
                std::fs::create_dir_all("logs")
                    .map_err(|e| format!("Failed to create logs directory: {}", e))?;
                let stamp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                format!("logs/combat_log_{}.json", stamp)
            }
        };

        let export = LogExport {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| format!("Failed to serialize combat log: {}", e))?;
        std::fs::write(&path, json).map_err(|e| format!("Failed to write {}: {}", path, e))?;

        info!("Combat log saved to {} ({} entries)", path, self.entries.len());
        Ok(path)
    }
}
