//! Loot rolls and reward delivery
//!
//! An enemy's death rolls its drop table, then adds category bonuses:
//! humanoids always carry some currency and every enemy sheds monster
//! essence. Results are handed to a [`RewardSink`], the
//! inventory/economy collaborator that lives outside the simulation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::constants::*;
use super::enemy_presets::{DropEntry, EnemyCategory, EnemyProfile};
use super::rng::GameRng;
use super::unit::UnitId;

/// Drop table ids with this value pay out as currency rather than an item.
pub const CURRENCY_ITEM_ID: &str = "currency";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LootDrop {
    Item { item_id: String, quantity: u32 },
    Currency { amount: u32 },
}

/// Receives rewards produced by enemy deaths.
pub trait RewardSink: Send + Sync {
    fn grant(&mut self, source: UnitId, drop: &LootDrop);
}

/// Discards every reward.
#[derive(Debug, Default)]
pub struct DiscardRewards;

impl RewardSink for DiscardRewards {
    fn grant(&mut self, _source: UnitId, _drop: &LootDrop) {}
}

/// Keeps running totals of everything granted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardLedger {
    pub currency: u64,
    pub items: HashMap<String, u32>,
    pub drops_recorded: usize,
}

impl RewardLedger {
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.items.get(item_id).copied().unwrap_or(0)
    }
}

impl RewardSink for RewardLedger {
    fn grant(&mut self, _source: UnitId, drop: &LootDrop) {
        match drop {
            LootDrop::Currency { amount } => self.currency += u64::from(*amount),
            LootDrop::Item { item_id, quantity } => {
                *self.items.entry(item_id.clone()).or_insert(0) += quantity;
            }
        }
        self.drops_recorded += 1;
    }
}

fn roll_entry(entry: &DropEntry, rng: &mut GameRng) -> Option<LootDrop> {
    if !rng.roll(entry.chance) {
        return None;
    }
    let quantity = rng.random_u32_inclusive(entry.min_quantity, entry.max_quantity);
    if quantity == 0 {
        return None;
    }
    Some(if entry.item_id == CURRENCY_ITEM_ID {
        LootDrop::Currency { amount: quantity }
    } else {
        LootDrop::Item {
            item_id: entry.item_id.clone(),
            quantity,
        }
    })
}

/// Roll everything an enemy drops on death, in table order then bonuses.
pub fn roll_loot(profile: &EnemyProfile, rng: &mut GameRng) -> Vec<LootDrop> {
    let mut drops: Vec<LootDrop> = profile
        .drops
        .iter()
        .filter_map(|entry| roll_entry(entry, rng))
        .collect();

    if profile.category == EnemyCategory::Humanoid {
        drops.push(LootDrop::Currency {
            amount: rng.random_u32_inclusive(HUMANOID_CURRENCY_MIN, HUMANOID_CURRENCY_MAX),
        });
    }
    drops.push(LootDrop::Item {
        item_id: ESSENCE_ITEM_ID.to_string(),
        quantity: rng.random_u32_inclusive(ESSENCE_MIN, ESSENCE_MAX),
    });

    drops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::enemy_profile;

    #[test]
    fn test_guaranteed_entry_always_drops() {
        let mut profile = enemy_profile(EnemyCategory::Animal);
        profile.drops = vec![DropEntry {
            item_id: "essence_common".into(),
            chance: 1.0,
            min_quantity: 2,
            max_quantity: 5,
        }];
        let mut rng = GameRng::from_seed(11);
        for _ in 0..20 {
            let drops = roll_loot(&profile, &mut rng);
            match &drops[0] {
                LootDrop::Item { item_id, quantity } => {
                    assert_eq!(item_id, "essence_common");
                    assert!((2..=5).contains(quantity));
                }
                other => panic!("unexpected drop {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_chance_entry_never_drops() {
        let mut profile = enemy_profile(EnemyCategory::Plant);
        profile.drops = vec![DropEntry {
            item_id: "weapon_rare".into(),
            chance: 0.0,
            min_quantity: 1,
            max_quantity: 1,
        }];
        let mut rng = GameRng::from_seed(3);
        for _ in 0..50 {
            let drops = roll_loot(&profile, &mut rng);
            assert_eq!(drops.len(), 1, "only the essence bonus should drop");
        }
    }

    #[test]
    fn test_humanoid_bonus_currency_in_range() {
        let profile = enemy_profile(EnemyCategory::Humanoid);
        let mut rng = GameRng::from_seed(8);
        for _ in 0..50 {
            let drops = roll_loot(&profile, &mut rng);
            let amount = drops
                .iter()
                .find_map(|drop| match drop {
                    LootDrop::Currency { amount } => Some(*amount),
                    _ => None,
                })
                .expect("humanoids always drop currency");
            assert!((HUMANOID_CURRENCY_MIN..=HUMANOID_CURRENCY_MAX).contains(&amount));
            assert!(matches!(drops.last(), Some(LootDrop::Item { .. })));
        }
    }

    #[test]
    fn test_currency_entry_pays_currency() {
        let mut profile = enemy_profile(EnemyCategory::Humanoid);
        profile.drops = vec![DropEntry {
            item_id: CURRENCY_ITEM_ID.into(),
            chance: 1.0,
            min_quantity: 50,
            max_quantity: 50,
        }];
        let mut rng = GameRng::from_seed(1);
        let drops = roll_loot(&profile, &mut rng);
        assert_eq!(drops[0], LootDrop::Currency { amount: 50 });
    }

    #[test]
    fn test_ledger_accumulates() {
        let mut ledger = RewardLedger::default();
        ledger.grant(UnitId(1), &LootDrop::Currency { amount: 12 });
        ledger.grant(UnitId(2), &LootDrop::Currency { amount: 3 });
        ledger.grant(
            UnitId(2),
            &LootDrop::Item {
                item_id: ESSENCE_ITEM_ID.into(),
                quantity: 4,
            },
        );
        assert_eq!(ledger.currency, 15);
        assert_eq!(ledger.item_count(ESSENCE_ITEM_ID), 4);
        assert_eq!(ledger.drops_recorded, 3);
    }
}
