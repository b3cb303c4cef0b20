//! Unit registry and world queries

use bevy::math::Vec2;

use super::unit::{Unit, UnitId, UnitSnapshot};

/// Read-only world lookups the controllers depend on.
pub trait WorldQuery {
    /// The unit enemies hunt: the living player, if any.
    fn current_target(&self) -> Option<UnitSnapshot>;
    /// Living units whose distance to `center` is at most `radius`, nearest first.
    fn units_within(&self, center: Vec2, radius: f32) -> Vec<UnitSnapshot>;
}

/// Arena of units addressed by [`UnitId`]. Ids are never reused.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    slots: Vec<Option<Unit>>,
    player: Option<UnitId>,
}

impl UnitRegistry {
    /// Insert a unit built from its freshly assigned id.
    pub fn spawn(&mut self, build: impl FnOnce(UnitId) -> Unit) -> UnitId {
        let id = UnitId(self.slots.len() as u32);
        let unit = build(id);
        debug_assert_eq!(unit.id, id, "unit must carry the id it was built with");
        if unit.is_player() {
            self.player = Some(id);
        }
        self.slots.push(Some(unit));
        id
    }

    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.slots.get_mut(id.0 as usize)?.take();
        if self.player == Some(id) {
            self.player = None;
        }
        unit
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    pub fn player_id(&self) -> Option<UnitId> {
        self.player
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.slots.iter_mut().flatten()
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Unit> {
        self.iter().filter(|u| !u.is_player())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance between two registered units.
    pub fn distance(&self, a: UnitId, b: UnitId) -> Option<f32> {
        Some(self.get(a)?.position.distance(self.get(b)?.position))
    }

    /// Whether `b` is within `range` of `a`. False if either is missing.
    pub fn is_in_range(&self, a: UnitId, b: UnitId, range: f32) -> bool {
        self.distance(a, b).is_some_and(|d| d <= range)
    }

    /// Nearest living enemy within `range` of `point`.
    pub fn nearest_enemy(&self, point: Vec2, range: f32) -> Option<UnitSnapshot> {
        self.units_within(point, range).into_iter().find(|s| !s.is_player)
    }
}

impl WorldQuery for UnitRegistry {
    fn current_target(&self) -> Option<UnitSnapshot> {
        let player = self.get(self.player?)?;
        player.is_alive().then(|| player.snapshot())
    }

    fn units_within(&self, center: Vec2, radius: f32) -> Vec<UnitSnapshot> {
        let mut found: Vec<UnitSnapshot> = self
            .iter()
            .filter(|u| u.is_alive() && u.distance_to(center) <= radius)
            .map(Unit::snapshot)
            .collect();
        found.sort_by(|a, b| a.distance_to(center).total_cmp(&b.distance_to(center)));
        found
    }
}
