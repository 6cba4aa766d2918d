//! Authoritative state of the units placed around the tower.

use std::{collections::BTreeMap, time::Duration};

use orbital_defence_core::{UnitId, UnitKind, UpgradeLevels, Vec2};

/// Clearance kept between a new unit and the tower edge.
pub(crate) const TOWER_CLEARANCE: f32 = 20.0;

/// Clearance kept between the footprints of two units.
pub(crate) const UNIT_SPACING: f32 = 10.0;

/// Unit stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct PlacedUnit {
    pub(crate) id: UnitId,
    pub(crate) kind: UnitKind,
    pub(crate) position: Vec2,
    pub(crate) hp: i32,
    pub(crate) max_hp: i32,
    pub(crate) cooldown: Duration,
}

impl PlacedUnit {
    /// Reports whether the unit accrued enough time to fire.
    pub(crate) fn ready(&self, upgrades: &UpgradeLevels) -> bool {
        self.cooldown >= fire_interval(self.kind, upgrades)
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, PlacedUnit>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty unit registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, kind: UnitKind, position: Vec2, hp: i32) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            PlacedUnit {
                id,
                kind,
                position,
                hp,
                max_hp: kind.archetype().hit_points,
                cooldown: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_unit_id = UnitId::new(0);
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut PlacedUnit> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PlacedUnit> {
        self.entries.values()
    }

    pub(crate) fn accumulate(&mut self, dt: Duration) {
        for unit in self.entries.values_mut() {
            unit.cooldown = unit.cooldown.saturating_add(dt);
        }
    }

    /// Reports whether a unit of `kind` at `position` would overlap an existing footprint.
    pub(crate) fn crowds(&self, kind: UnitKind, position: Vec2) -> bool {
        let size = kind.archetype().size;
        self.entries.values().any(|unit| {
            let other = unit.kind.archetype().size;
            unit.position.distance(position) < other + size + UNIT_SPACING
        })
    }
}

/// Targeting range of `kind` with the range upgrade applied.
pub(crate) fn effective_range(kind: UnitKind, upgrades: &UpgradeLevels) -> f32 {
    (f64::from(kind.archetype().range) * upgrades.range_multiplier()) as f32
}

/// Minimum time between shots of `kind` with the fire rate upgrade applied.
pub(crate) fn fire_interval(kind: UnitKind, upgrades: &UpgradeLevels) -> Duration {
    kind.archetype()
        .fire_interval
        .mul_f64(upgrades.fire_interval_multiplier())
}

/// Projectile damage of `kind` with the damage upgrade applied.
pub(crate) fn projectile_damage(kind: UnitKind, upgrades: &UpgradeLevels) -> u32 {
    let scaled = (f64::from(kind.archetype().damage) * upgrades.damage_multiplier()).round();
    scaled.clamp(0.0, f64::from(u32::MAX)) as u32
}
