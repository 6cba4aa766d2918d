#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects the nearest enemy in range for every ready unit.

use orbital_defence_core::{EnemyId, EnemyView, UnitId, UnitTarget, UnitView, Vec2};

/// Unit targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct UnitTargeting {
    unit_workspace: Vec<UnitWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
}

impl UnitTargeting {
    /// Creates a new unit targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes targets for every ready unit in the provided snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. An enemy qualifies when its distance is strictly below
    /// the unit's effective range; among equally distant enemies the one
    /// listed first in the enemy view wins.
    pub fn handle(&mut self, units: &UnitView, enemies: &EnemyView, out: &mut Vec<UnitTarget>) {
        out.clear();

        if units.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_unit_workspace(units);
        if self.unit_workspace.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);

        for unit in &self.unit_workspace {
            let mut best: Option<(EnemyId, f32)> = None;

            for candidate in &self.enemy_workspace {
                let distance = unit.position.distance(candidate.position);
                if distance >= unit.range {
                    continue;
                }

                match best {
                    Some((_, closest)) if distance >= closest => {}
                    _ => best = Some((candidate.id, distance)),
                }
            }

            if let Some((enemy, distance)) = best {
                out.push(UnitTarget {
                    unit: unit.id,
                    enemy,
                    distance,
                });
            }
        }
    }

    fn prepare_unit_workspace(&mut self, units: &UnitView) {
        self.unit_workspace.clear();
        self.unit_workspace.reserve(units.len());

        for snapshot in units.iter().filter(|snapshot| snapshot.ready) {
            self.unit_workspace.push(UnitWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range: snapshot.range,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct UnitWorkspace {
    id: UnitId,
    position: Vec2,
    range: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
}
