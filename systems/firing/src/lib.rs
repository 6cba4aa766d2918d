#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns target assignments into projectile launches.
//!
//! A unit fires when its cooldown has elapsed and its assigned enemy still
//! sits strictly inside its range. Each unit launches at most one projectile
//! per tick, and launches are emitted in unit id order so replays stay stable.

use orbital_defence_core::{Command, UnitTarget, UnitView, WaveSnapshot};

/// Unit firing system that queues launch commands for ready units.
#[derive(Debug, Default)]
pub struct UnitFiring {
    assignments: Vec<UnitTarget>,
}

impl UnitFiring {
    /// Creates a firing system with an empty assignment buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` for every ready unit with a target in range.
    ///
    /// A fallen tower silences every unit.
    pub fn handle(
        &mut self,
        wave: &WaveSnapshot,
        units: &UnitView,
        unit_targets: &[UnitTarget],
        out: &mut Vec<Command>,
    ) {
        if wave.game_over {
            return;
        }

        self.assignments.clear();
        self.assignments.extend_from_slice(unit_targets);
        self.assignments.sort_by_key(|target| target.unit);
        self.assignments.dedup_by_key(|target| target.unit);

        for unit in units.iter().filter(|unit| unit.ready) {
            let Ok(index) = self
                .assignments
                .binary_search_by_key(&unit.id, |target| target.unit)
            else {
                continue;
            };
            let target = self.assignments[index];
            if target.distance < unit.range {
                out.push(Command::FireProjectile {
                    unit: unit.id,
                    target: target.enemy,
                });
            }
        }
    }
}
