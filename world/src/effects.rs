//! Queue of damage effects that land after a delay in simulated time.

use std::time::Duration;

use orbital_defence_core::EnemyId;

/// Parameters shared by every hop of a chain lightning strike.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ChainParams {
    pub(crate) max_hops: u32,
    pub(crate) falloff: f64,
    pub(crate) range: f32,
    pub(crate) delay: Duration,
}

impl ChainParams {
    /// Damage dealt by the hop with the provided one-based index.
    pub(crate) fn hop_damage(&self, base_damage: u32, hop: u32) -> u32 {
        let exponent = i32::try_from(hop.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = (f64::from(base_damage) * self.falloff.powi(exponent)).round();
        if scaled <= 0.0 {
            0
        } else {
            scaled.min(f64::from(u32::MAX)) as u32
        }
    }
}

/// Pending chain lightning hop.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ChainHop {
    pub(crate) target: EnemyId,
    pub(crate) base_damage: u32,
    pub(crate) hop: u32,
    pub(crate) params: ChainParams,
    pub(crate) visited: Vec<EnemyId>,
    pub(crate) due: Duration,
}

impl ChainHop {
    pub(crate) fn damage(&self) -> u32 {
        self.params.hop_damage(self.base_damage, self.hop)
    }

    pub(crate) fn is_last(&self) -> bool {
        self.hop >= self.params.max_hops
    }
}

/// Scheduled effects ordered by due time, then by scheduling order.
#[derive(Debug, Default)]
pub(crate) struct EffectQueue {
    pending: Vec<ChainHop>,
}

impl EffectQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&mut self, hop: ChainHop) {
        let index = self.pending.partition_point(|queued| queued.due <= hop.due);
        self.pending.insert(index, hop);
    }

    /// Moves every hop due at or before `now` into `out`.
    pub(crate) fn drain_due(&mut self, now: Duration, out: &mut Vec<ChainHop>) {
        let due = self.pending.partition_point(|queued| queued.due <= now);
        out.extend(self.pending.drain(..due));
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
