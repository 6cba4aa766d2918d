//! Wave quotas and the curves that scale enemies with wave progression.

use crate::{EnemyKind, UpgradeLevels};

/// Every n-th wave spawns a single boss instead of a regular quota.
pub const BOSS_WAVE_INTERVAL: u32 = 10;

const REGULAR_QUOTA_BASE: f64 = 8.0;
const REGULAR_QUOTA_PER_WAVE: f64 = 1.5;
const STAT_GROWTH: f64 = 1.12;
const SPEED_GROWTH_PER_WAVE: f64 = 0.015;
const BOSS_GROWTH: f64 = 1.3;
const COMPLETION_BONUS_BASE: u32 = 50;
const COMPLETION_BONUS_PER_WAVE: u32 = 10;

/// Reports whether the provided wave spawns a boss.
#[must_use]
pub const fn is_boss_wave(wave: u32) -> bool {
    wave > 0 && wave % BOSS_WAVE_INTERVAL == 0
}

/// Number of enemies spawned during the provided wave.
#[must_use]
pub fn wave_quota(wave: u32) -> u32 {
    if is_boss_wave(wave) {
        return 1;
    }
    (REGULAR_QUOTA_BASE + f64::from(wave) * REGULAR_QUOTA_PER_WAVE).floor() as u32
}

/// Multiplier applied to regular enemy hit points and damage.
#[must_use]
pub fn stat_multiplier(wave: u32) -> f64 {
    STAT_GROWTH.powf(f64::from(wave) - 1.0)
}

/// Multiplier applied to regular enemy speed.
#[must_use]
pub fn speed_multiplier(wave: u32) -> f64 {
    1.0 + f64::from(wave) * SPEED_GROWTH_PER_WAVE
}

/// Multiplier applied to every boss statistic except speed and size.
#[must_use]
pub fn boss_multiplier(wave: u32) -> f64 {
    BOSS_GROWTH.powf(f64::from(wave / BOSS_WAVE_INTERVAL))
}

/// Credits granted when a wave is cleared, keyed by the wave that follows it.
#[must_use]
pub const fn completion_bonus(next_wave: u32) -> u32 {
    COMPLETION_BONUS_BASE + next_wave * COMPLETION_BONUS_PER_WAVE
}

/// Selects a regular enemy kind from a uniform roll in `0.0..1.0`.
///
/// The eligible pool widens with the wave number: the roll is stretched over
/// `1 + wave / 4` slots and clamped to the strongest kind, which biases early
/// waves toward the weakest archetypes.
#[must_use]
pub fn regular_kind_for_roll(roll: f64, wave: u32) -> EnemyKind {
    let stretched = (roll * (1.0 + f64::from(wave) / 4.0)).floor();
    let last = EnemyKind::REGULAR.len() - 1;
    let index = if stretched <= 0.0 {
        0
    } else {
        (stretched as usize).min(last)
    };
    EnemyKind::REGULAR[index]
}

/// Fully scaled statistics assigned to a freshly spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Kind of enemy the statistics were derived from.
    pub kind: EnemyKind,
    /// Starting and maximum hit points.
    pub hit_points: i32,
    /// Distance travelled per reference frame.
    pub speed: f32,
    /// Damage dealt to the tower on contact.
    pub damage: u32,
    /// Credits granted when destroyed.
    pub reward: u32,
    /// Collision radius.
    pub size: f32,
}

impl EnemyStats {
    /// Scales the archetype of `kind` for the provided wave and upgrade levels.
    ///
    /// Regular enemies grow with [`stat_multiplier`] and [`speed_multiplier`]
    /// and pay out rewards boosted by the credit bonus upgrade. Bosses ignore
    /// the credit bonus and keep their fixed speed and size.
    #[must_use]
    pub fn scaled(kind: EnemyKind, wave: u32, upgrades: &UpgradeLevels) -> Self {
        let base = kind.archetype();
        if kind.is_boss() {
            let multiplier = boss_multiplier(wave);
            return Self {
                kind,
                hit_points: scale_hit_points(base.hit_points, multiplier),
                speed: base.speed,
                damage: scale_floor(base.damage, multiplier),
                reward: scale_floor(base.reward, multiplier),
                size: base.size,
            };
        }

        let multiplier = stat_multiplier(wave);
        Self {
            kind,
            hit_points: scale_hit_points(base.hit_points, multiplier),
            speed: (f64::from(base.speed) * speed_multiplier(wave)) as f32,
            damage: scale_floor(base.damage, multiplier),
            reward: scale_floor(base.reward, upgrades.reward_multiplier()),
            size: base.size,
        }
    }
}

fn scale_hit_points(value: u32, multiplier: f64) -> i32 {
    i32::try_from(scale_floor(value, multiplier)).unwrap_or(i32::MAX)
}

fn scale_floor(value: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(value) * multiplier).floor();
    if scaled <= 0.0 {
        0
    } else {
        scaled.min(f64::from(u32::MAX)) as u32
    }
}
