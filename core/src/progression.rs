//! Per-session upgrade counters and persistent achievement bookkeeping.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const PERCENT_PER_LEVEL: f64 = 0.1;

/// Purchasable upgrades that boost every placed unit or enemy reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Raises projectile damage by ten percent per level.
    DamageBoost,
    /// Raises unit range by ten percent per level.
    RangeBoost,
    /// Shortens the fire interval by ten percent per level.
    FireRateBoost,
    /// Raises regular enemy rewards by ten percent per level.
    CreditBonus,
}

impl UpgradeKind {
    /// Every upgrade kind in listing order.
    pub const ALL: [UpgradeKind; 4] = [
        Self::DamageBoost,
        Self::RangeBoost,
        Self::FireRateBoost,
        Self::CreditBonus,
    ];

    /// Cost of the first level; level `n` costs `base_cost * n`.
    #[must_use]
    pub const fn base_cost(self) -> u32 {
        match self {
            Self::DamageBoost => 200,
            Self::RangeBoost => 150,
            Self::FireRateBoost => 250,
            Self::CreditBonus => 300,
        }
    }

    /// Highest level the upgrade can reach.
    #[must_use]
    pub const fn max_level(self) -> u32 {
        match self {
            Self::DamageBoost | Self::RangeBoost | Self::FireRateBoost => 10,
            Self::CreditBonus => 5,
        }
    }

    /// Display name presented in upgrade listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DamageBoost => "Damage Boost",
            Self::RangeBoost => "Range Boost",
            Self::FireRateBoost => "Fire Rate Boost",
            Self::CreditBonus => "Credit Bonus",
        }
    }

    /// Short description of the per-level effect.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::DamageBoost => "+10% damage / level",
            Self::RangeBoost => "+10% range / level",
            Self::FireRateBoost => "+10% fire rate / level",
            Self::CreditBonus => "+10% rewards / level",
        }
    }
}

/// Levels purchased for every upgrade during the current session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    /// Level of [`UpgradeKind::DamageBoost`].
    pub damage_boost: u32,
    /// Level of [`UpgradeKind::RangeBoost`].
    pub range_boost: u32,
    /// Level of [`UpgradeKind::FireRateBoost`].
    pub fire_rate_boost: u32,
    /// Level of [`UpgradeKind::CreditBonus`].
    pub credit_bonus: u32,
}

impl UpgradeLevels {
    /// Current level of the provided upgrade.
    #[must_use]
    pub const fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::DamageBoost => self.damage_boost,
            UpgradeKind::RangeBoost => self.range_boost,
            UpgradeKind::FireRateBoost => self.fire_rate_boost,
            UpgradeKind::CreditBonus => self.credit_bonus,
        }
    }

    /// Overwrites the level of the provided upgrade.
    pub fn set(&mut self, kind: UpgradeKind, level: u32) {
        let slot = match kind {
            UpgradeKind::DamageBoost => &mut self.damage_boost,
            UpgradeKind::RangeBoost => &mut self.range_boost,
            UpgradeKind::FireRateBoost => &mut self.fire_rate_boost,
            UpgradeKind::CreditBonus => &mut self.credit_bonus,
        };
        *slot = level;
    }

    /// Price of the next level, or `None` once the upgrade is maxed out.
    #[must_use]
    pub fn next_cost(&self, kind: UpgradeKind) -> Option<u32> {
        let level = self.level(kind);
        if level >= kind.max_level() {
            return None;
        }
        Some(kind.base_cost().saturating_mul(level + 1))
    }

    /// Reports whether every level sits within its upgrade's maximum.
    #[must_use]
    pub fn within_limits(&self) -> bool {
        UpgradeKind::ALL
            .into_iter()
            .all(|kind| self.level(kind) <= kind.max_level())
    }

    /// Factor applied to projectile damage.
    #[must_use]
    pub fn damage_multiplier(&self) -> f64 {
        1.0 + f64::from(self.damage_boost) * PERCENT_PER_LEVEL
    }

    /// Factor applied to unit range.
    #[must_use]
    pub fn range_multiplier(&self) -> f64 {
        1.0 + f64::from(self.range_boost) * PERCENT_PER_LEVEL
    }

    /// Factor applied to the fire interval; never negative.
    #[must_use]
    pub fn fire_interval_multiplier(&self) -> f64 {
        (1.0 - f64::from(self.fire_rate_boost) * PERCENT_PER_LEVEL).max(0.0)
    }

    /// Factor applied to regular enemy rewards at spawn time.
    #[must_use]
    pub fn reward_multiplier(&self) -> f64 {
        1.0 + f64::from(self.credit_bonus) * PERCENT_PER_LEVEL
    }
}

/// Milestones unlocked once and never re-locked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AchievementId {
    /// Destroy the first enemy.
    FirstKill,
    /// Reach wave ten.
    Wave10,
    /// Reach wave twenty-five.
    Wave25,
    /// Reach a score of ten thousand.
    Score10k,
    /// Destroy the first boss.
    FirstBoss,
    /// Complete a wave without the tower taking damage.
    PerfectWave,
}

impl AchievementId {
    /// Every achievement in listing order.
    pub const ALL: [AchievementId; 6] = [
        Self::FirstKill,
        Self::Wave10,
        Self::Wave25,
        Self::Score10k,
        Self::FirstBoss,
        Self::PerfectWave,
    ];

    /// Stable key used by achievement stores.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FirstKill => "firstKill",
            Self::Wave10 => "wave10",
            Self::Wave25 => "wave25",
            Self::Score10k => "score10k",
            Self::FirstBoss => "firstBoss",
            Self::PerfectWave => "perfectWave",
        }
    }

    /// Resolves an achievement from its stable key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|achievement| achievement.key() == key)
    }

    /// Display name presented to players.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstKill => "First Blood",
            Self::Wave10 => "Veteran",
            Self::Wave25 => "Elite",
            Self::Score10k => "High Scorer",
            Self::FirstBoss => "Boss Slayer",
            Self::PerfectWave => "Perfect Defense",
        }
    }

    /// Short description of the unlock condition.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::FirstKill => "Destroy your first enemy",
            Self::Wave10 => "Survive 10 waves",
            Self::Wave25 => "Survive 25 waves",
            Self::Score10k => "Reach 10,000 points",
            Self::FirstBoss => "Defeat your first boss",
            Self::PerfectWave => "Complete a wave without taking damage",
        }
    }
}

/// Monotonic set of unlocked achievements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementSet {
    unlocked: BTreeSet<AchievementId>,
}

impl AchievementSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the achievement, returning `true` only for a fresh unlock.
    pub fn unlock(&mut self, achievement: AchievementId) -> bool {
        self.unlocked.insert(achievement)
    }

    /// Reports whether the achievement has been unlocked.
    #[must_use]
    pub fn contains(&self, achievement: AchievementId) -> bool {
        self.unlocked.contains(&achievement)
    }

    /// Iterator over unlocked achievements in listing order.
    pub fn iter(&self) -> impl Iterator<Item = AchievementId> + '_ {
        self.unlocked.iter().copied()
    }

    /// Number of unlocked achievements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    /// Reports whether nothing has been unlocked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }
}

impl FromIterator<AchievementId> for AchievementSet {
    fn from_iter<I: IntoIterator<Item = AchievementId>>(iter: I) -> Self {
        Self {
            unlocked: iter.into_iter().collect(),
        }
    }
}
