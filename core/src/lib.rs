#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Orbital Defence engine.
//!
//! This crate defines the message surface that connects the session driver,
//! the authoritative world, and pure systems. Callers submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::time::Duration;

pub use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod catalog;
mod difficulty;
mod progression;

pub use catalog::{
    EnemyArchetype, EnemyKind, ProjectileEffect, UnitArchetype, UnitKind, UnitShape, CHAIN_DELAY,
    CHAIN_FALLOFF, CHAIN_MAX_HOPS, CHAIN_RANGE, DEFAULT_PROJECTILE_SPEED, EXPLOSION_RADIUS,
};
pub use difficulty::{
    boss_multiplier, completion_bonus, is_boss_wave, regular_kind_for_roll, speed_multiplier,
    stat_multiplier, wave_quota, EnemyStats, BOSS_WAVE_INTERVAL,
};
pub use progression::{AchievementId, AchievementSet, UpgradeKind, UpgradeLevels};

/// Frame duration that entity speeds and velocities are expressed against.
pub const REFERENCE_FRAME: Duration = Duration::from_millis(16);

/// Converts an elapsed duration into reference-frame units.
#[must_use]
pub fn reference_frames(dt: Duration) -> f32 {
    dt.as_secs_f32() / REFERENCE_FRAME.as_secs_f32()
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock, timers, and scheduled effects.
    Tick {
        /// Scaled duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Leaves the inter-wave rest and begins the current wave.
    StartWave,
    /// Introduces a new enemy scaled to the current wave.
    SpawnEnemy {
        /// Archetype to instantiate.
        kind: EnemyKind,
        /// World position where the enemy appears.
        position: Vec2,
    },
    /// Closes out a cleared wave and advances the wave counter.
    CompleteWave,
    /// Moves enemies toward the tower and resolves tower contact.
    AdvanceEnemies {
        /// Scaled duration of simulated time to integrate.
        dt: Duration,
    },
    /// Launches a projectile from a ready unit toward a live enemy.
    FireProjectile {
        /// Unit firing the projectile.
        unit: UnitId,
        /// Enemy the projectile is aimed at.
        target: EnemyId,
    },
    /// Moves projectiles and resolves collisions and their effects.
    AdvanceProjectiles {
        /// Scaled duration of simulated time to integrate.
        dt: Duration,
    },
    /// Moves and ages cosmetic particles.
    AdvanceParticles {
        /// Scaled duration of simulated time to integrate.
        dt: Duration,
    },
    /// Arms placement of the provided unit kind.
    SelectUnit {
        /// Kind the player intends to place.
        kind: UnitKind,
    },
    /// Updates the cursor position used for the placement preview.
    MoveCursor {
        /// Cursor position in world units.
        position: Vec2,
    },
    /// Disarms any pending placement.
    CancelPlacement,
    /// Places a unit at the provided position.
    PlaceUnit {
        /// Kind of unit to construct.
        kind: UnitKind,
        /// Center of the new unit in world units.
        position: Vec2,
    },
    /// Buys the next level of an upgrade.
    PurchaseUpgrade {
        /// Upgrade to purchase.
        upgrade: UpgradeKind,
    },
    /// Resets the session to its initial state.
    Restart,
    /// Replaces the session state with previously saved values.
    RestoreSession {
        /// Validated state captured by an earlier save.
        state: SessionState,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Scaled duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave began.
    WaveStarted {
        /// Number of the wave that began.
        wave: u32,
        /// Indicates whether the wave spawns a boss.
        boss: bool,
        /// Number of enemies the wave will spawn.
        quota: u32,
    },
    /// Announces a transition of the wave state machine.
    WavePhaseChanged {
        /// Wave the transition belongs to.
        wave: u32,
        /// Phase entered by the transition.
        phase: WavePhase,
    },
    /// Confirms that a wave was cleared.
    WaveCompleted {
        /// Number of the wave that was cleared.
        completed: u32,
        /// Number of the wave that follows.
        next_wave: u32,
        /// Credits granted for clearing the wave.
        bonus: u32,
        /// Damage the tower took during the wave.
        damage_taken: u32,
    },
    /// Confirms that an enemy entered the battlefield.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype the enemy was instantiated from.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec2,
        /// Starting hit points after wave scaling.
        hit_points: i32,
    },
    /// Reports damage dealt to an enemy.
    EnemyDamaged {
        /// Enemy that took damage.
        enemy: EnemyId,
        /// Damage applied.
        amount: u32,
        /// Hit points remaining; may be negative before removal.
        remaining: i32,
    },
    /// Confirms that an enemy was destroyed by the defences.
    EnemyDestroyed {
        /// Enemy that was destroyed.
        enemy: EnemyId,
        /// Archetype of the destroyed enemy.
        kind: EnemyKind,
        /// Indicates whether the enemy was a boss.
        boss: bool,
        /// Credits granted for the kill.
        reward: u32,
        /// Score after the kill was credited.
        score: u64,
    },
    /// Reports that an enemy reached the tower and was removed.
    TowerStruck {
        /// Enemy that reached the tower.
        enemy: EnemyId,
        /// Damage dealt to the tower.
        damage: u32,
        /// Tower hit points after the impact.
        tower_hp: i32,
    },
    /// Announces that the tower fell and the session ended.
    GameOver {
        /// Wave in progress when the tower fell.
        wave: u32,
        /// Final score.
        score: u64,
    },
    /// Confirms that a unit launched a projectile.
    ProjectileFired {
        /// Unit that fired.
        unit: UnitId,
        /// Enemy the projectile was aimed at.
        target: EnemyId,
    },
    /// Reports that a chain lightning hop was queued.
    ChainHopScheduled {
        /// Enemy the hop will strike.
        target: EnemyId,
        /// Damage the hop will deal.
        damage: u32,
        /// Simulated time at which the hop lands.
        due: Duration,
    },
    /// Confirms that a unit kind became available.
    UnitUnlocked {
        /// Kind that was unlocked.
        kind: UnitKind,
    },
    /// Confirms that placement of a unit kind was armed.
    UnitSelected {
        /// Kind armed for placement.
        kind: UnitKind,
    },
    /// Confirms that an armed placement was cancelled.
    PlacementCancelled,
    /// Confirms that a unit was placed.
    UnitPlaced {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Kind of unit placed.
        kind: UnitKind,
        /// Center of the unit.
        position: Vec2,
        /// Credits spent.
        cost: u32,
    },
    /// Reports that a selection or placement request was rejected.
    PlacementRejected {
        /// Kind requested.
        kind: UnitKind,
        /// Specific reason the request failed.
        reason: PlacementError,
    },
    /// Confirms that an upgrade level was purchased.
    UpgradePurchased {
        /// Upgrade that was purchased.
        upgrade: UpgradeKind,
        /// Level reached after the purchase.
        level: u32,
        /// Credits spent.
        cost: u32,
    },
    /// Reports that an upgrade purchase was rejected.
    UpgradeRejected {
        /// Upgrade requested.
        upgrade: UpgradeKind,
        /// Specific reason the purchase failed.
        reason: UpgradeError,
    },
    /// Announces that the session returned to its initial state.
    SessionReset,
    /// Announces that a saved session replaced the current state.
    SessionRestored {
        /// Wave restored from the save.
        wave: u32,
    },
    /// Announces a newly unlocked achievement.
    AchievementUnlocked {
        /// Achievement that was unlocked.
        achievement: AchievementId,
    },
}

/// Phases of the wave lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Inter-wave countdown is running.
    Idle,
    /// Enemies are being introduced on a cadence.
    Spawning,
    /// Spawn quota met; waiting for remaining enemies to be cleared.
    Draining,
    /// A single boss enemy is on the field.
    BossActive,
}

/// RGB tint used by catalogs and cosmetic effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a placed unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the unit identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a placed unit used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier allocated to the unit by the world.
    pub id: UnitId,
    /// Kind of unit that was placed.
    pub kind: UnitKind,
    /// Center of the unit.
    pub position: Vec2,
    /// Current hit points.
    pub hp: i32,
    /// Hit points at placement.
    pub max_hp: i32,
    /// Targeting range with upgrades applied.
    pub range: f32,
    /// Indicates whether the unit accrued enough time to fire.
    pub ready: bool,
}

/// Read-only snapshot describing all placed units.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no unit was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a live enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned to the enemy.
    pub id: EnemyId,
    /// Archetype the enemy was instantiated from.
    pub kind: EnemyKind,
    /// Current position.
    pub position: Vec2,
    /// Current hit points.
    pub hp: i32,
    /// Hit points at spawn.
    pub max_hp: i32,
    /// Collision radius.
    pub size: f32,
    /// Indicates whether the enemy is a boss.
    pub boss: bool,
}

/// Read-only snapshot describing all live enemies in spawn order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    ///
    /// Identifiers grow monotonically with spawn order, so sorting by
    /// identifier preserves the enemy-list order used for tie-breaking.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemy was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Target assignment computed for a single unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitTarget {
    /// Unit that owns the assignment.
    pub unit: UnitId,
    /// Enemy selected as the unit's target.
    pub enemy: EnemyId,
    /// Distance between the unit and the enemy.
    pub distance: f32,
}

/// Read-only snapshot of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveSnapshot {
    /// Current wave number, starting at one.
    pub wave: u32,
    /// Phase of the wave lifecycle.
    pub phase: WavePhase,
    /// Time accumulated toward the next wave while idle.
    pub rest_elapsed: Duration,
    /// Time accumulated toward the next spawn while spawning.
    pub spawn_elapsed: Duration,
    /// Enemies spawned so far in the current wave.
    pub spawned: u32,
    /// Enemies the current wave will spawn.
    pub quota: u32,
    /// Damage the tower took during the current wave.
    pub damage_taken: u32,
    /// Number of enemies still alive.
    pub enemies_alive: usize,
    /// Indicates whether the session ended.
    pub game_over: bool,
}

/// Unit persisted inside a [`SessionState`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedUnit {
    /// Kind of unit that was placed.
    pub kind: UnitKind,
    /// Center of the unit.
    pub position: Vec2,
    /// Hit points at the time of saving.
    pub hp: i32,
}

/// Session fields that survive a save and load round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Wave number at the time of saving.
    pub wave: u32,
    /// Spendable credits.
    pub credits: u32,
    /// Accumulated score.
    pub score: u64,
    /// Tower hit points.
    pub tower_hp: i32,
    /// Tower maximum hit points.
    pub tower_max_hp: i32,
    /// Placed units.
    pub units: Vec<SavedUnit>,
    /// Upgrade levels purchased so far.
    pub upgrades: UpgradeLevels,
}

impl SessionState {
    /// Checks the values a hand-edited or truncated save could break.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.wave == 0 {
            return Err(StateError::WaveOutOfRange);
        }
        if self.tower_max_hp <= 0 {
            return Err(StateError::TowerMaxHp);
        }
        if self.tower_hp > self.tower_max_hp {
            return Err(StateError::TowerHp);
        }
        if self.tower_hp <= 0 {
            return Err(StateError::TowerDestroyed);
        }
        if !self.upgrades.within_limits() {
            return Err(StateError::UpgradeLevel);
        }
        if self
            .units
            .iter()
            .any(|unit| !unit.position.is_finite() || unit.hp <= 0)
        {
            return Err(StateError::Unit);
        }
        Ok(())
    }
}

/// Reasons a [`SessionState`] is rejected before it touches the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum StateError {
    /// Waves are numbered from one.
    #[error("wave number must be at least one")]
    WaveOutOfRange,
    /// The tower needs a positive hit point ceiling.
    #[error("tower maximum hit points must be positive")]
    TowerMaxHp,
    /// Tower hit points exceed the ceiling.
    #[error("tower hit points exceed the maximum")]
    TowerHp,
    /// The tower had already fallen, which ends a session for good.
    #[error("tower was destroyed")]
    TowerDestroyed,
    /// An upgrade sits above its maximum level.
    #[error("upgrade level exceeds its maximum")]
    UpgradeLevel,
    /// A unit has a non-finite position or no hit points.
    #[error("saved unit is malformed")]
    Unit,
}

/// Reasons a unit selection or placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The unit kind has not been unlocked yet.
    #[error("unlocks at wave {unlock_wave}")]
    Locked {
        /// Wave at which the kind unlocks.
        unlock_wave: u32,
    },
    /// The player cannot afford the unit.
    #[error("insufficient credits: {required} required, {available} available")]
    InsufficientCredits {
        /// Credits the unit costs.
        required: u32,
        /// Credits the player holds.
        available: u32,
    },
    /// The position overlaps the tower's clearance zone.
    #[error("too close to tower")]
    TooCloseToTower,
    /// The position overlaps another unit's clearance zone.
    #[error("too close to another unit")]
    TooCloseToUnit,
    /// No unit kind was armed for placement.
    #[error("no unit selected")]
    NothingSelected,
    /// The session ended and awaits a restart.
    #[error("mission failed; restart to place units")]
    SessionEnded,
}

/// Reasons an upgrade purchase may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// The upgrade already sits at its maximum level.
    #[error("upgrade already at maximum level {max}")]
    MaxLevel {
        /// Maximum level of the upgrade.
        max: u32,
    },
    /// The player cannot afford the next level.
    #[error("insufficient credits: {required} required, {available} available")]
    InsufficientCredits {
        /// Credits the next level costs.
        required: u32,
        /// Credits the player holds.
        available: u32,
    },
}

/// Lowest game speed multiplier accepted by the simulation clock.
pub const MIN_SPEED: u32 = 1;

/// Highest game speed multiplier accepted by the simulation clock.
pub const MAX_SPEED: u32 = 5;

/// Rejection raised when a speed multiplier falls outside the supported range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[error("speed {requested} outside 1..=5")]
pub struct SpeedError {
    /// Multiplier that was requested.
    pub requested: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn sample_state() -> SessionState {
        SessionState {
            wave: 7,
            credits: 420,
            score: 3_150,
            tower_hp: 64,
            tower_max_hp: 100,
            units: vec![SavedUnit {
                kind: UnitKind::MissileSilo,
                position: Vec2::new(310.0, 145.5),
                hp: 60,
            }],
            upgrades: UpgradeLevels {
                damage_boost: 2,
                range_boost: 1,
                fire_rate_boost: 0,
                credit_bonus: 3,
            },
        }
    }

    #[test]
    fn session_state_round_trips_through_bincode() {
        assert_round_trip(&sample_state());
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::InsufficientCredits {
            required: 350,
            available: 120,
        });
    }

    #[test]
    fn reference_frames_scale_linearly() {
        assert!((reference_frames(Duration::from_millis(16)) - 1.0).abs() < 1e-6);
        assert!((reference_frames(Duration::from_millis(48)) - 3.0).abs() < 1e-6);
        assert!(reference_frames(Duration::ZERO).abs() < f32::EPSILON);
    }

    #[test]
    fn validation_rejects_broken_states() {
        assert_eq!(sample_state().validate(), Ok(()));

        let mut state = sample_state();
        state.wave = 0;
        assert_eq!(state.validate(), Err(StateError::WaveOutOfRange));

        let mut state = sample_state();
        state.tower_max_hp = 0;
        assert_eq!(state.validate(), Err(StateError::TowerMaxHp));

        let mut state = sample_state();
        state.tower_hp = 0;
        assert_eq!(state.validate(), Err(StateError::TowerDestroyed));
        state.tower_hp = -5;
        assert_eq!(state.validate(), Err(StateError::TowerDestroyed));

        let mut state = sample_state();
        state.upgrades.credit_bonus = 9;
        assert_eq!(state.validate(), Err(StateError::UpgradeLevel));

        let mut state = sample_state();
        state.units[0].position = Vec2::new(f32::NAN, 0.0);
        assert_eq!(state.validate(), Err(StateError::Unit));
    }

    #[test]
    fn placement_errors_render_user_facing_notices() {
        assert_eq!(
            PlacementError::Locked { unlock_wave: 5 }.to_string(),
            "unlocks at wave 5"
        );
        assert_eq!(PlacementError::TooCloseToTower.to_string(), "too close to tower");
    }
}
