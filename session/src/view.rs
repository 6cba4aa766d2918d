//! Read-only presentations handed to the render and UI collaborators.

use orbital_defence_core::{
    is_boss_wave, stat_multiplier, wave_quota, AchievementId, Color, EnemyId, EnemyKind,
    PlacementError, UnitId, UnitKind, UnitShape, UpgradeKind, Vec2,
};
use orbital_defence_world::query::{ParticleSnapshot, ProjectileSnapshot};

/// Everything the render collaborator draws for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Central tower.
    pub tower: SceneTower,
    /// Placed units.
    pub units: Vec<SceneUnit>,
    /// Live enemies.
    pub enemies: Vec<SceneEnemy>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Live cosmetic particles.
    pub particles: Vec<ParticleSnapshot>,
    /// Ghost of the armed unit under the cursor.
    pub placement: Option<PlacementPreview>,
    /// Simulated time is frozen.
    pub paused: bool,
    /// The tower has fallen.
    pub game_over: bool,
}

/// Tower drawn at the map center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneTower {
    /// Center of the tower.
    pub position: Vec2,
    /// Footprint radius.
    pub radius: f32,
    /// Hit points, clamped to zero.
    pub hp: i32,
    /// Hit points at full health.
    pub max_hp: i32,
}

/// Placed unit with its effective range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneUnit {
    /// Identifier allocated by the world.
    pub id: UnitId,
    /// Archetype of the unit.
    pub kind: UnitKind,
    /// Center of the unit.
    pub position: Vec2,
    /// Footprint size.
    pub size: f32,
    /// Outline to draw.
    pub shape: UnitShape,
    /// Tint of the unit.
    pub color: Color,
    /// Targeting range under current upgrades.
    pub range: f32,
}

/// Live enemy with its health bar fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneEnemy {
    /// Identifier allocated by the world.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub kind: EnemyKind,
    /// Center of the enemy.
    pub position: Vec2,
    /// Collision radius.
    pub size: f32,
    /// Tint of the enemy.
    pub color: Color,
    /// Remaining hit points as a fraction of the maximum.
    pub hp_fraction: f32,
    /// Draw the boss decoration.
    pub boss: bool,
}

/// Unit ghost following the cursor while placement is armed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPreview {
    /// Armed unit kind.
    pub kind: UnitKind,
    /// Cursor position.
    pub position: Vec2,
    /// Range ring radius.
    pub range: f32,
    /// Reason a click at the cursor would be rejected, if any.
    pub rejection: Option<PlacementError>,
}

/// Figures the UI collaborator shows beside the battlefield.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Current wave number.
    pub wave: u32,
    /// Spendable credits.
    pub credits: u32,
    /// Accumulated score.
    pub score: u64,
    /// Tower hit points, clamped to zero.
    pub tower_hp: i32,
    /// Tower hit points at full health.
    pub tower_max_hp: i32,
    /// Whole seconds until the next wave launches, while resting.
    pub seconds_to_next_wave: Option<u64>,
    /// Difficulty of the wave that launches next.
    pub next_wave: WavePreview,
    /// Speed multiplier.
    pub speed: u32,
    /// Simulated time is frozen.
    pub paused: bool,
    /// The tower has fallen.
    pub game_over: bool,
    /// Unit catalog with lock and affordability state.
    pub catalog: Vec<CatalogEntry>,
    /// Upgrade listing.
    pub upgrades: Vec<UpgradeEntry>,
    /// Every achievement with its unlock flag.
    pub achievements: Vec<(AchievementId, bool)>,
}

/// Difficulty preview for a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavePreview {
    /// Wave number.
    pub wave: u32,
    /// A single boss spawns instead of a regular quota.
    pub boss: bool,
    /// Enemies that will spawn.
    pub quota: u32,
    /// Extra hit points and damage over wave one, in percent.
    pub stat_bonus_percent: u32,
    /// Extra speed, in percent.
    pub speed_bonus_percent: u32,
    /// Extra rewards from the credit upgrade, in percent.
    pub reward_bonus_percent: u32,
}

impl WavePreview {
    pub(crate) fn new(wave: u32, credit_bonus: u32) -> Self {
        Self {
            wave,
            boss: is_boss_wave(wave),
            quota: wave_quota(wave),
            stat_bonus_percent: ((stat_multiplier(wave) - 1.0) * 100.0).floor() as u32,
            speed_bonus_percent: (f64::from(wave) * 1.5).floor() as u32,
            reward_bonus_percent: credit_bonus * 10,
        }
    }
}

/// Purchasable unit as listed in the build menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Archetype of the unit.
    pub kind: UnitKind,
    /// Display name.
    pub name: &'static str,
    /// Credits the unit costs.
    pub cost: u32,
    /// Wave at which the unit unlocks.
    pub unlock_wave: u32,
    /// The unit has been unlocked this session.
    pub unlocked: bool,
    /// The player holds enough credits.
    pub affordable: bool,
}

/// Upgrade as listed in the upgrade menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpgradeEntry {
    /// Upgrade track.
    pub kind: UpgradeKind,
    /// Display label.
    pub label: &'static str,
    /// Per-level effect.
    pub description: &'static str,
    /// Levels purchased.
    pub level: u32,
    /// Highest level.
    pub max_level: u32,
    /// Price of the next level, or `None` once maxed.
    pub next_cost: Option<u32>,
}
