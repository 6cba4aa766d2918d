//! Static unit and enemy archetype definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Color;

/// Projectile speed applied when an archetype declares a speed of zero.
pub const DEFAULT_PROJECTILE_SPEED: f32 = 16.0;

/// Radius of the splash damage applied by explosive projectiles.
pub const EXPLOSION_RADIUS: f32 = 80.0;

/// Maximum distance a chain lightning hop may travel between enemies.
pub const CHAIN_RANGE: f32 = 150.0;

/// Delay between consecutive chain lightning hops measured in simulated time.
pub const CHAIN_DELAY: Duration = Duration::from_millis(100);

/// Number of enemies a chain lightning strike may damage, the initial hit included.
pub const CHAIN_MAX_HOPS: u32 = 3;

/// Damage retained by each successive chain lightning hop.
pub const CHAIN_FALLOFF: f64 = 0.7;

/// Types of defensive units the player can place around the tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Cheap all-rounder available from the first wave.
    PlasmaTurret,
    /// Rapid-fire, low-damage beam emplacement.
    LaserCannon,
    /// Slow launcher whose missiles explode on impact.
    MissileSilo,
    /// Long-range cannon whose slugs pierce through enemies.
    Railgun,
    /// Short-range coil whose bolts arc between nearby enemies.
    TeslaCoil,
}

impl UnitKind {
    /// Every unit kind in catalog order.
    pub const ALL: [UnitKind; 5] = [
        Self::PlasmaTurret,
        Self::LaserCannon,
        Self::MissileSilo,
        Self::Railgun,
        Self::TeslaCoil,
    ];

    /// Immutable archetype describing the unit's base statistics.
    #[must_use]
    pub const fn archetype(self) -> &'static UnitArchetype {
        match self {
            Self::PlasmaTurret => &PLASMA_TURRET,
            Self::LaserCannon => &LASER_CANNON,
            Self::MissileSilo => &MISSILE_SILO,
            Self::Railgun => &RAILGUN,
            Self::TeslaCoil => &TESLA_COIL,
        }
    }
}

/// Outline used when presenting a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitShape {
    /// Axis-aligned square centered on the unit position.
    Square,
    /// Circle centered on the unit position.
    Round,
}

/// Behaviour applied when a projectile strikes an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectileEffect {
    /// Damages the struck enemy and is consumed.
    Direct,
    /// Splashes falloff damage to every enemy inside `radius` and is consumed.
    Explosive {
        /// Radius of the splash measured from the impact point.
        radius: f32,
    },
    /// Damages the struck enemy and keeps flying until its lifetime expires.
    Piercing,
    /// Damages the struck enemy and schedules hops to nearby enemies.
    Chain {
        /// Total number of enemies damaged, the initial hit included.
        max_hops: u32,
        /// Damage retained per hop relative to the previous one.
        falloff: f64,
        /// Maximum distance between consecutive hop targets.
        range: f32,
        /// Simulated delay before each hop lands.
        delay: Duration,
    },
}

/// Immutable statistics shared by every unit of a kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitArchetype {
    /// Kind described by the archetype.
    pub kind: UnitKind,
    /// Display name presented to players.
    pub name: &'static str,
    /// Credits required to place the unit.
    pub cost: u32,
    /// Damage dealt by a single projectile before upgrades.
    pub damage: u32,
    /// Targeting range in world units before upgrades.
    pub range: f32,
    /// Minimum time between shots before upgrades.
    pub fire_interval: Duration,
    /// Hit points assigned to a freshly placed unit.
    pub hit_points: i32,
    /// Footprint diameter in world units.
    pub size: f32,
    /// Distance travelled by a projectile per reference frame; zero selects the default.
    pub projectile_speed: f32,
    /// Collision radius of fired projectiles.
    pub projectile_size: f32,
    /// Effect resolved when a projectile strikes.
    pub effect: ProjectileEffect,
    /// First wave at which the unit becomes available; zero means always available.
    pub unlock_wave: u32,
    /// Outline used when presenting the unit.
    pub shape: UnitShape,
    /// Tint applied to the unit and its projectiles.
    pub color: Color,
}

impl UnitArchetype {
    /// Projectile speed with the zero-speed default applied.
    #[must_use]
    pub fn effective_projectile_speed(&self) -> f32 {
        if self.projectile_speed > 0.0 {
            self.projectile_speed
        } else {
            DEFAULT_PROJECTILE_SPEED
        }
    }

    /// Reports whether the archetype is available without reaching a wave.
    #[must_use]
    pub const fn starts_unlocked(&self) -> bool {
        self.unlock_wave == 0
    }
}

const PLASMA_TURRET: UnitArchetype = UnitArchetype {
    kind: UnitKind::PlasmaTurret,
    name: "PLASMA TURRET",
    cost: 100,
    damage: 15,
    range: 120.0,
    fire_interval: Duration::from_millis(800),
    hit_points: 50,
    size: 20.0,
    projectile_speed: 8.0,
    projectile_size: 3.0,
    effect: ProjectileEffect::Direct,
    unlock_wave: 0,
    shape: UnitShape::Square,
    color: Color::from_rgb(0x00, 0xff, 0xcc),
};

const LASER_CANNON: UnitArchetype = UnitArchetype {
    kind: UnitKind::LaserCannon,
    name: "LASER CANNON",
    cost: 200,
    damage: 8,
    range: 180.0,
    fire_interval: Duration::from_millis(150),
    hit_points: 40,
    size: 25.0,
    projectile_speed: 20.0,
    projectile_size: 3.0,
    effect: ProjectileEffect::Direct,
    unlock_wave: 3,
    shape: UnitShape::Round,
    color: Color::from_rgb(0xff, 0x00, 0xff),
};

const MISSILE_SILO: UnitArchetype = UnitArchetype {
    kind: UnitKind::MissileSilo,
    name: "MISSILE SILO",
    cost: 350,
    damage: 80,
    range: 200.0,
    fire_interval: Duration::from_millis(2_500),
    hit_points: 60,
    size: 30.0,
    projectile_speed: 4.0,
    projectile_size: 6.0,
    effect: ProjectileEffect::Explosive {
        radius: EXPLOSION_RADIUS,
    },
    unlock_wave: 5,
    shape: UnitShape::Round,
    color: Color::from_rgb(0xff, 0xaa, 0x00),
};

const RAILGUN: UnitArchetype = UnitArchetype {
    kind: UnitKind::Railgun,
    name: "RAILGUN",
    cost: 500,
    damage: 150,
    range: 300.0,
    fire_interval: Duration::from_millis(3_000),
    hit_points: 80,
    size: 35.0,
    projectile_speed: 25.0,
    projectile_size: 3.0,
    effect: ProjectileEffect::Piercing,
    unlock_wave: 8,
    shape: UnitShape::Round,
    color: Color::from_rgb(0x00, 0xaa, 0xff),
};

const TESLA_COIL: UnitArchetype = UnitArchetype {
    kind: UnitKind::TeslaCoil,
    name: "TESLA COIL",
    cost: 600,
    damage: 25,
    range: 100.0,
    fire_interval: Duration::from_millis(400),
    hit_points: 100,
    size: 28.0,
    projectile_speed: 0.0,
    projectile_size: 3.0,
    effect: ProjectileEffect::Chain {
        max_hops: CHAIN_MAX_HOPS,
        falloff: CHAIN_FALLOFF,
        range: CHAIN_RANGE,
        delay: CHAIN_DELAY,
    },
    unlock_wave: 12,
    shape: UnitShape::Round,
    color: Color::from_rgb(0xaa, 0xff, 0xff),
};

/// Types of enemies that assault the tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Fast, fragile raider.
    Scout,
    /// Balanced attacker.
    Fighter,
    /// Slow, armoured attacker.
    Heavy,
    /// Strongest regular attacker.
    Elite,
    /// Single high-strength enemy spawned on boss waves.
    Boss,
}

impl EnemyKind {
    /// Regular enemy kinds ordered from weakest to strongest.
    pub const REGULAR: [EnemyKind; 4] = [Self::Scout, Self::Fighter, Self::Heavy, Self::Elite];

    /// Immutable archetype describing the enemy's base statistics.
    #[must_use]
    pub const fn archetype(self) -> &'static EnemyArchetype {
        match self {
            Self::Scout => &SCOUT,
            Self::Fighter => &FIGHTER,
            Self::Heavy => &HEAVY,
            Self::Elite => &ELITE,
            Self::Boss => &BOSS,
        }
    }

    /// Reports whether the kind is the boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss)
    }
}

/// Immutable base statistics of an enemy kind before wave scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyArchetype {
    /// Kind described by the archetype.
    pub kind: EnemyKind,
    /// Display name presented to players.
    pub name: &'static str,
    /// Hit points at wave one.
    pub hit_points: u32,
    /// Distance travelled per reference frame at wave zero.
    pub speed: f32,
    /// Damage dealt to the tower on contact at wave one.
    pub damage: u32,
    /// Credits granted when destroyed, before upgrades.
    pub reward: u32,
    /// Collision radius in world units.
    pub size: f32,
    /// Tint applied when presenting the enemy.
    pub color: Color,
}

const SCOUT: EnemyArchetype = EnemyArchetype {
    kind: EnemyKind::Scout,
    name: "Scout",
    hit_points: 30,
    speed: 1.5,
    damage: 8,
    reward: 25,
    size: 12.0,
    color: Color::from_rgb(0xff, 0x66, 0x66),
};

const FIGHTER: EnemyArchetype = EnemyArchetype {
    kind: EnemyKind::Fighter,
    name: "Fighter",
    hit_points: 60,
    speed: 1.2,
    damage: 15,
    reward: 40,
    size: 16.0,
    color: Color::from_rgb(0xff, 0x99, 0x66),
};

const HEAVY: EnemyArchetype = EnemyArchetype {
    kind: EnemyKind::Heavy,
    name: "Heavy",
    hit_points: 120,
    speed: 0.8,
    damage: 25,
    reward: 70,
    size: 22.0,
    color: Color::from_rgb(0xff, 0x66, 0xff),
};

const ELITE: EnemyArchetype = EnemyArchetype {
    kind: EnemyKind::Elite,
    name: "Elite",
    hit_points: 200,
    speed: 1.0,
    damage: 40,
    reward: 120,
    size: 25.0,
    color: Color::from_rgb(0xff, 0xff, 0x66),
};

const BOSS: EnemyArchetype = EnemyArchetype {
    kind: EnemyKind::Boss,
    name: "Boss",
    hit_points: 1_000,
    speed: 0.5,
    damage: 100,
    reward: 500,
    size: 50.0,
    color: Color::from_rgb(0xff, 0x00, 0x00),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plasma_turret_starts_unlocked() {
        let unlocked: Vec<UnitKind> = UnitKind::ALL
            .into_iter()
            .filter(|kind| kind.archetype().starts_unlocked())
            .collect();
        assert_eq!(unlocked, vec![UnitKind::PlasmaTurret]);
    }

    #[test]
    fn archetype_kinds_match_catalog_keys() {
        for kind in UnitKind::ALL {
            assert_eq!(kind.archetype().kind, kind);
        }
        for kind in EnemyKind::REGULAR {
            assert_eq!(kind.archetype().kind, kind);
            assert!(!kind.is_boss());
        }
        assert!(EnemyKind::Boss.is_boss());
    }

    #[test]
    fn zero_projectile_speed_falls_back_to_default() {
        let tesla = UnitKind::TeslaCoil.archetype();
        assert!((tesla.effective_projectile_speed() - DEFAULT_PROJECTILE_SPEED).abs() < f32::EPSILON);
        let turret = UnitKind::PlasmaTurret.archetype();
        assert!((turret.effective_projectile_speed() - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn special_effects_are_assigned_singly() {
        assert!(matches!(
            UnitKind::MissileSilo.archetype().effect,
            ProjectileEffect::Explosive { .. }
        ));
        assert_eq!(UnitKind::Railgun.archetype().effect, ProjectileEffect::Piercing);
        assert!(matches!(
            UnitKind::TeslaCoil.archetype().effect,
            ProjectileEffect::Chain { max_hops: 3, .. }
        ));
        assert_eq!(UnitKind::LaserCannon.archetype().effect, ProjectileEffect::Direct);
    }
}
