#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Orbital Defence.

mod combat;
mod effects;
mod particles;
mod pool;
mod units;

use std::{collections::BTreeSet, time::Duration};

use orbital_defence_core::{
    completion_bonus, is_boss_wave, reference_frames, wave_quota, Command, EnemyId, EnemyKind,
    EnemyStats, Event, PlacementError, SessionState, UnitId, UnitKind, UpgradeError, UpgradeKind,
    UpgradeLevels, Vec2, WavePhase,
};

pub use pool::ObjectPool;

use combat::{Enemy, Ledger, Projectile, Resolver, PROJECTILE_LIFETIME};
use effects::{ChainHop, EffectQueue};
use particles::{ParticleField, CONTACT_PARTICLES, PLACEMENT_PARTICLES};
use units::{effective_range, fire_interval, projectile_damage, UnitRegistry, TOWER_CLEARANCE};

/// Parameters that shape a freshly created world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Width of the battlefield in world units.
    pub width: f32,
    /// Height of the battlefield in world units.
    pub height: f32,
    /// Credits granted at the start of a session.
    pub starting_credits: u32,
    /// Tower hit points at the start of a session.
    pub tower_hp: i32,
    /// Radius of the tower footprint.
    pub tower_radius: f32,
    /// Seed of the cosmetic particle stream.
    pub particle_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1_200.0,
            height: 800.0,
            starting_credits: 1_000,
            tower_hp: 100,
            tower_radius: 40.0,
            particle_seed: 0,
        }
    }
}

/// Central structure the enemies converge on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tower {
    position: Vec2,
    radius: f32,
    hp: i32,
    max_hp: i32,
}

impl Tower {
    fn new(config: &WorldConfig) -> Self {
        Self {
            position: Vec2::new(config.width / 2.0, config.height / 2.0),
            radius: config.tower_radius,
            hp: config.tower_hp,
            max_hp: config.tower_hp,
        }
    }

    /// Center of the tower.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Radius of the tower footprint.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Current hit points; negative once the tower has fallen.
    #[must_use]
    pub const fn hp(&self) -> i32 {
        self.hp
    }

    /// Hit points at full health.
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.max_hp
    }
}

#[derive(Clone, Copy, Debug)]
struct WaveState {
    wave: u32,
    phase: WavePhase,
    rest_elapsed: Duration,
    spawn_elapsed: Duration,
    spawned: u32,
    quota: u32,
    damage_taken: u32,
}

impl WaveState {
    fn at(wave: u32) -> Self {
        Self {
            wave,
            phase: WavePhase::Idle,
            rest_elapsed: Duration::ZERO,
            spawn_elapsed: Duration::ZERO,
            spawned: 0,
            quota: 0,
            damage_taken: 0,
        }
    }

    fn enter(&mut self, phase: WavePhase, out_events: &mut Vec<Event>) {
        self.phase = phase;
        out_events.push(Event::WavePhaseChanged {
            wave: self.wave,
            phase,
        });
    }
}

/// Represents the authoritative Orbital Defence world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    tower: Tower,
    ledger: Ledger,
    upgrades: UpgradeLevels,
    units: UnitRegistry,
    unlocked: BTreeSet<UnitKind>,
    placement: Option<UnitKind>,
    cursor: Vec2,
    enemies: Vec<Enemy>,
    next_enemy_id: EnemyId,
    projectiles: ObjectPool<Projectile>,
    particles: ParticleField,
    effects: EffectQueue,
    due_hops: Vec<ChainHop>,
    wave: WaveState,
    clock: Duration,
    tick_index: u64,
    game_over: bool,
}

impl World {
    /// Creates a new world ready for the first wave.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            tower: Tower::new(&config),
            ledger: Ledger {
                credits: config.starting_credits,
                score: 0,
            },
            upgrades: UpgradeLevels::default(),
            units: UnitRegistry::new(),
            unlocked: starting_unlocks(),
            placement: None,
            cursor: Vec2::ZERO,
            enemies: Vec::new(),
            next_enemy_id: EnemyId::new(0),
            projectiles: ObjectPool::new(Projectile::blank, Projectile::clear),
            particles: ParticleField::new(config.particle_seed),
            effects: EffectQueue::new(),
            due_hops: Vec::new(),
            wave: WaveState::at(1),
            clock: Duration::ZERO,
            tick_index: 0,
            game_over: false,
            config,
        }
    }

    fn reset(&mut self) {
        self.tower = Tower::new(&self.config);
        self.ledger = Ledger {
            credits: self.config.starting_credits,
            score: 0,
        };
        self.upgrades = UpgradeLevels::default();
        self.units.clear();
        self.unlocked = starting_unlocks();
        self.placement = None;
        self.cursor = Vec2::ZERO;
        self.clear_battlefield();
        self.particles.reset();
        self.next_enemy_id = EnemyId::new(0);
        self.wave = WaveState::at(1);
        self.clock = Duration::ZERO;
        self.tick_index = 0;
        self.game_over = false;
    }

    fn clear_battlefield(&mut self) {
        self.enemies.clear();
        let _ = self.projectiles.release_all();
        self.effects.clear();
        self.due_hops.clear();
    }

    fn unlock_through(&mut self, wave: u32, out_events: &mut Vec<Event>) {
        for kind in UnitKind::ALL {
            if kind.archetype().unlock_wave <= wave && self.unlocked.insert(kind) {
                tracing::debug!(?kind, wave, "unit unlocked");
                out_events.push(Event::UnitUnlocked { kind });
            }
        }
    }

    fn resolver<'a>(&'a mut self, out_events: &'a mut Vec<Event>) -> Resolver<'a> {
        Resolver {
            enemies: &mut self.enemies,
            ledger: &mut self.ledger,
            particles: &mut self.particles,
            effects: &mut self.effects,
            now: self.clock,
            out_events,
        }
    }

    fn compact_enemies(&mut self) {
        self.enemies.retain(|enemy| enemy.alive);
    }

    fn check_placement(&self, kind: UnitKind) -> Result<(), PlacementError> {
        if self.game_over {
            return Err(PlacementError::SessionEnded);
        }
        let archetype = kind.archetype();
        if !self.unlocked.contains(&kind) {
            return Err(PlacementError::Locked {
                unlock_wave: archetype.unlock_wave,
            });
        }
        if self.ledger.credits < archetype.cost {
            return Err(PlacementError::InsufficientCredits {
                required: archetype.cost,
                available: self.ledger.credits,
            });
        }
        Ok(())
    }

    fn check_site(&self, kind: UnitKind, position: Vec2) -> Result<(), PlacementError> {
        let size = kind.archetype().size;
        if position.distance(self.tower.position) < self.tower.radius + size + TOWER_CLEARANCE {
            return Err(PlacementError::TooCloseToTower);
        }
        if self.units.crowds(kind, position) {
            return Err(PlacementError::TooCloseToUnit);
        }
        Ok(())
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let mut due = std::mem::take(&mut self.due_hops);
        self.effects.drain_due(self.clock, &mut due);
        if !due.is_empty() {
            let mut resolver = self.resolver(out_events);
            for hop in due.drain(..) {
                resolver.land_hop(hop);
            }
            self.compact_enemies();
        }
        self.due_hops = due;

        match self.wave.phase {
            WavePhase::Idle => {
                self.wave.rest_elapsed = self.wave.rest_elapsed.saturating_add(dt);
            }
            WavePhase::Spawning => {
                self.wave.spawn_elapsed = self.wave.spawn_elapsed.saturating_add(dt);
            }
            WavePhase::Draining | WavePhase::BossActive => {}
        }

        self.units.accumulate(dt);
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.wave.phase != WavePhase::Idle {
            return;
        }
        let wave = self.wave.wave;
        let boss = is_boss_wave(wave);
        self.wave = WaveState {
            quota: wave_quota(wave),
            ..WaveState::at(wave)
        };
        tracing::info!(wave, boss, quota = self.wave.quota, "wave started");
        out_events.push(Event::WaveStarted {
            wave,
            boss,
            quota: self.wave.quota,
        });
        let phase = if boss {
            WavePhase::BossActive
        } else {
            WavePhase::Spawning
        };
        self.wave.enter(phase, out_events);
        self.unlock_through(wave, out_events);
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, position: Vec2, out_events: &mut Vec<Event>) {
        let accepting = matches!(
            self.wave.phase,
            WavePhase::Spawning | WavePhase::BossActive
        );
        if !accepting || self.wave.spawned >= self.wave.quota {
            return;
        }

        let stats = EnemyStats::scaled(kind, self.wave.wave, &self.upgrades);
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        self.enemies.push(Enemy::spawn(id, position, stats));
        self.wave.spawned += 1;
        self.wave.spawn_elapsed = Duration::ZERO;
        tracing::debug!(enemy = id.get(), ?kind, hp = stats.hit_points, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            position,
            hit_points: stats.hit_points,
        });

        if self.wave.phase == WavePhase::Spawning && self.wave.spawned >= self.wave.quota {
            self.wave.enter(WavePhase::Draining, out_events);
        }
    }

    fn complete_wave(&mut self, out_events: &mut Vec<Event>) {
        let draining = matches!(
            self.wave.phase,
            WavePhase::Draining | WavePhase::BossActive
        );
        if !draining || !self.enemies.is_empty() || self.wave.spawned < self.wave.quota {
            return;
        }

        let completed = self.wave.wave;
        let damage_taken = self.wave.damage_taken;
        let next_wave = completed.saturating_add(1);
        let bonus = completion_bonus(next_wave);
        self.ledger.reward(bonus);
        self.wave = WaveState::at(next_wave);
        tracing::info!(completed, next_wave, bonus, damage_taken, "wave completed");
        out_events.push(Event::WaveCompleted {
            completed,
            next_wave,
            bonus,
            damage_taken,
        });
        self.wave.enter(WavePhase::Idle, out_events);
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let frames = reference_frames(dt);
        let target = self.tower.position;
        let reach = self.tower.radius;

        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.alive) {
            let offset = target - enemy.position;
            let distance = offset.length();
            if distance > reach + enemy.size {
                enemy.position += offset / distance * enemy.speed * frames;
                continue;
            }

            enemy.alive = false;
            self.tower.hp = self
                .tower
                .hp
                .saturating_sub(i32::try_from(enemy.damage).unwrap_or(i32::MAX));
            self.wave.damage_taken = self.wave.damage_taken.saturating_add(enemy.damage);
            self.particles
                .burst(enemy.position, enemy.color(), CONTACT_PARTICLES);
            out_events.push(Event::TowerStruck {
                enemy: enemy.id,
                damage: enemy.damage,
                tower_hp: self.tower.hp,
            });

            if self.tower.hp <= 0 {
                self.game_over = true;
                tracing::info!(
                    wave = self.wave.wave,
                    score = self.ledger.score,
                    "tower destroyed"
                );
                out_events.push(Event::GameOver {
                    wave: self.wave.wave,
                    score: self.ledger.score,
                });
                break;
            }
        }

        self.compact_enemies();
    }

    fn fire_projectile(&mut self, unit: UnitId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(enemy_position) = self
            .enemies
            .iter()
            .find(|enemy| enemy.alive && enemy.id == target)
            .map(|enemy| enemy.position)
        else {
            return;
        };
        let upgrades = self.upgrades;
        let Some(placed) = self.units.get_mut(unit) else {
            return;
        };
        if !placed.ready(&upgrades) {
            return;
        }

        placed.cooldown = Duration::ZERO;
        let kind = placed.kind;
        let origin = placed.position;
        let archetype = kind.archetype();
        let direction = (enemy_position - origin).normalize_or_zero();

        let projectile = self.projectiles.acquire();
        projectile.position = origin;
        projectile.velocity = direction * archetype.effective_projectile_speed();
        projectile.damage = projectile_damage(kind, &upgrades);
        projectile.effect = archetype.effect;
        projectile.size = archetype.projectile_size;
        projectile.life = PROJECTILE_LIFETIME;
        projectile.color = archetype.color;

        out_events.push(Event::ProjectileFired { unit, target });
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let frames = reference_frames(dt);
        let mut resolver = Resolver {
            enemies: &mut self.enemies,
            ledger: &mut self.ledger,
            particles: &mut self.particles,
            effects: &mut self.effects,
            now: self.clock,
            out_events,
        };
        let _ = self
            .projectiles
            .release_if(|projectile| resolver.advance_projectile(projectile, frames));
        self.compact_enemies();
    }

    fn place_unit(&mut self, kind: UnitKind, position: Vec2, out_events: &mut Vec<Event>) {
        if let Err(reason) = self
            .check_placement(kind)
            .and_then(|()| self.check_site(kind, position))
        {
            out_events.push(Event::PlacementRejected { kind, reason });
            return;
        }

        let archetype = kind.archetype();
        self.ledger.credits -= archetype.cost;
        let unit = self.units.insert(kind, position, archetype.hit_points);
        self.particles
            .burst(position, archetype.color, PLACEMENT_PARTICLES);
        self.placement = None;
        tracing::debug!(unit = unit.get(), ?kind, x = position.x, y = position.y, "unit placed");
        out_events.push(Event::UnitPlaced {
            unit,
            kind,
            position,
            cost: archetype.cost,
        });
    }

    fn purchase_upgrade(&mut self, upgrade: UpgradeKind, out_events: &mut Vec<Event>) {
        let Some(cost) = self.upgrades.next_cost(upgrade) else {
            out_events.push(Event::UpgradeRejected {
                upgrade,
                reason: UpgradeError::MaxLevel {
                    max: upgrade.max_level(),
                },
            });
            return;
        };
        if self.ledger.credits < cost {
            out_events.push(Event::UpgradeRejected {
                upgrade,
                reason: UpgradeError::InsufficientCredits {
                    required: cost,
                    available: self.ledger.credits,
                },
            });
            return;
        }

        self.ledger.credits -= cost;
        let level = self.upgrades.level(upgrade) + 1;
        self.upgrades.set(upgrade, level);
        tracing::debug!(?upgrade, level, cost, "upgrade purchased");
        out_events.push(Event::UpgradePurchased {
            upgrade,
            level,
            cost,
        });
    }

    fn restore(&mut self, state: SessionState, out_events: &mut Vec<Event>) {
        if let Err(error) = state.validate() {
            tracing::warn!(%error, "ignoring invalid session state");
            return;
        }

        self.reset();
        self.tower.hp = state.tower_hp;
        self.tower.max_hp = state.tower_max_hp;
        self.ledger = Ledger {
            credits: state.credits,
            score: state.score,
        };
        self.upgrades = state.upgrades;
        for saved in &state.units {
            let _ = self.units.insert(saved.kind, saved.position, saved.hp);
        }
        self.wave = WaveState::at(state.wave);
        self.unlock_through(state.wave, out_events);
        tracing::info!(wave = state.wave, credits = state.credits, "session restored");
        out_events.push(Event::SessionRestored { wave: state.wave });
    }
}

fn starting_unlocks() -> BTreeSet<UnitKind> {
    UnitKind::ALL
        .into_iter()
        .filter(|kind| kind.archetype().starts_unlocked())
        .collect()
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the tower has fallen every command except [`Command::Restart`] and
/// [`Command::RestoreSession`] is ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.game_over && !matches!(command, Command::Restart | Command::RestoreSession { .. }) {
        if let Command::PlaceUnit { kind, .. } | Command::SelectUnit { kind } = command {
            out_events.push(Event::PlacementRejected {
                kind,
                reason: PlacementError::SessionEnded,
            });
        }
        return;
    }

    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::StartWave => world.start_wave(out_events),
        Command::SpawnEnemy { kind, position } => world.spawn_enemy(kind, position, out_events),
        Command::CompleteWave => world.complete_wave(out_events),
        Command::AdvanceEnemies { dt } => world.advance_enemies(dt, out_events),
        Command::FireProjectile { unit, target } => world.fire_projectile(unit, target, out_events),
        Command::AdvanceProjectiles { dt } => world.advance_projectiles(dt, out_events),
        Command::AdvanceParticles { dt } => world.particles.advance(reference_frames(dt)),
        Command::SelectUnit { kind } => match world.check_placement(kind) {
            Ok(()) => {
                world.placement = Some(kind);
                out_events.push(Event::UnitSelected { kind });
            }
            Err(reason) => out_events.push(Event::PlacementRejected { kind, reason }),
        },
        Command::MoveCursor { position } => world.cursor = position,
        Command::CancelPlacement => {
            if world.placement.take().is_some() {
                out_events.push(Event::PlacementCancelled);
            }
        }
        Command::PlaceUnit { kind, position } => world.place_unit(kind, position, out_events),
        Command::PurchaseUpgrade { upgrade } => world.purchase_upgrade(upgrade, out_events),
        Command::Restart => {
            world.reset();
            tracing::info!("session reset");
            out_events.push(Event::SessionReset);
        }
        Command::RestoreSession { state } => world.restore(state, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use orbital_defence_core::{
        Color, EnemySnapshot, EnemyView, PlacementError, SavedUnit, SessionState, UnitKind,
        UnitSnapshot, UnitView, UpgradeLevels, Vec2, WaveSnapshot,
    };

    use super::{effective_range, fire_interval, Tower, World, WorldConfig};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Provides read-only access to the tower.
    #[must_use]
    pub fn tower(world: &World) -> &Tower {
        &world.tower
    }

    /// Spendable credits.
    #[must_use]
    pub fn credits(world: &World) -> u32 {
        world.ledger.credits
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.ledger.score
    }

    /// Upgrade levels purchased during the session.
    #[must_use]
    pub fn upgrades(world: &World) -> &UpgradeLevels {
        &world.upgrades
    }

    /// Reports whether the unit kind is available for placement.
    #[must_use]
    pub fn is_unlocked(world: &World, kind: UnitKind) -> bool {
        world.unlocked.contains(&kind)
    }

    /// Unit kind armed for placement, if any.
    #[must_use]
    pub fn placement(world: &World) -> Option<UnitKind> {
        world.placement
    }

    /// Last cursor position reported by the input layer.
    #[must_use]
    pub fn cursor(world: &World) -> Vec2 {
        world.cursor
    }

    /// Reports whether the tower has fallen.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }

    /// Simulated time elapsed since the session began.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed since the session began.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of chain lightning hops waiting to land.
    #[must_use]
    pub fn pending_effects(world: &World) -> usize {
        world.effects.len()
    }

    /// Captures the wave state machine.
    #[must_use]
    pub fn wave(world: &World) -> WaveSnapshot {
        WaveSnapshot {
            wave: world.wave.wave,
            phase: world.wave.phase,
            rest_elapsed: world.wave.rest_elapsed,
            spawn_elapsed: world.wave.spawn_elapsed,
            spawned: world.wave.spawned,
            quota: world.wave.quota,
            damage_taken: world.wave.damage_taken,
            enemies_alive: world.enemies.len(),
            game_over: world.game_over,
        }
    }

    /// Captures a read-only view of the placed units.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let snapshots = world
            .units
            .iter()
            .map(|unit| UnitSnapshot {
                id: unit.id,
                kind: unit.kind,
                position: unit.position,
                hp: unit.hp,
                max_hp: unit.max_hp,
                range: effective_range(unit.kind, &world.upgrades),
                ready: unit.ready(&world.upgrades),
            })
            .collect();
        UnitView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of the live enemies in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .filter(|enemy| enemy.alive)
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                hp: enemy.hp,
                max_hp: enemy.max_hp,
                size: enemy.size,
                boss: enemy.kind.is_boss(),
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Runs the placement checks without placing anything.
    pub fn check_placement(
        world: &World,
        kind: UnitKind,
        position: Vec2,
    ) -> Result<(), PlacementError> {
        world
            .check_placement(kind)
            .and_then(|()| world.check_site(kind, position))
    }

    /// Effective time between shots for a unit kind under current upgrades.
    #[must_use]
    pub fn fire_interval_of(world: &World, kind: UnitKind) -> Duration {
        fire_interval(kind, &world.upgrades)
    }

    /// Effective targeting range for a unit kind under current upgrades.
    #[must_use]
    pub fn range_of(world: &World, kind: UnitKind) -> f32 {
        effective_range(kind, &world.upgrades)
    }

    /// Immutable representation of a projectile in flight.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Current position.
        pub position: Vec2,
        /// Collision radius.
        pub size: f32,
        /// Tint inherited from the firing unit.
        pub color: Color,
    }

    /// Captures every projectile in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .active()
            .iter()
            .map(|projectile| ProjectileSnapshot {
                position: projectile.position,
                size: projectile.size,
                color: projectile.color,
            })
            .collect()
    }

    /// Immutable representation of a cosmetic particle.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ParticleSnapshot {
        /// Current position.
        pub position: Vec2,
        /// Rendered size.
        pub size: f32,
        /// Tint of the particle.
        pub color: Color,
        /// Remaining life as a fraction of the initial life.
        pub alpha: f32,
    }

    /// Captures every live particle.
    #[must_use]
    pub fn particles(world: &World) -> Vec<ParticleSnapshot> {
        world
            .particles
            .pool()
            .active()
            .iter()
            .map(|particle| ParticleSnapshot {
                position: particle.position,
                size: particle.size,
                color: particle.color,
                alpha: if particle.max_life == 0 {
                    0.0
                } else {
                    particle.life as f32 / particle.max_life as f32
                },
            })
            .collect()
    }

    /// Active and free counts of the projectile and particle pools.
    #[must_use]
    pub fn pool_usage(world: &World) -> PoolUsage {
        let particles = world.particles.pool();
        PoolUsage {
            projectiles_active: world.projectiles.active_count(),
            projectiles_free: world.projectiles.free_count(),
            particles_active: particles.active_count(),
            particles_free: particles.free_count(),
        }
    }

    /// Occupancy of the object pools backing ephemeral entities.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PoolUsage {
        /// Projectiles in flight.
        pub projectiles_active: usize,
        /// Projectiles waiting for reuse.
        pub projectiles_free: usize,
        /// Particles alive.
        pub particles_active: usize,
        /// Particles waiting for reuse.
        pub particles_free: usize,
    }

    /// Captures the fields that survive a save and load round trip.
    #[must_use]
    pub fn session_state(world: &World) -> SessionState {
        SessionState {
            wave: world.wave.wave,
            credits: world.ledger.credits,
            score: world.ledger.score,
            tower_hp: world.tower.hp,
            tower_max_hp: world.tower.max_hp,
            units: world
                .units
                .iter()
                .map(|unit| SavedUnit {
                    kind: unit.kind,
                    position: unit.position,
                    hp: unit.hp,
                })
                .collect(),
            upgrades: world.upgrades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(WorldConfig::default())
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn new_world_starts_idle_with_only_the_turret_unlocked() {
        let world = world();
        let wave = query::wave(&world);
        assert_eq!(wave.wave, 1);
        assert_eq!(wave.phase, WavePhase::Idle);
        assert_eq!(query::credits(&world), 1_000);
        assert!(query::is_unlocked(&world, UnitKind::PlasmaTurret));
        assert!(!query::is_unlocked(&world, UnitKind::LaserCannon));
        assert_eq!(query::tower(&world).position(), Vec2::new(600.0, 400.0));
    }

    #[test]
    fn spawning_moves_to_draining_once_quota_is_met() {
        let mut world = world();
        let events = run(&mut world, Command::StartWave);
        assert!(events.contains(&Event::WaveStarted {
            wave: 1,
            boss: false,
            quota: 9,
        }));

        for _ in 0..9 {
            let _ = run(
                &mut world,
                Command::SpawnEnemy {
                    kind: EnemyKind::Scout,
                    position: Vec2::new(0.0, 0.0),
                },
            );
        }
        assert_eq!(query::wave(&world).phase, WavePhase::Draining);

        let extra = run(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Scout,
                position: Vec2::new(0.0, 0.0),
            },
        );
        assert!(extra.is_empty());
        assert_eq!(query::enemy_view(&world).len(), 9);
    }

    #[test]
    fn complete_wave_requires_an_empty_field() {
        let mut world = world();
        let _ = run(&mut world, Command::StartWave);
        let _ = run(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Scout,
                position: Vec2::ZERO,
            },
        );
        assert!(run(&mut world, Command::CompleteWave).is_empty());
        assert_eq!(query::wave(&world).wave, 1);
    }

    #[test]
    fn placement_enforces_clearance_and_credits() {
        let mut world = world();
        let near_tower = run(
            &mut world,
            Command::PlaceUnit {
                kind: UnitKind::PlasmaTurret,
                position: Vec2::new(650.0, 400.0),
            },
        );
        assert_eq!(
            near_tower,
            vec![Event::PlacementRejected {
                kind: UnitKind::PlasmaTurret,
                reason: PlacementError::TooCloseToTower,
            }]
        );

        let locked = run(
            &mut world,
            Command::PlaceUnit {
                kind: UnitKind::Railgun,
                position: Vec2::new(300.0, 300.0),
            },
        );
        assert_eq!(
            locked,
            vec![Event::PlacementRejected {
                kind: UnitKind::Railgun,
                reason: PlacementError::Locked { unlock_wave: 8 },
            }]
        );

        let placed = run(
            &mut world,
            Command::PlaceUnit {
                kind: UnitKind::PlasmaTurret,
                position: Vec2::new(300.0, 300.0),
            },
        );
        assert!(matches!(placed.as_slice(), [Event::UnitPlaced { cost: 100, .. }]));
        assert_eq!(query::credits(&world), 900);
        assert_eq!(query::pool_usage(&world).particles_active, 10);

        let crowded = run(
            &mut world,
            Command::PlaceUnit {
                kind: UnitKind::PlasmaTurret,
                position: Vec2::new(320.0, 300.0),
            },
        );
        assert_eq!(
            crowded,
            vec![Event::PlacementRejected {
                kind: UnitKind::PlasmaTurret,
                reason: PlacementError::TooCloseToUnit,
            }]
        );
        assert_eq!(query::credits(&world), 900);
    }

    #[test]
    fn upgrade_purchase_checks_credits_and_level_cap() {
        let mut world = world();
        let bought = run(
            &mut world,
            Command::PurchaseUpgrade {
                upgrade: UpgradeKind::CreditBonus,
            },
        );
        assert_eq!(
            bought,
            vec![Event::UpgradePurchased {
                upgrade: UpgradeKind::CreditBonus,
                level: 1,
                cost: 300,
            }]
        );

        let second = run(
            &mut world,
            Command::PurchaseUpgrade {
                upgrade: UpgradeKind::CreditBonus,
            },
        );
        assert!(matches!(
            second.as_slice(),
            [Event::UpgradePurchased { level: 2, cost: 600, .. }]
        ));
        assert_eq!(query::upgrades(&world).credit_bonus, 2);
        assert_eq!(query::credits(&world), 100);

        let broke = run(
            &mut world,
            Command::PurchaseUpgrade {
                upgrade: UpgradeKind::DamageBoost,
            },
        );
        assert_eq!(
            broke,
            vec![Event::UpgradeRejected {
                upgrade: UpgradeKind::DamageBoost,
                reason: UpgradeError::InsufficientCredits {
                    required: 200,
                    available: 100,
                },
            }]
        );
        assert_eq!(query::credits(&world), 100);
    }

    #[test]
    fn maxed_upgrade_is_rejected_without_charging() {
        let mut world = world();
        let mut state = query::session_state(&world);
        state.upgrades.set(UpgradeKind::CreditBonus, 5);
        let _ = run(&mut world, Command::RestoreSession { state });

        let events = run(
            &mut world,
            Command::PurchaseUpgrade {
                upgrade: UpgradeKind::CreditBonus,
            },
        );
        assert_eq!(
            events,
            vec![Event::UpgradeRejected {
                upgrade: UpgradeKind::CreditBonus,
                reason: UpgradeError::MaxLevel { max: 5 },
            }]
        );
        assert_eq!(query::credits(&world), 1_000);
    }

    #[test]
    fn restart_twice_matches_restart_once() {
        let mut once = world();
        let mut twice = world();
        for world in [&mut once, &mut twice] {
            let _ = run(world, Command::StartWave);
            let _ = run(
                world,
                Command::SpawnEnemy {
                    kind: EnemyKind::Fighter,
                    position: Vec2::ZERO,
                },
            );
            let _ = run(
                world,
                Command::PlaceUnit {
                    kind: UnitKind::PlasmaTurret,
                    position: Vec2::new(200.0, 200.0),
                },
            );
        }

        let _ = run(&mut once, Command::Restart);
        let _ = run(&mut twice, Command::Restart);
        let _ = run(&mut twice, Command::Restart);

        assert_eq!(query::session_state(&once), query::session_state(&twice));
        assert_eq!(query::wave(&once), query::wave(&twice));
        assert_eq!(query::credits(&twice), 1_000);
        assert_eq!(query::score(&twice), 0);
        assert!(query::enemy_view(&twice).is_empty());
        assert!(query::unit_view(&twice).is_empty());
        assert!(query::particles(&twice).is_empty());
        assert!(query::projectiles(&twice).is_empty());
    }

    #[test]
    fn restore_refuses_a_fallen_tower() {
        let mut world = world();
        let before = query::session_state(&world);
        let mut state = before.clone();
        state.wave = 4;
        state.tower_hp = -5;

        let events = run(&mut world, Command::RestoreSession { state });

        assert!(events.is_empty());
        assert_eq!(query::session_state(&world), before);
        assert!(!query::is_game_over(&world));
    }

    #[test]
    fn restore_recomputes_unlocks_from_saved_wave() {
        let mut world = world();
        let mut state = query::session_state(&world);
        state.wave = 9;
        state.credits = 40;
        state.units.push(orbital_defence_core::SavedUnit {
            kind: UnitKind::LaserCannon,
            position: Vec2::new(100.0, 100.0),
            hp: 12,
        });

        let events = run(&mut world, Command::RestoreSession { state: state.clone() });

        assert!(events.contains(&Event::UnitUnlocked {
            kind: UnitKind::Railgun
        }));
        assert!(!query::is_unlocked(&world, UnitKind::TeslaCoil));
        assert_eq!(query::session_state(&world), state);
        assert_eq!(query::wave(&world).phase, WavePhase::Idle);
    }
}
