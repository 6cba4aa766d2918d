#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session glue that drives the world and its systems once per frame.
//!
//! A [`Session`] owns the authoritative [`World`] together with the pure
//! systems that read it. Every frame the session clamps and scales the
//! wall-clock delta, advances the world clock, lets the wave director,
//! targeting and firing systems issue commands, resolves projectiles and
//! particles, and finally hands the tick's events to the achievement
//! tracker. Player requests enter through the command methods and are
//! answered with typed rejections.

mod clock;
mod config;
mod view;

use std::{
    io,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use orbital_defence_core::{
    AchievementId, AchievementSet, Command, Event, PlacementError, SpeedError, UnitId, UnitKind,
    UnitTarget, UpgradeError, UpgradeKind, Vec2,
};
use orbital_defence_persistence::{
    AchievementStore, DecodeError, EncodeError, SaveStore, SavedSession,
};
use orbital_defence_system_achievements::AchievementTracker;
use orbital_defence_system_firing::UnitFiring;
use orbital_defence_system_targeting::UnitTargeting;
use orbital_defence_system_waves::WaveDirector;
use orbital_defence_world::{self as world, query, World};
use thiserror::Error;

pub use clock::SimulationClock;
pub use config::{ConfigError, SessionConfig};
pub use view::{
    CatalogEntry, PlacementPreview, Scene, SceneEnemy, SceneTower, SceneUnit, Summary,
    UpgradeEntry, WavePreview,
};

/// A running game: world state, systems, clock and achievement persistence.
#[derive(Debug)]
pub struct Session<A: AchievementStore> {
    config: SessionConfig,
    world: World,
    clock: SimulationClock,
    director: WaveDirector,
    targeting: UnitTargeting,
    firing: UnitFiring,
    tracker: AchievementTracker,
    achievement_store: A,
    unit_targets: Vec<UnitTarget>,
    commands: Vec<Command>,
}

impl<A: AchievementStore> Session<A> {
    /// Creates a session, seeding the tracker from the achievement store.
    ///
    /// A corrupt achievement store is logged and treated as empty.
    pub fn new(config: SessionConfig, achievement_store: A) -> Result<Self, ConfigError> {
        config.validate()?;

        let unlocked = achievement_store.load().unwrap_or_else(|error| {
            tracing::warn!(%error, "discarding unreadable achievements");
            AchievementSet::new()
        });

        tracing::info!(seed = config.seed, "session created");
        Ok(Self {
            world: World::new(config.world_config()),
            clock: SimulationClock::new(config.max_frame_delta()),
            director: WaveDirector::new(config.director_config()),
            targeting: UnitTargeting::new(),
            firing: UnitFiring::new(),
            tracker: AchievementTracker::new(unlocked),
            achievement_store,
            unit_targets: Vec::new(),
            commands: Vec::new(),
            config,
        })
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Authoritative world, for read-only queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Pause and speed state.
    #[must_use]
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Achievements unlocked so far, including persisted ones.
    #[must_use]
    pub fn achievements(&self) -> &AchievementSet {
        self.tracker.unlocked()
    }

    /// Store that receives every new unlock.
    #[must_use]
    pub fn achievement_store(&self) -> &A {
        &self.achievement_store
    }

    /// Runs one tick for the provided wall-clock frame delta.
    ///
    /// Returns every event the tick produced. Paused or ended sessions
    /// produce nothing.
    pub fn advance(&mut self, frame: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        if query::is_game_over(&self.world) {
            return events;
        }
        let Some(dt) = self.clock.scaled(frame) else {
            return events;
        };

        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        self.director
            .handle(&events, &query::wave(&self.world), &mut self.commands);
        self.flush_commands(&mut events);

        world::apply(&mut self.world, Command::AdvanceEnemies { dt }, &mut events);

        let units = query::unit_view(&self.world);
        self.targeting.handle(
            &units,
            &query::enemy_view(&self.world),
            &mut self.unit_targets,
        );
        self.firing.handle(
            &query::wave(&self.world),
            &units,
            &self.unit_targets,
            &mut self.commands,
        );
        self.flush_commands(&mut events);

        world::apply(
            &mut self.world,
            Command::AdvanceProjectiles { dt },
            &mut events,
        );
        world::apply(&mut self.world, Command::AdvanceParticles { dt }, &mut events);

        self.track_achievements(&mut events);
        events
    }

    /// Arms placement of the provided unit kind.
    pub fn select_unit(&mut self, kind: UnitKind) -> Result<(), PlacementError> {
        let events = self.submit(Command::SelectUnit { kind });
        match placement_rejection(&events) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Moves the placement ghost.
    pub fn move_cursor(&mut self, position: Vec2) {
        let _ = self.submit(Command::MoveCursor { position });
    }

    /// Disarms placement.
    pub fn cancel_placement(&mut self) {
        let _ = self.submit(Command::CancelPlacement);
    }

    /// Places a unit of the provided kind at the provided position.
    pub fn place_unit(&mut self, kind: UnitKind, position: Vec2) -> Result<UnitId, PlacementError> {
        let events = self.submit(Command::PlaceUnit { kind, position });
        if let Some(reason) = placement_rejection(&events) {
            tracing::debug!(?kind, %reason, "placement rejected");
            return Err(reason);
        }
        events
            .iter()
            .find_map(|event| match event {
                Event::UnitPlaced { unit, .. } => Some(*unit),
                _ => None,
            })
            .ok_or(PlacementError::SessionEnded)
    }

    /// Places the armed unit kind at the clicked position.
    pub fn click(&mut self, position: Vec2) -> Result<UnitId, PlacementError> {
        if query::is_game_over(&self.world) {
            return Err(PlacementError::SessionEnded);
        }
        let kind = query::placement(&self.world).ok_or(PlacementError::NothingSelected)?;
        self.place_unit(kind, position)
    }

    /// Buys the next level of an upgrade and returns the new level.
    pub fn purchase_upgrade(&mut self, upgrade: UpgradeKind) -> Result<u32, UpgradeError> {
        let events = self.submit(Command::PurchaseUpgrade { upgrade });
        for event in &events {
            match event {
                Event::UpgradePurchased { level, .. } => return Ok(*level),
                Event::UpgradeRejected { reason, .. } => return Err(*reason),
                _ => {}
            }
        }
        Ok(query::upgrades(&self.world).level(upgrade))
    }

    /// Flips the pause flag and returns the new value. Ignored once the tower has fallen.
    pub fn toggle_pause(&mut self) -> bool {
        if query::is_game_over(&self.world) {
            return self.clock.is_paused();
        }
        self.clock.toggle_pause()
    }

    /// Changes the game speed multiplier.
    pub fn set_speed(&mut self, speed: u32) -> Result<(), SpeedError> {
        self.clock.set_speed(speed)
    }

    /// Starts over from wave one at normal speed. Persisted achievements are kept.
    pub fn restart(&mut self) -> Vec<Event> {
        self.clock.resume();
        self.clock.reset_speed();
        self.submit(Command::Restart)
    }

    /// Writes the current session into the save store.
    pub fn save(&self, store: &mut dyn SaveStore) -> Result<(), SaveError> {
        let saved = SavedSession {
            saved_at_ms: unix_millis(),
            state: query::session_state(&self.world),
        };
        store.write(&saved.encode()?)?;
        tracing::info!(wave = saved.state.wave, credits = saved.state.credits, "session saved");
        Ok(())
    }

    /// Replaces the session with the contents of the save store.
    ///
    /// On failure the session is left exactly as it was.
    pub fn load(&mut self, store: &dyn SaveStore) -> Result<Vec<Event>, LoadError> {
        let saved = match read_save(store) {
            Ok(saved) => saved,
            Err(error) => {
                tracing::warn!(%error, "load rejected");
                return Err(error);
            }
        };

        self.clock.resume();
        let events = self.submit(Command::RestoreSession { state: saved.state });
        tracing::info!(saved_at_ms = saved.saved_at_ms, "session loaded");
        Ok(events)
    }

    /// Snapshot of everything the render collaborator draws.
    #[must_use]
    pub fn scene(&self) -> Scene {
        let tower = query::tower(&self.world);
        let units = query::unit_view(&self.world)
            .iter()
            .map(|unit| {
                let archetype = unit.kind.archetype();
                SceneUnit {
                    id: unit.id,
                    kind: unit.kind,
                    position: unit.position,
                    size: archetype.size,
                    shape: archetype.shape,
                    color: archetype.color,
                    range: unit.range,
                }
            })
            .collect();
        let enemies = query::enemy_view(&self.world)
            .iter()
            .map(|enemy| SceneEnemy {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                size: enemy.size,
                color: enemy.kind.archetype().color,
                hp_fraction: if enemy.max_hp > 0 {
                    (enemy.hp as f32 / enemy.max_hp as f32).clamp(0.0, 1.0)
                } else {
                    0.0
                },
                boss: enemy.boss,
            })
            .collect();
        let placement = query::placement(&self.world).map(|kind| {
            let position = query::cursor(&self.world);
            PlacementPreview {
                kind,
                position,
                range: query::range_of(&self.world, kind),
                rejection: query::check_placement(&self.world, kind, position).err(),
            }
        });

        Scene {
            tower: SceneTower {
                position: tower.position(),
                radius: tower.radius(),
                hp: tower.hp().max(0),
                max_hp: tower.max_hp(),
            },
            units,
            enemies,
            projectiles: query::projectiles(&self.world),
            particles: query::particles(&self.world),
            placement,
            paused: self.clock.is_paused(),
            game_over: query::is_game_over(&self.world),
        }
    }

    /// Figures and listings for the UI collaborator.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let wave = query::wave(&self.world);
        let credits = query::credits(&self.world);
        let upgrades = query::upgrades(&self.world);
        let tower = query::tower(&self.world);
        let game_over = query::is_game_over(&self.world);

        let seconds_to_next_wave = if game_over {
            None
        } else {
            self.director
                .time_to_next_wave(&wave)
                .map(|remaining| (remaining.as_millis() as u64).saturating_add(999) / 1_000)
        };

        Summary {
            wave: wave.wave,
            credits,
            score: query::score(&self.world),
            tower_hp: tower.hp().max(0),
            tower_max_hp: tower.max_hp(),
            seconds_to_next_wave,
            next_wave: WavePreview::new(wave.wave, upgrades.credit_bonus),
            speed: self.clock.speed(),
            paused: self.clock.is_paused(),
            game_over,
            catalog: UnitKind::ALL
                .into_iter()
                .map(|kind| {
                    let archetype = kind.archetype();
                    CatalogEntry {
                        kind,
                        name: archetype.name,
                        cost: archetype.cost,
                        unlock_wave: archetype.unlock_wave,
                        unlocked: query::is_unlocked(&self.world, kind),
                        affordable: credits >= archetype.cost,
                    }
                })
                .collect(),
            upgrades: UpgradeKind::ALL
                .into_iter()
                .map(|kind| UpgradeEntry {
                    kind,
                    label: kind.label(),
                    description: kind.description(),
                    level: upgrades.level(kind),
                    max_level: kind.max_level(),
                    next_cost: upgrades.next_cost(kind),
                })
                .collect(),
            achievements: AchievementId::ALL
                .into_iter()
                .map(|achievement| (achievement, self.achievements().contains(achievement)))
                .collect(),
        }
    }

    /// Applies a player command outside the tick pipeline.
    ///
    /// The director still sees the events so resets and restores re-arm it.
    fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.director
            .handle(&events, &query::wave(&self.world), &mut self.commands);
        self.flush_commands(&mut events);
        events
    }

    fn flush_commands(&mut self, events: &mut Vec<Event>) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }

    fn track_achievements(&mut self, events: &mut Vec<Event>) {
        let mut unlocked = Vec::new();
        self.tracker.handle(events, &mut unlocked);
        if unlocked.is_empty() {
            return;
        }

        if let Err(error) = self.achievement_store.store(self.tracker.unlocked()) {
            tracing::warn!(%error, "could not persist achievements");
        }
        events.extend(unlocked);
    }
}

/// Reasons a save could not be written.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The session could not be serialised.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The store refused the blob.
    #[error("could not write save: {0}")]
    Store(#[from] io::Error),
}

/// Reasons a save could not be loaded. The session is untouched in every case.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The store holds no save.
    #[error("no saved session")]
    Missing,
    /// The store could not be read.
    #[error("could not read save: {0}")]
    Store(#[from] io::Error),
    /// The blob is corrupt or holds values the session cannot accept.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

fn read_save(store: &dyn SaveStore) -> Result<SavedSession, LoadError> {
    let blob = store.read()?.ok_or(LoadError::Missing)?;
    Ok(SavedSession::decode(&blob)?)
}

fn placement_rejection(events: &[Event]) -> Option<PlacementError> {
    events.iter().find_map(|event| match event {
        Event::PlacementRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_defence_persistence::{MemoryAchievementStore, MemorySaveStore};

    fn session() -> Session<MemoryAchievementStore> {
        Session::new(SessionConfig::default(), MemoryAchievementStore::new())
            .expect("default config is valid")
    }

    #[test]
    fn click_without_selection_is_rejected() {
        let mut session = session();
        assert_eq!(
            session.click(Vec2::new(200.0, 200.0)),
            Err(PlacementError::NothingSelected)
        );
    }

    #[test]
    fn click_places_the_armed_unit_and_disarms() {
        let mut session = session();
        session
            .select_unit(UnitKind::PlasmaTurret)
            .expect("turret is unlocked");

        let unit = session.click(Vec2::new(200.0, 200.0)).expect("placement");

        assert_eq!(unit, UnitId::new(0));
        assert_eq!(query::credits(session.world()), 900);
        assert_eq!(query::placement(session.world()), None);
    }

    #[test]
    fn locked_units_cannot_be_selected() {
        let mut session = session();
        assert_eq!(
            session.select_unit(UnitKind::Railgun),
            Err(PlacementError::Locked { unlock_wave: 8 })
        );
    }

    #[test]
    fn preview_reports_rejection_under_the_cursor() {
        let mut session = session();
        session
            .select_unit(UnitKind::PlasmaTurret)
            .expect("turret is unlocked");
        session.move_cursor(Vec2::new(610.0, 400.0));

        let preview = session.scene().placement.expect("placement armed");
        assert_eq!(preview.rejection, Some(PlacementError::TooCloseToTower));
        assert_eq!(preview.range, 120.0);

        session.cancel_placement();
        assert!(session.scene().placement.is_none());
    }

    #[test]
    fn upgrade_purchase_reports_level_or_rejection() {
        let mut session = session();
        assert_eq!(session.purchase_upgrade(UpgradeKind::DamageBoost), Ok(1));
        assert_eq!(session.purchase_upgrade(UpgradeKind::DamageBoost), Ok(2));
        assert_eq!(
            session.purchase_upgrade(UpgradeKind::DamageBoost),
            Err(UpgradeError::InsufficientCredits {
                required: 600,
                available: 400,
            })
        );
    }

    #[test]
    fn paused_sessions_do_not_advance() {
        let mut session = session();
        assert!(session.toggle_pause());

        assert!(session.advance(Duration::from_millis(16)).is_empty());
        assert_eq!(query::tick_index(session.world()), 0);

        assert!(!session.toggle_pause());
        assert!(!session.advance(Duration::from_millis(16)).is_empty());
        assert_eq!(query::tick_index(session.world()), 1);
    }

    #[test]
    fn speed_scales_the_clamped_frame() {
        let mut session = session();
        session.set_speed(4).expect("speed in range");

        let _ = session.advance(Duration::from_millis(500));

        assert_eq!(query::clock(session.world()), Duration::from_millis(256));
        assert_eq!(session.set_speed(9), Err(SpeedError { requested: 9 }));
        assert_eq!(session.clock().speed(), 4);
    }

    #[test]
    fn missing_save_is_reported() {
        let mut session = session();
        assert!(matches!(
            session.load(&MemorySaveStore::new()),
            Err(LoadError::Missing)
        ));
    }

    #[test]
    fn summary_counts_down_whole_seconds() {
        let config = SessionConfig {
            launch_first_wave: false,
            ..SessionConfig::default()
        };
        let mut session =
            Session::new(config, MemoryAchievementStore::new()).expect("config is valid");
        assert_eq!(session.summary().seconds_to_next_wave, Some(15));

        let _ = session.advance(Duration::from_millis(16));
        assert_eq!(session.summary().seconds_to_next_wave, Some(15));

        for _ in 0..16 {
            let _ = session.advance(Duration::from_millis(64));
        }
        assert_eq!(session.summary().seconds_to_next_wave, Some(14));
    }

    #[test]
    fn summary_lists_catalog_and_upgrades() {
        let session = session();
        let summary = session.summary();

        assert_eq!(summary.catalog.len(), UnitKind::ALL.len());
        assert!(summary.catalog[0].unlocked && summary.catalog[0].affordable);
        assert!(!summary.catalog[4].unlocked);
        assert_eq!(summary.upgrades[3].next_cost, Some(300));
        assert_eq!(summary.upgrades[0].description, "+10% damage / level");
        assert_eq!(summary.next_wave.quota, 9);
        assert!(summary.achievements.iter().all(|(_, unlocked)| !unlocked));
    }
}
