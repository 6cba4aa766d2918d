#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director that drives the wave lifecycle by emitting world commands.

use std::time::Duration;

use orbital_defence_core::{
    is_boss_wave, regular_kind_for_roll, Command, EnemyKind, Event, Vec2, WavePhase, WaveSnapshot,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the wave director.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    map_size: Vec2,
    wave_delay: Duration,
    spawn_interval: Duration,
    rng_seed: u64,
    launch_first_wave: bool,
}

impl Config {
    /// Creates a new configuration for a map of the provided size.
    #[must_use]
    pub const fn new(
        map_size: Vec2,
        wave_delay: Duration,
        spawn_interval: Duration,
        rng_seed: u64,
    ) -> Self {
        Self {
            map_size,
            wave_delay,
            spawn_interval,
            rng_seed,
            launch_first_wave: true,
        }
    }

    /// Controls whether a fresh session starts its first wave without the rest delay.
    #[must_use]
    pub const fn with_launch_first_wave(mut self, launch: bool) -> Self {
        self.launch_first_wave = launch;
        self
    }
}

/// Pure system that decides when waves start, spawn, and complete.
#[derive(Debug)]
pub struct WaveDirector {
    config: Config,
    rng: ChaCha8Rng,
    launch_pending: bool,
}

impl WaveDirector {
    /// Creates a new wave director using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            launch_pending: config.launch_first_wave,
            config,
        }
    }

    /// Consumes the events of a tick and the wave snapshot to emit wave commands.
    ///
    /// The director only acts on ticks that advanced time, so command-only
    /// batches such as placements never start or spawn anything.
    pub fn handle(&mut self, events: &[Event], wave: &WaveSnapshot, out: &mut Vec<Command>) {
        let mut advanced = false;
        for event in events {
            match event {
                Event::TimeAdvanced { .. } => advanced = true,
                Event::SessionReset => {
                    self.rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed);
                    self.launch_pending = self.config.launch_first_wave;
                }
                Event::SessionRestored { .. } => self.launch_pending = false,
                _ => {}
            }
        }

        if !advanced || wave.game_over {
            return;
        }

        match wave.phase {
            WavePhase::Idle => {
                if self.launch_pending || wave.rest_elapsed >= self.config.wave_delay {
                    self.launch_pending = false;
                    out.push(Command::StartWave);
                    out.push(self.spawn_command(wave.wave));
                }
            }
            WavePhase::Spawning => {
                if wave.spawned < wave.quota && wave.spawn_elapsed >= self.config.spawn_interval {
                    out.push(self.spawn_command(wave.wave));
                }
            }
            WavePhase::Draining | WavePhase::BossActive => {
                if wave.enemies_alive == 0 && wave.spawned >= wave.quota {
                    out.push(Command::CompleteWave);
                }
            }
        }
    }

    /// Time remaining before the next wave launches while idle.
    #[must_use]
    pub fn time_to_next_wave(&self, wave: &WaveSnapshot) -> Option<Duration> {
        if wave.phase != WavePhase::Idle {
            return None;
        }
        if self.launch_pending {
            return Some(Duration::ZERO);
        }
        Some(self.config.wave_delay.saturating_sub(wave.rest_elapsed))
    }

    fn spawn_command(&mut self, wave: u32) -> Command {
        let width = self.config.map_size.x;
        let height = self.config.map_size.y;

        if is_boss_wave(wave) {
            return Command::SpawnEnemy {
                kind: EnemyKind::Boss,
                position: Vec2::new(width / 2.0, 0.0),
            };
        }

        let kind = regular_kind_for_roll(self.rng.gen::<f64>(), wave);
        let along: f32 = self.rng.gen();
        let position = match self.rng.gen_range(0..4_u8) {
            0 => Vec2::new(along * width, 0.0),
            1 => Vec2::new(width, along * height),
            2 => Vec2::new(along * width, height),
            _ => Vec2::new(0.0, along * height),
        };
        Command::SpawnEnemy { kind, position }
    }
}
