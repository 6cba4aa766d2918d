//! Cosmetic particle bursts backed by an object pool.

use orbital_defence_core::{Color, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ObjectPool;

pub(crate) const HIT_PARTICLES: usize = 5;
pub(crate) const KILL_PARTICLES: usize = 15;
pub(crate) const EXPLOSION_PARTICLES: usize = 25;
pub(crate) const CONTACT_PARTICLES: usize = 20;
pub(crate) const PLACEMENT_PARTICLES: usize = 10;

const MAX_COMPONENT_SPEED: f32 = 4.0;
const MIN_SIZE: f32 = 1.0;
const MAX_SIZE: f32 = 5.0;
const MIN_LIFE: u32 = 20;
const MAX_LIFE: u32 = 50;

/// Pooled cosmetic particle.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Particle {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) life: u32,
    pub(crate) max_life: u32,
    pub(crate) size: f32,
    pub(crate) color: Color,
}

impl Particle {
    fn blank() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            life: 0,
            max_life: 0,
            size: 0.0,
            color: Color::from_rgb(0, 0, 0),
        }
    }

    fn clear(&mut self) {
        *self = Self::blank();
    }
}

#[derive(Debug)]
pub(crate) struct ParticleField {
    pool: ObjectPool<Particle>,
    rng: ChaCha8Rng,
    seed: u64,
}

impl ParticleField {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            pool: ObjectPool::new(Particle::blank, Particle::clear),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Emits `count` particles scattering away from `position`.
    pub(crate) fn burst(&mut self, position: Vec2, color: Color, count: usize) {
        for _ in 0..count {
            let velocity = Vec2::new(
                self.rng
                    .gen_range(-MAX_COMPONENT_SPEED..MAX_COMPONENT_SPEED),
                self.rng
                    .gen_range(-MAX_COMPONENT_SPEED..MAX_COMPONENT_SPEED),
            );
            let size = self.rng.gen_range(MIN_SIZE..MAX_SIZE);
            let life = self.rng.gen_range(MIN_LIFE..MAX_LIFE);
            let particle = self.pool.acquire();
            particle.position = position;
            particle.velocity = velocity;
            particle.life = life;
            particle.max_life = life;
            particle.size = size;
            particle.color = color;
        }
    }

    /// Moves every particle by `frames` reference frames and ages it by one tick.
    pub(crate) fn advance(&mut self, frames: f32) {
        let _ = self.pool.release_if(|particle| {
            particle.position += particle.velocity * frames;
            particle.life = particle.life.saturating_sub(1);
            particle.life == 0
        });
    }

    /// Returns every particle to the pool and rewinds the random stream.
    pub(crate) fn reset(&mut self) {
        let _ = self.pool.release_all();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    pub(crate) fn pool(&self) -> &ObjectPool<Particle> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_respect_configured_ranges() {
        let mut field = ParticleField::new(7);
        field.burst(Vec2::new(10.0, 20.0), Color::from_rgb(1, 2, 3), KILL_PARTICLES);

        assert_eq!(field.pool().active_count(), KILL_PARTICLES);
        for particle in field.pool().active() {
            assert!(particle.velocity.x >= -4.0 && particle.velocity.x < 4.0);
            assert!(particle.size >= 1.0 && particle.size < 5.0);
            assert!((20..50).contains(&particle.life));
            assert_eq!(particle.life, particle.max_life);
        }
    }

    #[test]
    fn particles_expire_and_return_to_pool() {
        let mut field = ParticleField::new(3);
        field.burst(Vec2::ZERO, Color::from_rgb(9, 9, 9), HIT_PARTICLES);
        for _ in 0..MAX_LIFE {
            field.advance(1.0);
        }
        assert_eq!(field.pool().active_count(), 0);
        assert_eq!(field.pool().free_count(), HIT_PARTICLES);
    }

    #[test]
    fn reset_rewinds_the_random_stream() {
        let mut field = ParticleField::new(11);
        field.burst(Vec2::ZERO, Color::from_rgb(0, 0, 0), 1);
        let first = field.pool().active()[0].velocity;
        field.reset();
        field.burst(Vec2::ZERO, Color::from_rgb(0, 0, 0), 1);
        assert_eq!(field.pool().active()[0].velocity, first);
    }
}
