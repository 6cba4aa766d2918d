//! Projectile flight, collision, and damage resolution.

use std::time::Duration;

use orbital_defence_core::{
    Color, EnemyId, EnemyKind, EnemyStats, Event, ProjectileEffect, Vec2,
};

use crate::{
    effects::{ChainHop, ChainParams, EffectQueue},
    particles::{ParticleField, EXPLOSION_PARTICLES, HIT_PARTICLES, KILL_PARTICLES},
};

/// Number of ticks a projectile stays in flight before it expires.
pub(crate) const PROJECTILE_LIFETIME: u32 = 120;

/// Enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Vec2,
    pub(crate) hp: i32,
    pub(crate) max_hp: i32,
    pub(crate) speed: f32,
    pub(crate) damage: u32,
    pub(crate) reward: u32,
    pub(crate) size: f32,
    pub(crate) alive: bool,
}

impl Enemy {
    pub(crate) fn spawn(id: EnemyId, position: Vec2, stats: EnemyStats) -> Self {
        Self {
            id,
            kind: stats.kind,
            position,
            hp: stats.hit_points,
            max_hp: stats.hit_points,
            speed: stats.speed,
            damage: stats.damage,
            reward: stats.reward,
            size: stats.size,
            alive: true,
        }
    }

    pub(crate) fn color(&self) -> Color {
        self.kind.archetype().color
    }
}

/// Pooled projectile.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Projectile {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) damage: u32,
    pub(crate) effect: ProjectileEffect,
    pub(crate) size: f32,
    pub(crate) life: u32,
    pub(crate) color: Color,
}

impl Projectile {
    pub(crate) fn blank() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            damage: 0,
            effect: ProjectileEffect::Direct,
            size: 0.0,
            life: 0,
            color: Color::from_rgb(0, 0, 0),
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::blank();
    }
}

/// Spendable credits and accumulated score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ledger {
    pub(crate) credits: u32,
    pub(crate) score: u64,
}

impl Ledger {
    /// Credits `amount` and adds twice that much to the score.
    pub(crate) fn reward(&mut self, amount: u32) {
        self.credits = self.credits.saturating_add(amount);
        self.score = self.score.saturating_add(u64::from(amount) * 2);
    }
}

/// Borrowed view over the world fields touched while resolving damage.
pub(crate) struct Resolver<'a> {
    pub(crate) enemies: &'a mut [Enemy],
    pub(crate) ledger: &'a mut Ledger,
    pub(crate) particles: &'a mut ParticleField,
    pub(crate) effects: &'a mut EffectQueue,
    pub(crate) now: Duration,
    pub(crate) out_events: &'a mut Vec<Event>,
}

impl Resolver<'_> {
    /// Advances a projectile and resolves its first collision.
    ///
    /// Returns `true` when the projectile expired or was consumed.
    pub(crate) fn advance_projectile(&mut self, projectile: &mut Projectile, frames: f32) -> bool {
        projectile.position += projectile.velocity * frames;
        projectile.life = projectile.life.saturating_sub(1);
        if projectile.life == 0 {
            return true;
        }

        let Some(index) = self.enemies.iter().position(|enemy| {
            enemy.alive && enemy.position.distance(projectile.position) < enemy.size + projectile.size
        }) else {
            return false;
        };

        match projectile.effect {
            ProjectileEffect::Direct => {
                self.strike(index, projectile.damage);
                true
            }
            ProjectileEffect::Piercing => {
                self.strike(index, projectile.damage);
                false
            }
            ProjectileEffect::Explosive { radius } => {
                self.explode(projectile.position, radius, projectile.damage, projectile.color);
                true
            }
            ProjectileEffect::Chain {
                max_hops,
                falloff,
                range,
                delay,
            } => {
                let params = ChainParams {
                    max_hops,
                    falloff,
                    range,
                    delay,
                };
                let origin = self.enemies[index].position;
                let struck = self.enemies[index].id;
                self.strike(index, projectile.damage);
                if max_hops > 1 {
                    self.schedule_hop(origin, vec![struck], projectile.damage, 2, params);
                }
                true
            }
        }
    }

    /// Applies a due chain hop, scheduling the next one when eligible.
    ///
    /// A hop aimed at an enemy that is no longer alive ends the chain.
    pub(crate) fn land_hop(&mut self, hop: ChainHop) {
        let Some(index) = self
            .enemies
            .iter()
            .position(|enemy| enemy.alive && enemy.id == hop.target)
        else {
            return;
        };

        let origin = self.enemies[index].position;
        self.strike(index, hop.damage());
        if !hop.is_last() {
            self.schedule_hop(
                origin,
                hop.visited,
                hop.base_damage,
                hop.hop + 1,
                hop.params,
            );
        }
    }

    fn schedule_hop(
        &mut self,
        origin: Vec2,
        mut visited: Vec<EnemyId>,
        base_damage: u32,
        hop: u32,
        params: ChainParams,
    ) {
        let mut nearest: Option<(EnemyId, f32)> = None;
        for enemy in self.enemies.iter() {
            if !enemy.alive || visited.contains(&enemy.id) {
                continue;
            }
            let distance = enemy.position.distance(origin);
            if distance >= params.range {
                continue;
            }
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((enemy.id, distance)),
            }
        }

        let Some((target, _)) = nearest else {
            return;
        };

        visited.push(target);
        let scheduled = ChainHop {
            target,
            base_damage,
            hop,
            params,
            visited,
            due: self.now.saturating_add(params.delay),
        };
        self.out_events.push(Event::ChainHopScheduled {
            target,
            damage: scheduled.damage(),
            due: scheduled.due,
        });
        self.effects.schedule(scheduled);
    }

    fn explode(&mut self, center: Vec2, radius: f32, damage: u32, color: Color) {
        self.particles.burst(center, color, EXPLOSION_PARTICLES);
        for index in 0..self.enemies.len() {
            let enemy = &self.enemies[index];
            if !enemy.alive {
                continue;
            }
            let distance = enemy.position.distance(center);
            if distance >= radius {
                continue;
            }
            let splash = splash_damage(damage, distance, radius);
            self.damage(index, splash);
        }
    }

    fn strike(&mut self, index: usize, damage: u32) {
        let position = self.enemies[index].position;
        let color = self.enemies[index].color();
        self.particles.burst(position, color, HIT_PARTICLES);
        self.damage(index, damage);
    }

    fn damage(&mut self, index: usize, amount: u32) {
        let enemy = &mut self.enemies[index];
        enemy.hp = enemy
            .hp
            .saturating_sub(i32::try_from(amount).unwrap_or(i32::MAX));
        self.out_events.push(Event::EnemyDamaged {
            enemy: enemy.id,
            amount,
            remaining: enemy.hp,
        });
        if enemy.hp > 0 {
            return;
        }

        enemy.alive = false;
        let (id, kind, reward, position) = (enemy.id, enemy.kind, enemy.reward, enemy.position);
        let color = enemy.color();
        self.ledger.reward(reward);
        self.particles.burst(position, color, KILL_PARTICLES);
        tracing::debug!(enemy = id.get(), ?kind, reward, score = self.ledger.score, "enemy destroyed");
        self.out_events.push(Event::EnemyDestroyed {
            enemy: id,
            kind,
            boss: kind.is_boss(),
            reward,
            score: self.ledger.score,
        });
    }
}

/// Splash damage dealt at `distance` from the impact point.
pub(crate) fn splash_damage(damage: u32, distance: f32, radius: f32) -> u32 {
    let falloff = 1.0 - f64::from(distance) / f64::from(radius);
    let scaled = (f64::from(damage) * falloff).round();
    if scaled < 1.0 {
        1
    } else {
        scaled.min(f64::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_defence_core::{UpgradeLevels, CHAIN_DELAY, CHAIN_FALLOFF, CHAIN_RANGE, EXPLOSION_RADIUS};

    struct Fixture {
        enemies: Vec<Enemy>,
        ledger: Ledger,
        particles: ParticleField,
        effects: EffectQueue,
        events: Vec<Event>,
    }

    impl Fixture {
        fn new(positions: &[(f32, f32)]) -> Self {
            let stats = EnemyStats::scaled(EnemyKind::Heavy, 1, &UpgradeLevels::default());
            let enemies = positions
                .iter()
                .enumerate()
                .map(|(index, (x, y))| {
                    Enemy::spawn(EnemyId::new(index as u32), Vec2::new(*x, *y), stats)
                })
                .collect();
            Self {
                enemies,
                ledger: Ledger {
                    credits: 0,
                    score: 0,
                },
                particles: ParticleField::new(1),
                effects: EffectQueue::new(),
                events: Vec::new(),
            }
        }

        fn resolver(&mut self) -> Resolver<'_> {
            Resolver {
                enemies: &mut self.enemies,
                ledger: &mut self.ledger,
                particles: &mut self.particles,
                effects: &mut self.effects,
                now: Duration::ZERO,
                out_events: &mut self.events,
            }
        }
    }

    fn projectile(at: Vec2, damage: u32, effect: ProjectileEffect) -> Projectile {
        Projectile {
            position: at,
            velocity: Vec2::ZERO,
            damage,
            effect,
            size: 3.0,
            life: PROJECTILE_LIFETIME,
            color: Color::from_rgb(255, 255, 255),
        }
    }

    #[test]
    fn splash_damage_falls_off_linearly_with_floor_of_one() {
        assert_eq!(splash_damage(80, 0.0, EXPLOSION_RADIUS), 80);
        assert_eq!(splash_damage(80, 40.0, EXPLOSION_RADIUS), 40);
        assert_eq!(splash_damage(80, 79.9, EXPLOSION_RADIUS), 1);
    }

    #[test]
    fn explosive_damages_every_enemy_inside_radius() {
        let mut fixture = Fixture::new(&[(0.0, 0.0), (40.0, 0.0), (80.0, 0.0)]);
        let mut shot = projectile(
            Vec2::ZERO,
            80,
            ProjectileEffect::Explosive {
                radius: EXPLOSION_RADIUS,
            },
        );

        assert!(fixture.resolver().advance_projectile(&mut shot, 1.0));

        assert_eq!(fixture.enemies[0].hp, 120 - 80);
        assert_eq!(fixture.enemies[1].hp, 120 - 40);
        assert_eq!(fixture.enemies[2].hp, 120);
    }

    #[test]
    fn piercing_projectile_survives_the_hit() {
        let mut fixture = Fixture::new(&[(0.0, 0.0)]);
        let mut shot = projectile(Vec2::ZERO, 30, ProjectileEffect::Piercing);

        assert!(!fixture.resolver().advance_projectile(&mut shot, 1.0));
        assert_eq!(fixture.enemies[0].hp, 90);
    }

    #[test]
    fn expired_projectile_does_not_collide() {
        let mut fixture = Fixture::new(&[(0.0, 0.0)]);
        let mut shot = projectile(Vec2::ZERO, 30, ProjectileEffect::Direct);
        shot.life = 1;

        assert!(fixture.resolver().advance_projectile(&mut shot, 1.0));
        assert_eq!(fixture.enemies[0].hp, 120);
    }

    #[test]
    fn kill_credits_reward_and_double_score() {
        let mut fixture = Fixture::new(&[(0.0, 0.0)]);
        let mut shot = projectile(Vec2::ZERO, 500, ProjectileEffect::Direct);

        assert!(fixture.resolver().advance_projectile(&mut shot, 1.0));

        assert!(!fixture.enemies[0].alive);
        assert_eq!(fixture.ledger.credits, 70);
        assert_eq!(fixture.ledger.score, 140);
        assert!(fixture.events.iter().any(|event| matches!(
            event,
            Event::EnemyDestroyed { reward: 70, score: 140, .. }
        )));
    }

    #[test]
    fn chain_hit_schedules_nearest_unvisited_enemy() {
        let mut fixture = Fixture::new(&[(0.0, 0.0), (120.0, 0.0), (60.0, 0.0), (400.0, 0.0)]);
        let mut shot = projectile(
            Vec2::ZERO,
            100,
            ProjectileEffect::Chain {
                max_hops: 3,
                falloff: CHAIN_FALLOFF,
                range: CHAIN_RANGE,
                delay: CHAIN_DELAY,
            },
        );

        assert!(fixture.resolver().advance_projectile(&mut shot, 1.0));

        assert_eq!(fixture.enemies[0].hp, 20);
        assert_eq!(fixture.effects.len(), 1);
        assert!(fixture.events.contains(&Event::ChainHopScheduled {
            target: EnemyId::new(2),
            damage: 70,
            due: CHAIN_DELAY,
        }));
    }

    #[test]
    fn hop_against_dead_target_is_ignored() {
        let mut fixture = Fixture::new(&[(0.0, 0.0), (50.0, 0.0)]);
        fixture.enemies[1].alive = false;
        let params = ChainParams {
            max_hops: 3,
            falloff: CHAIN_FALLOFF,
            range: CHAIN_RANGE,
            delay: CHAIN_DELAY,
        };

        fixture.resolver().land_hop(ChainHop {
            target: EnemyId::new(1),
            base_damage: 100,
            hop: 2,
            params,
            visited: vec![EnemyId::new(0), EnemyId::new(1)],
            due: Duration::ZERO,
        });

        assert!(fixture.events.is_empty());
        assert_eq!(fixture.effects.len(), 0);
    }
}
