#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns simulation events into one-time achievement unlocks.

use orbital_defence_core::{AchievementId, AchievementSet, Event};

/// Score at which the score milestone unlocks.
pub const SCORE_MILESTONE: u64 = 10_000;

const FIRST_MILESTONE_WAVE: u32 = 10;
const SECOND_MILESTONE_WAVE: u32 = 25;

/// Achievement tracker that remembers every unlock it has announced.
#[derive(Debug, Default)]
pub struct AchievementTracker {
    unlocked: AchievementSet,
    scratch: Vec<AchievementId>,
}

impl AchievementTracker {
    /// Creates a tracker seeded with previously persisted unlocks.
    #[must_use]
    pub fn new(unlocked: AchievementSet) -> Self {
        Self {
            unlocked,
            scratch: Vec::new(),
        }
    }

    /// Achievements unlocked so far.
    #[must_use]
    pub fn unlocked(&self) -> &AchievementSet {
        &self.unlocked
    }

    /// Consumes the events of a tick and emits `Event::AchievementUnlocked`
    /// for every achievement that had not been unlocked before.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        for event in events {
            self.scratch.clear();
            earned_by(event, &mut self.scratch);

            for achievement in self.scratch.drain(..) {
                if self.unlocked.unlock(achievement) {
                    tracing::debug!(achievement = achievement.key(), "achievement unlocked");
                    out.push(Event::AchievementUnlocked { achievement });
                }
            }
        }
    }
}

/// Collects the achievements whose condition the event satisfies.
fn earned_by(event: &Event, out: &mut Vec<AchievementId>) {
    match event {
        Event::EnemyDestroyed { boss, score, .. } => {
            out.push(AchievementId::FirstKill);
            if *boss {
                out.push(AchievementId::FirstBoss);
            }
            if *score >= SCORE_MILESTONE {
                out.push(AchievementId::Score10k);
            }
        }
        Event::WaveCompleted {
            next_wave,
            damage_taken,
            ..
        } => {
            if *damage_taken == 0 && *next_wave > 1 {
                out.push(AchievementId::PerfectWave);
            }
            if *next_wave == FIRST_MILESTONE_WAVE {
                out.push(AchievementId::Wave10);
            }
            if *next_wave == SECOND_MILESTONE_WAVE {
                out.push(AchievementId::Wave25);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_defence_core::{EnemyId, EnemyKind};

    fn kill(boss: bool, score: u64) -> Event {
        Event::EnemyDestroyed {
            enemy: EnemyId::new(0),
            kind: if boss {
                EnemyKind::Boss
            } else {
                EnemyKind::Scout
            },
            boss,
            reward: 25,
            score,
        }
    }

    fn cleared(next_wave: u32, damage_taken: u32) -> Event {
        Event::WaveCompleted {
            completed: next_wave - 1,
            next_wave,
            bonus: 50 + next_wave * 10,
            damage_taken,
        }
    }

    fn unlocked(events: &[Event]) -> Vec<AchievementId> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::AchievementUnlocked { achievement } => Some(*achievement),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_kill_unlocks_once() {
        let mut tracker = AchievementTracker::default();
        let mut out = Vec::new();

        tracker.handle(&[kill(false, 50), kill(false, 100)], &mut out);
        tracker.handle(&[kill(false, 150)], &mut out);

        assert_eq!(unlocked(&out), vec![AchievementId::FirstKill]);
    }

    #[test]
    fn score_milestone_unlocks_once_when_crossed_repeatedly() {
        let mut tracker = AchievementTracker::default();
        let mut out = Vec::new();

        tracker.handle(
            &[kill(false, 9_990), kill(false, 10_040), kill(false, 10_090)],
            &mut out,
        );

        assert_eq!(
            unlocked(&out),
            vec![AchievementId::FirstKill, AchievementId::Score10k]
        );
    }

    #[test]
    fn boss_kill_unlocks_boss_slayer() {
        let mut tracker = AchievementTracker::default();
        let mut out = Vec::new();

        tracker.handle(&[kill(true, 1_300)], &mut out);

        assert!(tracker.unlocked().contains(AchievementId::FirstBoss));
    }

    #[test]
    fn perfect_wave_requires_no_damage_past_wave_one() {
        let mut tracker = AchievementTracker::default();
        let mut out = Vec::new();

        tracker.handle(&[cleared(2, 8)], &mut out);
        assert!(out.is_empty());

        tracker.handle(&[cleared(3, 0)], &mut out);
        assert_eq!(unlocked(&out), vec![AchievementId::PerfectWave]);
    }

    #[test]
    fn wave_milestones_match_incremented_wave() {
        let mut tracker = AchievementTracker::default();
        let mut out = Vec::new();

        tracker.handle(&[cleared(9, 5), cleared(10, 5)], &mut out);
        tracker.handle(&[cleared(25, 5)], &mut out);

        assert_eq!(
            unlocked(&out),
            vec![AchievementId::Wave10, AchievementId::Wave25]
        );
    }

    #[test]
    fn persisted_unlocks_are_not_announced_again() {
        let persisted: AchievementSet = [AchievementId::FirstKill].into_iter().collect();
        let mut tracker = AchievementTracker::new(persisted);
        let mut out = Vec::new();

        tracker.handle(&[kill(false, 25)], &mut out);

        assert!(out.is_empty());
        assert_eq!(tracker.unlocked().len(), 1);
    }
}
