use std::time::Duration;

use orbital_defence_core::{SpeedError, MAX_SPEED, MIN_SPEED};

/// Converts wall-clock frame deltas into simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationClock {
    max_frame: Duration,
    speed: u32,
    paused: bool,
}

impl SimulationClock {
    /// Creates a running clock at normal speed.
    #[must_use]
    pub const fn new(max_frame: Duration) -> Self {
        Self {
            max_frame,
            speed: MIN_SPEED,
            paused: false,
        }
    }

    /// Current speed multiplier.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Reports whether simulated time is frozen.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Changes the speed multiplier, leaving it untouched when out of range.
    pub fn set_speed(&mut self, speed: u32) -> Result<(), SpeedError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(SpeedError { requested: speed });
        }
        self.speed = speed;
        Ok(())
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub(crate) fn resume(&mut self) {
        self.paused = false;
    }

    pub(crate) fn reset_speed(&mut self) {
        self.speed = MIN_SPEED;
    }

    /// Simulated delta for a frame, or `None` while paused.
    #[must_use]
    pub fn scaled(&self, frame: Duration) -> Option<Duration> {
        if self.paused {
            return None;
        }
        Some(frame.min(self.max_frame) * self.speed)
    }
}
