//! Session parameters loadable from TOML.

use std::time::Duration;

use orbital_defence_core::Vec2;
use orbital_defence_system_waves::Config as DirectorConfig;
use orbital_defence_world::WorldConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const RNG_STREAM_WAVES: &str = "waves";
const RNG_STREAM_PARTICLES: &str = "particles";

/// Tunable parameters of a session. Missing TOML keys fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Map width in world units.
    pub width: f32,
    /// Map height in world units.
    pub height: f32,
    /// Root seed every random stream is derived from.
    pub seed: u64,
    /// Rest period between waves, in milliseconds.
    pub wave_delay_ms: u64,
    /// Delay between consecutive spawns of a wave, in milliseconds.
    pub spawn_interval_ms: u64,
    /// Upper bound applied to a single frame delta, in milliseconds.
    pub max_frame_delta_ms: u64,
    /// Credits available when a session starts.
    pub starting_credits: u32,
    /// Tower hit points when a session starts.
    pub tower_hp: i32,
    /// Radius of the tower footprint.
    pub tower_radius: f32,
    /// Starts the first wave of a new session without waiting for the rest delay.
    pub launch_first_wave: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 1_200.0,
            height: 800.0,
            seed: 0,
            wave_delay_ms: 15_000,
            spawn_interval_ms: 1_000,
            max_frame_delta_ms: 64,
            starting_credits: 1_000,
            tower_hp: 100,
            tower_radius: 40.0,
            launch_first_wave: true,
        }
    }
}

impl SessionConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ConfigError::Invalid("width must be positive"));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(ConfigError::Invalid("height must be positive"));
        }
        if !(self.tower_radius.is_finite() && self.tower_radius > 0.0) {
            return Err(ConfigError::Invalid("tower_radius must be positive"));
        }
        if self.tower_hp <= 0 {
            return Err(ConfigError::Invalid("tower_hp must be positive"));
        }
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::Invalid("spawn_interval_ms must be positive"));
        }
        if self.max_frame_delta_ms == 0 {
            return Err(ConfigError::Invalid("max_frame_delta_ms must be positive"));
        }
        Ok(())
    }

    /// Map dimensions.
    #[must_use]
    pub fn map_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Upper bound applied to a single frame delta.
    #[must_use]
    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    pub(crate) fn world_config(&self) -> WorldConfig {
        WorldConfig {
            width: self.width,
            height: self.height,
            starting_credits: self.starting_credits,
            tower_hp: self.tower_hp,
            tower_radius: self.tower_radius,
            particle_seed: derive_labeled_seed(self.seed, RNG_STREAM_PARTICLES),
        }
    }

    pub(crate) fn director_config(&self) -> DirectorConfig {
        DirectorConfig::new(
            self.map_size(),
            Duration::from_millis(self.wave_delay_ms),
            Duration::from_millis(self.spawn_interval_ms),
            derive_labeled_seed(self.seed, RNG_STREAM_WAVES),
        )
        .with_launch_first_wave(self.launch_first_wave)
    }
}

/// Errors raised while loading a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or has unexpected keys.
    #[error("could not parse session config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its accepted range.
    #[error("invalid session config: {0}")]
    Invalid(&'static str),
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SessionConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_document_overrides_named_keys() {
        let config = SessionConfig::from_toml_str(
            "seed = 42\nwave_delay_ms = 5000\nlaunch_first_wave = false\n",
        )
        .expect("partial config parses");

        assert_eq!(config.seed, 42);
        assert_eq!(config.wave_delay_ms, 5_000);
        assert!(!config.launch_first_wave);
        assert_eq!(config.width, 1_200.0);
        assert_eq!(config.max_frame_delta(), Duration::from_millis(64));
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(matches!(
            SessionConfig::from_toml_str("tower_colour = \"red\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("tower_hp = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("width = -5.0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn streams_derive_distinct_seeds() {
        let waves = derive_labeled_seed(7, RNG_STREAM_WAVES);
        let particles = derive_labeled_seed(7, RNG_STREAM_PARTICLES);

        assert_ne!(waves, particles);
        assert_eq!(waves, derive_labeled_seed(7, RNG_STREAM_WAVES));
        assert_ne!(waves, derive_labeled_seed(8, RNG_STREAM_WAVES));
    }

    #[test]
    fn world_config_mirrors_session_values() {
        let config = SessionConfig {
            starting_credits: 250,
            tower_hp: 40,
            ..SessionConfig::default()
        };
        let world = config.world_config();

        assert_eq!(world.starting_credits, 250);
        assert_eq!(world.tower_hp, 40);
        assert_eq!(world.particle_seed, derive_labeled_seed(0, "particles"));
    }
}
