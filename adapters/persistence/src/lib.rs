#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Versioned codecs for the save and achievement blobs, plus the stores
//! that hold them between sessions.

mod store;

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use orbital_defence_core::{AchievementId, AchievementSet, SessionState, StateError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use store::{
    AchievementStore, FileAchievementStore, FileSaveStore, MemoryAchievementStore,
    MemorySaveStore, SaveStore, StoreError,
};

const SAVE_DOMAIN: &str = "odc";
const ACHIEVEMENT_DOMAIN: &str = "odc-achievements";
const VERSION: &str = "v1";

/// Identifier prefix emitted before an encoded save payload.
pub const SAVE_HEADER: &str = "odc:v1";
/// Identifier prefix emitted before an encoded achievement payload.
pub const ACHIEVEMENT_HEADER: &str = "odc-achievements:v1";
/// Delimiter separating the domain, version and payload segments.
const FIELD_DELIMITER: char = ':';

/// Session state captured by a save together with the moment it was taken.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    /// Milliseconds since the UNIX epoch at save time. Informational only.
    pub saved_at_ms: u64,
    /// Fields restored into the world on load.
    pub state: SessionState,
}

impl SavedSession {
    /// Encodes the save into a single-line blob.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{SAVE_HEADER}:{}", STANDARD_NO_PAD.encode(json)))
    }

    /// Decodes a save blob, rejecting values the world would refuse.
    pub fn decode(value: &str) -> Result<Self, DecodeError> {
        let payload = split_payload(value, SAVE_DOMAIN)?;
        let decoded: Self = serde_json::from_slice(&payload)?;
        decoded.state.validate()?;
        Ok(decoded)
    }
}

/// Encodes the unlock flags of every achievement.
pub fn encode_achievements(unlocked: &AchievementSet) -> Result<String, EncodeError> {
    let flags: BTreeMap<&str, bool> = AchievementId::ALL
        .into_iter()
        .map(|achievement| (achievement.key(), unlocked.contains(achievement)))
        .collect();
    let json = serde_json::to_vec(&flags)?;
    Ok(format!("{ACHIEVEMENT_HEADER}:{}", STANDARD_NO_PAD.encode(json)))
}

/// Decodes achievement flags. Unknown keys are skipped.
pub fn decode_achievements(value: &str) -> Result<AchievementSet, DecodeError> {
    let payload = split_payload(value, ACHIEVEMENT_DOMAIN)?;
    let flags: BTreeMap<String, bool> = serde_json::from_slice(&payload)?;
    Ok(flags
        .into_iter()
        .filter(|(_, unlocked)| *unlocked)
        .filter_map(|(key, _)| AchievementId::from_key(&key))
        .collect())
}

fn split_payload(value: &str, domain: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let found_domain = parts.next().ok_or(DecodeError::MissingPrefix)?;
    let version = parts.next().ok_or(DecodeError::MissingVersion)?;
    let payload = parts.next().ok_or(DecodeError::MissingPayload)?;

    if found_domain != domain {
        return Err(DecodeError::InvalidPrefix(found_domain.to_owned()));
    }
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion(version.to_owned()));
    }

    Ok(STANDARD_NO_PAD.decode(payload.as_bytes())?)
}

/// Failure to serialise a blob payload.
#[derive(Debug, Error)]
#[error("could not serialise payload: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Errors that can occur while decoding a save or achievement blob.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The blob was empty or contained only whitespace.
    #[error("blob was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("blob is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("blob is missing the version")]
    MissingVersion,
    /// The payload segment was missing.
    #[error("blob is missing the payload")]
    MissingPayload,
    /// The blob used an unexpected prefix.
    #[error("prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The blob used an unsupported version identifier.
    #[error("version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    /// The payload parsed but holds values the session cannot accept.
    #[error("saved state rejected: {0}")]
    InvalidState(#[from] StateError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_defence_core::{SavedUnit, UnitKind, UpgradeLevels, Vec2};

    fn saved() -> SavedSession {
        SavedSession {
            saved_at_ms: 1_700_000_000_000,
            state: SessionState {
                wave: 7,
                credits: 845,
                score: 4_120,
                tower_hp: 63,
                tower_max_hp: 100,
                units: vec![
                    SavedUnit {
                        kind: UnitKind::PlasmaTurret,
                        position: Vec2::new(320.0, 410.0),
                        hp: 50,
                    },
                    SavedUnit {
                        kind: UnitKind::MissileSilo,
                        position: Vec2::new(880.5, 200.25),
                        hp: 60,
                    },
                ],
                upgrades: UpgradeLevels {
                    damage_boost: 2,
                    range_boost: 0,
                    fire_rate_boost: 1,
                    credit_bonus: 3,
                },
            },
        }
    }

    fn with_json(json: &str) -> String {
        format!("{SAVE_HEADER}:{}", STANDARD_NO_PAD.encode(json))
    }

    #[test]
    fn save_round_trip_keeps_every_field() {
        let saved = saved();
        let encoded = saved.encode().expect("save encodes");
        assert!(encoded.starts_with("odc:v1:"));
        assert!(!encoded.ends_with('='));

        let decoded = SavedSession::decode(&encoded).expect("save decodes");
        assert_eq!(decoded, saved);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let encoded = saved().encode().expect("save encodes");
        assert!(SavedSession::decode(&format!("  {encoded}\n")).is_ok());
    }

    #[test]
    fn malformed_blobs_are_rejected() {
        assert!(matches!(
            SavedSession::decode("   "),
            Err(DecodeError::EmptyPayload)
        ));
        assert!(matches!(
            SavedSession::decode("odc"),
            Err(DecodeError::MissingVersion)
        ));
        assert!(matches!(
            SavedSession::decode("odc:v1"),
            Err(DecodeError::MissingPayload)
        ));
        assert!(matches!(
            SavedSession::decode("maze:v1:abc"),
            Err(DecodeError::InvalidPrefix(prefix)) if prefix == "maze"
        ));
        assert!(matches!(
            SavedSession::decode("odc:v2:abc"),
            Err(DecodeError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(
            SavedSession::decode("odc:v1:%%%"),
            Err(DecodeError::InvalidEncoding(_))
        ));
        assert!(matches!(
            SavedSession::decode(&with_json("{\"wave\":")),
            Err(DecodeError::InvalidPayload(_))
        ));
    }

    #[test]
    fn achievement_blob_cannot_stand_in_for_a_save() {
        let blob = encode_achievements(&AchievementSet::new()).expect("flags encode");
        assert!(matches!(
            SavedSession::decode(&blob),
            Err(DecodeError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn negative_credits_fail_to_parse() {
        let json = r#"{"saved_at_ms":0,"state":{"wave":2,"credits":-5,"score":0,
            "tower_hp":100,"tower_max_hp":100,"units":[],
            "upgrades":{"damage_boost":0,"range_boost":0,"fire_rate_boost":0,"credit_bonus":0}}}"#;
        assert!(matches!(
            SavedSession::decode(&with_json(json)),
            Err(DecodeError::InvalidPayload(_))
        ));
    }

    #[test]
    fn semantically_invalid_states_are_rejected() {
        let mut saved = saved();
        saved.state.tower_max_hp = 0;
        saved.state.tower_hp = 0;
        let encoded = saved.encode().expect("save encodes");
        assert!(matches!(
            SavedSession::decode(&encoded),
            Err(DecodeError::InvalidState(StateError::TowerMaxHp))
        ));

        let mut saved = self::saved();
        saved.state.upgrades.credit_bonus = 6;
        let encoded = saved.encode().expect("save encodes");
        assert!(matches!(
            SavedSession::decode(&encoded),
            Err(DecodeError::InvalidState(StateError::UpgradeLevel))
        ));
    }

    #[test]
    fn non_finite_positions_do_not_survive_decoding() {
        let mut saved = saved();
        saved.state.units[0].position = Vec2::new(f32::NAN, 10.0);
        let encoded = saved.encode().expect("save encodes");
        assert!(SavedSession::decode(&encoded).is_err());
    }

    #[test]
    fn achievement_flags_round_trip() {
        let unlocked: AchievementSet = [AchievementId::FirstKill, AchievementId::PerfectWave]
            .into_iter()
            .collect();
        let encoded = encode_achievements(&unlocked).expect("flags encode");
        assert!(encoded.starts_with("odc-achievements:v1:"));

        assert_eq!(decode_achievements(&encoded).expect("flags decode"), unlocked);
    }

    #[test]
    fn unknown_and_false_achievement_keys_are_skipped() {
        let json = r#"{"firstKill":true,"wave10":false,"speedrun":true}"#;
        let blob = format!("{ACHIEVEMENT_HEADER}:{}", STANDARD_NO_PAD.encode(json));

        let decoded = decode_achievements(&blob).expect("flags decode");

        assert_eq!(decoded.iter().collect::<Vec<_>>(), vec![AchievementId::FirstKill]);
    }
}
