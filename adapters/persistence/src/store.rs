use std::{
    fs, io,
    path::{Path, PathBuf},
};

use orbital_defence_core::AchievementSet;
use thiserror::Error;

use crate::{decode_achievements, encode_achievements, DecodeError, EncodeError};

/// Holder of the single save slot.
pub trait SaveStore {
    /// Returns the stored blob, or `None` when nothing has been saved.
    fn read(&self) -> io::Result<Option<String>>;

    /// Replaces the stored blob.
    fn write(&mut self, blob: &str) -> io::Result<()>;
}

/// Holder of the achievement unlock flags.
pub trait AchievementStore {
    /// Loads persisted unlocks. An empty store yields an empty set.
    fn load(&self) -> Result<AchievementSet, StoreError>;

    /// Persists the full set of unlocks.
    fn store(&mut self, unlocked: &AchievementSet) -> Result<(), StoreError>;
}

impl<S: AchievementStore + ?Sized> AchievementStore for Box<S> {
    fn load(&self) -> Result<AchievementSet, StoreError> {
        (**self).load()
    }

    fn store(&mut self, unlocked: &AchievementSet) -> Result<(), StoreError> {
        (**self).store(unlocked)
    }
}

/// Errors raised by achievement stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium failed.
    #[error("achievement store unavailable: {0}")]
    Io(#[from] io::Error),
    /// The stored blob is corrupt.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The unlocks could not be serialised.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Save slot kept in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySaveStore {
    blob: Option<String>,
}

impl MemorySaveStore {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot pre-filled with the provided blob.
    #[must_use]
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
        }
    }

    /// Blob currently held by the slot.
    #[must_use]
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl SaveStore for MemorySaveStore {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.blob.clone())
    }

    fn write(&mut self, blob: &str) -> io::Result<()> {
        self.blob = Some(blob.to_owned());
        Ok(())
    }
}

/// Achievement flags kept in memory as an encoded blob.
#[derive(Clone, Debug, Default)]
pub struct MemoryAchievementStore {
    blob: Option<String>,
}

impl MemoryAchievementStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blob currently held by the store.
    #[must_use]
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl AchievementStore for MemoryAchievementStore {
    fn load(&self) -> Result<AchievementSet, StoreError> {
        match &self.blob {
            Some(blob) => Ok(decode_achievements(blob)?),
            None => Ok(AchievementSet::new()),
        }
    }

    fn store(&mut self, unlocked: &AchievementSet) -> Result<(), StoreError> {
        self.blob = Some(encode_achievements(unlocked)?);
        Ok(())
    }
}

/// Save slot backed by a file on disk.
#[derive(Clone, Debug)]
pub struct FileSaveStore {
    path: PathBuf,
}

impl FileSaveStore {
    /// Creates a slot stored at the provided path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SaveStore for FileSaveStore {
    fn read(&self) -> io::Result<Option<String>> {
        read_optional(&self.path)
    }

    fn write(&mut self, blob: &str) -> io::Result<()> {
        fs::write(&self.path, blob)
    }
}

/// Achievement flags backed by a file on disk.
#[derive(Clone, Debug)]
pub struct FileAchievementStore {
    path: PathBuf,
}

impl FileAchievementStore {
    /// Creates a store kept at the provided path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AchievementStore for FileAchievementStore {
    fn load(&self) -> Result<AchievementSet, StoreError> {
        match read_optional(&self.path)? {
            Some(blob) => Ok(decode_achievements(&blob)?),
            None => Ok(AchievementSet::new()),
        }
    }

    fn store(&mut self, unlocked: &AchievementSet) -> Result<(), StoreError> {
        fs::write(&self.path, encode_achievements(unlocked)?)?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(blob) => Ok(Some(blob)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}
