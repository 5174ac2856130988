//! Reference photos kept as plain files, one directory per user.
//!
//! ```text
//! <root>/
//!   alice/
//!     000001.img
//!     000002.img   <- latest
//! ```
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::identity::domain::reference_store::{ReferenceLookup, ReferenceStore, StoreError};

const REFERENCE_EXTENSION: &str = "img";
const SEQUENCE_DIGITS: usize = 6;

/// Distinguishes temp files of concurrent writers within one process.
static WRITE_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct DirectoryReferenceStore {
    root: PathBuf,
}

impl DirectoryReferenceStore {
    /// The root directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, username: &str) -> PathBuf {
        self.root.join(username)
    }

    /// Sequence numbers of the stored photos, unordered.
    fn sequences(dir: &Path) -> Result<Vec<u32>, StoreError> {
        let entries = fs::read_dir(dir).map_err(io_err(dir))?;
        let mut sequences = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_err(dir))?;
            if let Some(seq) = parse_sequence(&entry.path()) {
                sequences.push(seq);
            }
        }
        Ok(sequences)
    }

    /// Links the fully written `temp` file to the next free sequence name.
    ///
    /// `hard_link` fails instead of replacing an existing file, so a writer
    /// that loses the race for a number moves on to the next one.
    fn claim_next(&self, username: &str, dir: &Path, temp: &Path) -> Result<PathBuf, StoreError> {
        loop {
            let latest = Self::sequences(dir)?.into_iter().max().unwrap_or(0);
            let next = latest
                .checked_add(1)
                .ok_or_else(|| StoreError::SequenceExhausted(username.to_string()))?;
            let dest = dir.join(file_name(next));
            match fs::hard_link(temp, &dest) {
                Ok(()) => return Ok(dest),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("{} was taken, retrying", dest.display());
                }
                Err(source) => return Err(StoreError::Io { path: dest, source }),
            }
        }
    }
}

impl ReferenceStore for DirectoryReferenceStore {
    fn user_exists(&self, username: &str) -> Result<bool, StoreError> {
        if !is_valid_username(username) {
            return Ok(false);
        }
        Ok(self.user_dir(username).is_dir())
    }

    fn create_user(&self, username: &str) -> Result<bool, StoreError> {
        if !is_valid_username(username) {
            return Err(StoreError::InvalidUsername(username.to_string()));
        }
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        let dir = self.user_dir(username);
        match fs::create_dir(&dir) {
            Ok(()) => {
                log::debug!("Created user directory {}", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(source) => Err(StoreError::Io { path: dir, source }),
        }
    }

    fn add_reference(&self, username: &str, image: &[u8]) -> Result<(), StoreError> {
        if !self.user_exists(username)? {
            return Err(StoreError::UnknownUser(username.to_string()));
        }
        let dir = self.user_dir(username);

        // Write to a temp file first, then link it under its final name
        let temp_path = dir.join(format!(
            "write-{}-{}.part",
            process::id(),
            WRITE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&temp_path, image).map_err(io_err(&temp_path))?;
        let claimed = self.claim_next(username, &dir, &temp_path);
        if let Err(e) = fs::remove_file(&temp_path) {
            log::warn!("Could not remove {}: {e}", temp_path.display());
        }
        let dest = claimed?;
        log::debug!("Stored reference {} ({} bytes)", dest.display(), image.len());
        Ok(())
    }

    /// Invalid names cannot have been registered, so they report
    /// [`ReferenceLookup::UnknownUser`].
    fn latest_reference(&self, username: &str) -> Result<ReferenceLookup, StoreError> {
        if !self.user_exists(username)? {
            return Ok(ReferenceLookup::UnknownUser);
        }
        let dir = self.user_dir(username);
        let Some(latest) = Self::sequences(&dir)?.into_iter().max() else {
            return Ok(ReferenceLookup::NoImage);
        };
        let path = dir.join(file_name(latest));
        let bytes = fs::read(&path).map_err(io_err(&path))?;
        Ok(ReferenceLookup::Found(bytes))
    }

    fn remove_user(&self, username: &str) -> Result<(), StoreError> {
        if !is_valid_username(username) {
            return Ok(());
        }
        let dir = self.user_dir(username);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                log::debug!("Removed user directory {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path: dir, source }),
        }
    }
}

/// ASCII letters, digits, `-`, `_` and `.`, not starting with `.`.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && !username.starts_with('.')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn file_name(sequence: u32) -> String {
    format!("{sequence:0width$}.{REFERENCE_EXTENSION}", width = SEQUENCE_DIGITS)
}

fn parse_sequence(path: &Path) -> Option<u32> {
    if path.extension()? != REFERENCE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.len() < SEQUENCE_DIGITS || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}
