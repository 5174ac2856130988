use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("reference store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid username {0:?}")]
    InvalidUsername(String),
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("no sequence numbers left for user {0:?}")]
    SequenceExhausted(String),
}

/// Result of looking up a user's current reference photo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceLookup {
    UnknownUser,
    /// The user exists but has never stored a photo.
    NoImage,
    /// Encoded bytes of the most recently stored photo.
    Found(Vec<u8>),
}

/// Domain interface for the per-user store of reference face photos.
///
/// Photos are opaque encoded bytes; the store never decodes them.
pub trait ReferenceStore: Send + Sync {
    fn user_exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Creates an empty account. Returns `false` when the name is taken.
    fn create_user(&self, username: &str) -> Result<bool, StoreError>;

    /// Appends a photo. It becomes the one returned by
    /// [`latest_reference`](Self::latest_reference).
    fn add_reference(&self, username: &str, image: &[u8]) -> Result<(), StoreError>;

    fn latest_reference(&self, username: &str) -> Result<ReferenceLookup, StoreError>;

    /// Deletes an account and every photo stored for it. Removing an
    /// account that does not exist is not an error.
    fn remove_user(&self, username: &str) -> Result<(), StoreError>;
}
