use std::fmt;

use crate::identity::domain::reference_store::{ReferenceStore, StoreError};
use crate::imaging::domain::image_decoder::{DecodeError, ImageDecoder};

#[derive(Clone, Debug, PartialEq)]
pub enum RegisterOutcome {
    Registered,
    UsernameTaken,
    DecodeError { reason: DecodeError },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnrollOutcome {
    Enrolled,
    UserNotFound,
    DecodeError { reason: DecodeError },
}

impl fmt::Display for RegisterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterOutcome::Registered => write!(f, "user registered"),
            RegisterOutcome::UsernameTaken => write!(f, "username already taken"),
            RegisterOutcome::DecodeError { reason } => write!(f, "could not read the image: {reason}"),
        }
    }
}

impl fmt::Display for EnrollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollOutcome::Enrolled => write!(f, "reference photo added"),
            EnrollOutcome::UserNotFound => write!(f, "user not found"),
            EnrollOutcome::DecodeError { reason } => write!(f, "could not read the image: {reason}"),
        }
    }
}

/// Stores reference photos: a new account with its first photo, or a newer
/// photo for an existing account.
///
/// Photos are decoded once to reject unreadable uploads, then stored as
/// the original bytes. No face check happens here; a faceless reference
/// shows up at login as [`NoFaceInReference`].
///
/// [`NoFaceInReference`]: crate::pipeline::login_outcome::LoginOutcome::NoFaceInReference
pub struct RegisterFaceUseCase {
    store: Box<dyn ReferenceStore>,
    decoder: Box<dyn ImageDecoder>,
}

impl RegisterFaceUseCase {
    pub fn new(store: Box<dyn ReferenceStore>, decoder: Box<dyn ImageDecoder>) -> Self {
        Self { store, decoder }
    }

    pub fn register(&self, username: &str, photo: &[u8]) -> Result<RegisterOutcome, StoreError> {
        if let Err(reason) = self.decoder.decode(photo) {
            return Ok(RegisterOutcome::DecodeError { reason });
        }
        if !self.store.create_user(username)? {
            log::info!("Registration for {username:?} rejected: username taken");
            return Ok(RegisterOutcome::UsernameTaken);
        }
        if let Err(e) = self.store.add_reference(username, photo) {
            // An account without a photo would block a retry as "taken".
            if let Err(cleanup) = self.store.remove_user(username) {
                log::warn!("Could not roll back account {username:?}: {cleanup}");
            }
            return Err(e);
        }
        log::info!("Registered {username:?}");
        Ok(RegisterOutcome::Registered)
    }

    pub fn enroll(&self, username: &str, photo: &[u8]) -> Result<EnrollOutcome, StoreError> {
        if !self.store.user_exists(username)? {
            return Ok(EnrollOutcome::UserNotFound);
        }
        if let Err(reason) = self.decoder.decode(photo) {
            return Ok(EnrollOutcome::DecodeError { reason });
        }
        self.store.add_reference(username, photo)?;
        log::info!("Added reference photo for {username:?}");
        Ok(EnrollOutcome::Enrolled)
    }
}
