use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::primary_face::select_primary;
use crate::identity::domain::reference_store::{ReferenceLookup, ReferenceStore, StoreError};
use crate::imaging::domain::image_decoder::ImageDecoder;
use crate::matching::domain::face_crop::FaceCrop;
use crate::matching::domain::face_matcher::FaceMatcher;
use crate::pipeline::login_outcome::{ImageRole, LoginOutcome};
use crate::shared::image::Image;

/// Login by face: look up → decode → locate → crop → compare.
///
/// A single synchronous pass. Every step that can reject the attempt does
/// so with a [`LoginOutcome`]; only store failures are errors.
pub struct AuthenticateUseCase {
    store: Box<dyn ReferenceStore>,
    decoder: Box<dyn ImageDecoder>,
    locator: Box<dyn FaceLocator>,
    matcher: Box<dyn FaceMatcher>,
}

impl AuthenticateUseCase {
    pub fn new(
        store: Box<dyn ReferenceStore>,
        decoder: Box<dyn ImageDecoder>,
        locator: Box<dyn FaceLocator>,
        matcher: Box<dyn FaceMatcher>,
    ) -> Self {
        Self {
            store,
            decoder,
            locator,
            matcher,
        }
    }

    /// Checks `submitted` against the latest reference photo of `username`.
    pub fn execute(&self, username: &str, submitted: &[u8]) -> Result<LoginOutcome, StoreError> {
        let outcome = match self.store.latest_reference(username)? {
            ReferenceLookup::UnknownUser => LoginOutcome::UserNotFound,
            ReferenceLookup::NoImage => LoginOutcome::NoReferenceImage,
            ReferenceLookup::Found(reference) => self.compare(&reference, submitted),
        };
        log::info!("Login for {username:?}: {outcome}");
        Ok(outcome)
    }

    /// Compares two encoded photos directly, without the store.
    pub fn compare(&self, reference: &[u8], submitted: &[u8]) -> LoginOutcome {
        let reference = match self.decode(reference, ImageRole::Reference) {
            Ok(image) => image,
            Err(outcome) => return outcome,
        };
        let submitted = match self.decode(submitted, ImageRole::Submitted) {
            Ok(image) => image,
            Err(outcome) => return outcome,
        };

        let Some(reference_face) = select_primary(&self.locator.locate(&reference)) else {
            return LoginOutcome::NoFaceInReference;
        };
        let Some(submitted_face) = select_primary(&self.locator.locate(&submitted)) else {
            return LoginOutcome::NoFaceInSubmitted;
        };
        log::debug!("Comparing reference face {reference_face:?} with submitted face {submitted_face:?}");

        let result = self.matcher.match_faces(
            &FaceCrop::canonical(&reference, &reference_face),
            &FaceCrop::canonical(&submitted, &submitted_face),
        );
        match (result.matched, result.score()) {
            (true, Some(score)) => LoginOutcome::Success { score },
            (_, score) => LoginOutcome::Mismatch { score },
        }
    }

    fn decode(&self, bytes: &[u8], role: ImageRole) -> Result<Image, LoginOutcome> {
        self.decoder.decode(bytes).map_err(|reason| {
            log::debug!("Failed to decode {role} image: {reason}");
            LoginOutcome::DecodeError {
                image: role,
                reason,
            }
        })
    }
}
