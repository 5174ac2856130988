use std::fmt;

use crate::imaging::domain::image_decoder::DecodeError;

/// Which of the two compared photos an outcome refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRole {
    Reference,
    Submitted,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Reference => write!(f, "stored reference"),
            ImageRole::Submitted => write!(f, "submitted"),
        }
    }
}

/// Every way a login attempt can end.
///
/// Only [`LoginOutcome::Success`] grants access. Infrastructure failures
/// are not outcomes; they surface as errors from the use case.
#[derive(Clone, Debug, PartialEq)]
pub enum LoginOutcome {
    Success { score: f64 },
    NoFaceInReference,
    NoFaceInSubmitted,
    /// `score` is `None` when the histograms were degenerate.
    Mismatch { score: Option<f64> },
    UserNotFound,
    NoReferenceImage,
    DecodeError { image: ImageRole, reason: DecodeError },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success { .. })
    }

    /// Correlation behind a comparison outcome, when one was computed.
    pub fn score(&self) -> Option<f64> {
        match self {
            LoginOutcome::Success { score } => Some(*score),
            LoginOutcome::Mismatch { score } => *score,
            _ => None,
        }
    }
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginOutcome::Success { score } => write!(f, "face matched (correlation {score:.4})"),
            LoginOutcome::NoFaceInReference => write!(f, "no face detected in the stored image"),
            LoginOutcome::NoFaceInSubmitted => {
                write!(f, "no face detected in the submitted image")
            }
            LoginOutcome::Mismatch { score: Some(score) } => {
                write!(f, "face does not match (correlation {score:.4})")
            }
            LoginOutcome::Mismatch { score: None } => {
                write!(f, "face does not match (histogram has no variance)")
            }
            LoginOutcome::UserNotFound => write!(f, "user not found"),
            LoginOutcome::NoReferenceImage => write!(f, "no face image stored for user"),
            LoginOutcome::DecodeError { image, reason } => {
                write!(f, "could not read the {image} image: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_success_grants_access() {
        assert!(LoginOutcome::Success { score: 0.9 }.is_success());
        assert!(!LoginOutcome::Mismatch { score: Some(0.1) }.is_success());
        assert!(!LoginOutcome::NoFaceInReference.is_success());
        assert!(!LoginOutcome::UserNotFound.is_success());
    }

    #[test]
    fn test_score() {
        assert_eq!(LoginOutcome::Success { score: 0.7 }.score(), Some(0.7));
        assert_eq!(LoginOutcome::Mismatch { score: None }.score(), None);
        assert_eq!(LoginOutcome::NoFaceInSubmitted.score(), None);
    }

    #[test]
    fn test_display_names_the_image() {
        let outcome = LoginOutcome::DecodeError {
            image: ImageRole::Submitted,
            reason: DecodeError::ZeroDimensions,
        };
        assert_eq!(
            outcome.to_string(),
            "could not read the submitted image: image dimensions are zero"
        );
    }
}
