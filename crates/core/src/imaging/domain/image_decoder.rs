use thiserror::Error;

use crate::shared::image::Image;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("failed to decode image: {0}")]
    Malformed(String),
    #[error("image dimensions are zero")]
    ZeroDimensions,
}

/// Domain interface for turning a compressed byte buffer into an [`Image`].
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Image, DecodeError>;
}
