use crate::shared::image::Image;
use crate::shared::region::Region;

/// Domain interface for face location.
///
/// Implementations hold only read-only model state, so one locator can be
/// shared across threads and called concurrently.
pub trait FaceLocator: Send + Sync {
    /// Candidate face regions in detector-native order. Every region lies
    /// inside `image`. An empty result means no face was found; it is not
    /// an error.
    fn locate(&self, image: &Image) -> Vec<Region>;
}
