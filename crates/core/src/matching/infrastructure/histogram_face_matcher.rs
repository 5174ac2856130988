/// Intensity-histogram face matcher.
///
/// Compares two face crops by the shape of their grey-level distributions:
/// 256-bin histograms, min-max rescaled, correlated with Pearson's
/// coefficient. Deterministic and explainable, but blind to spatial layout,
/// so it is sensitive to lighting and easy to fool.
use crate::matching::domain::face_crop::FaceCrop;
use crate::matching::domain::face_matcher::{FaceMatcher, MatchResult, Similarity};
use crate::matching::domain::intensity_histogram::IntensityHistogram;
use crate::shared::constants::DEFAULT_MATCH_THRESHOLD;

pub struct HistogramFaceMatcher {
    threshold: f64,
}

impl HistogramFaceMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Applies the threshold. Degenerate similarity never matches.
    pub fn decide(&self, similarity: Similarity) -> MatchResult {
        let matched = match similarity {
            Similarity::Correlation(c) => c >= self.threshold,
            Similarity::Degenerate => false,
        };
        MatchResult {
            similarity,
            matched,
        }
    }
}

impl Default for HistogramFaceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl FaceMatcher for HistogramFaceMatcher {
    fn match_faces(&self, stored: &FaceCrop, submitted: &FaceCrop) -> MatchResult {
        let stored_hist = IntensityHistogram::from_crop(stored).normalized();
        let submitted_hist = IntensityHistogram::from_crop(submitted).normalized();

        let similarity = match stored_hist.correlation(&submitted_hist) {
            Some(c) => Similarity::Correlation(c),
            None => {
                log::warn!("Histogram has zero variance, treating comparison as a non-match");
                Similarity::Degenerate
            }
        };
        let result = self.decide(similarity);
        log::debug!(
            "Histogram correlation {:?} against threshold {} -> matched={}",
            result.score(),
            self.threshold,
            result.matched
        );
        result
    }
}
