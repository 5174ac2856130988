use crate::matching::domain::face_crop::FaceCrop;

/// How alike two face crops are.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Similarity {
    /// Pearson correlation in `[-1, 1]`.
    Correlation(f64),
    /// At least one histogram had zero variance, so no correlation exists.
    Degenerate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub similarity: Similarity,
    pub matched: bool,
}

impl MatchResult {
    /// The correlation, when one was defined.
    pub fn score(&self) -> Option<f64> {
        match self.similarity {
            Similarity::Correlation(c) => Some(c),
            Similarity::Degenerate => None,
        }
    }
}

/// Domain interface for deciding whether two face crops show the same
/// person. Implementations are pure: the same pair always gives the same
/// result.
pub trait FaceMatcher: Send + Sync {
    fn match_faces(&self, stored: &FaceCrop, submitted: &FaceCrop) -> MatchResult;
}
