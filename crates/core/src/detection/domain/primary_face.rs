use crate::shared::region::Region;

/// Chooses the face that takes part in a comparison: the first one the
/// locator reported.
///
/// Known limitation: with several faces in frame the choice is arbitrary.
/// No largest-face or most-central heuristic is applied, and detector order
/// carries no meaning beyond "reported first".
pub fn select_primary(regions: &[Region]) -> Option<Region> {
    regions.first().copied()
}
