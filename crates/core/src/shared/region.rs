/// An axis-aligned bounding box inside an image, in pixels.
///
/// A region is valid for an image of size `W x H` when it is non-empty and
/// `x + width <= W`, `y + height <= H`. Coordinates are unsigned, so the
/// top-left corner can never be negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole `width x height` image as a region.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    #[cfg(test)]
    pub fn contains_point(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && (px as u64) < self.right() && (py as u64) < self.bottom()
    }

    /// Whether the region is non-empty and lies entirely inside an image
    /// of the given size.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.right() <= image_width as u64
            && self.bottom() <= image_height as u64
    }

    /// Intersection with the image bounds, or `None` when nothing remains.
    pub fn clamped_to(&self, image_width: u32, image_height: u32) -> Option<Region> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }
        let right = self.right().min(image_width as u64) as u32;
        let bottom = self.bottom().min(image_height as u64) as u32;
        let clamped = Region::new(self.x, self.y, right - self.x, bottom - self.y);
        (clamped.width > 0 && clamped.height > 0).then_some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // ── Bounds ───────────────────────────────────────────────────────

    #[rstest]
    #[case::inside(Region::new(10, 10, 20, 20), true)]
    #[case::touching_edges(Region::new(0, 0, 100, 80), true)]
    #[case::past_right(Region::new(90, 0, 11, 10), false)]
    #[case::past_bottom(Region::new(0, 75, 10, 6), false)]
    #[case::zero_width(Region::new(5, 5, 0, 10), false)]
    #[case::zero_height(Region::new(5, 5, 10, 0), false)]
    fn test_fits_within(#[case] region: Region, #[case] expected: bool) {
        assert_eq!(region.fits_within(100, 80), expected);
    }

    #[test]
    fn test_fits_within_does_not_overflow() {
        let r = Region::new(u32::MAX, u32::MAX, u32::MAX, u32::MAX);
        assert!(!r.fits_within(u32::MAX, u32::MAX));
    }

    #[test]
    fn test_clamped_to_trims_overhang() {
        let r = Region::new(90, 70, 20, 20);
        assert_eq!(r.clamped_to(100, 80), Some(Region::new(90, 70, 10, 10)));
    }

    #[test]
    fn test_clamped_to_keeps_valid_region() {
        let r = Region::new(10, 10, 20, 20);
        assert_eq!(r.clamped_to(100, 80), Some(r));
    }

    #[test]
    fn test_clamped_to_outside_is_none() {
        assert_eq!(Region::new(100, 0, 5, 5).clamped_to(100, 80), None);
        assert_eq!(Region::new(0, 80, 5, 5).clamped_to(100, 80), None);
    }

    #[test]
    fn test_contains_point_is_half_open() {
        let r = Region::new(10, 10, 5, 5);
        assert!(r.contains_point(10, 10));
        assert!(r.contains_point(14, 14));
        assert!(!r.contains_point(15, 14));
        assert!(!r.contains_point(9, 12));
    }
}
