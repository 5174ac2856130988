//! Multi-scale sliding-window face locator driven by a Haar cascade.
use std::sync::Arc;

use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::infrastructure::haar_cascade::{CascadeError, HaarCascade, WindowVerdict};
use crate::detection::infrastructure::integral_image::IntegralImage;
use crate::detection::infrastructure::rectangle_grouper::group_rectangles;
use crate::imaging::infrastructure::resampling::resize_exact;
use crate::shared::constants::{DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR, GROUPING_EPS};
use crate::shared::image::Image;
use crate::shared::region::Region;

/// Tuning for [`CascadeFaceLocator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionParams {
    /// Growth of the search window between pyramid levels. Must be > 1.
    pub scale_factor: f64,
    /// Raw hits a cluster needs beyond this count to be reported.
    /// Zero reports every raw hit ungrouped.
    pub min_neighbors: usize,
    /// Smallest face side in pixels. Zero means the cascade window size.
    pub min_size: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_size: 0,
        }
    }
}

pub struct CascadeFaceLocator {
    cascade: Arc<HaarCascade>,
    params: DetectionParams,
}

impl CascadeFaceLocator {
    pub fn new(cascade: Arc<HaarCascade>, params: DetectionParams) -> Result<Self, CascadeError> {
        if !params.scale_factor.is_finite() || params.scale_factor <= 1.0 {
            return Err(CascadeError::Invalid(format!(
                "scale factor must be greater than 1, got {}",
                params.scale_factor
            )));
        }
        Ok(Self { cascade, params })
    }

    /// Pyramid factors to scan, smallest window first.
    fn scales(&self, width: u32, height: u32) -> Vec<f64> {
        let (win_w, win_h) = self.cascade.window_size();
        let min_w = self.params.min_size.max(win_w) as f64;
        let min_h = self.params.min_size.max(win_h) as f64;

        let mut scales = Vec::new();
        let mut factor = 1.0f64;
        loop {
            let scaled_w = (width as f64 / factor).round();
            let scaled_h = (height as f64 / factor).round();
            if scaled_w - win_w as f64 <= 0.0 || scaled_h - win_h as f64 <= 0.0 {
                break;
            }
            let window_w = (win_w as f64 * factor).round();
            let window_h = (win_h as f64 * factor).round();
            if window_w > width as f64 || window_h > height as f64 {
                break;
            }
            if window_w >= min_w && window_h >= min_h {
                scales.push(factor);
            }
            factor *= self.params.scale_factor;
        }
        scales
    }

    /// Raw cascade hits at one pyramid level, in source image coordinates.
    fn scan(&self, gray: &Image, factor: f64, hits: &mut Vec<Region>) {
        let (win_w, win_h) = self.cascade.window_size();
        let scaled_w = (gray.width() as f64 / factor).round() as u32;
        let scaled_h = (gray.height() as f64 / factor).round() as u32;
        let scaled = resize_exact(gray, scaled_w, scaled_h);
        let integral = IntegralImage::new(&scaled);

        let window_w = (win_w as f64 * factor).round() as u32;
        let window_h = (win_h as f64 * factor).round() as u32;
        let step = if factor > 2.0 { 1 } else { 2 };
        let span_x = (scaled_w - win_w) as usize;
        let span_y = (scaled_h - win_h) as usize;

        let before = hits.len();
        for y in (0..span_y).step_by(step) {
            let mut x = 0;
            while x < span_x {
                match self.cascade.evaluate(&integral, x, y) {
                    WindowVerdict::Accepted => hits.push(Region::new(
                        (x as f64 * factor).round() as u32,
                        (y as f64 * factor).round() as u32,
                        window_w,
                        window_h,
                    )),
                    // A miss at the very first stage makes the neighbour
                    // unlikely too.
                    WindowVerdict::Rejected { stage: 0 } => x += step,
                    _ => {}
                }
                x += step;
            }
        }
        log::debug!(
            "Scale {factor:.3}: {scaled_w}x{scaled_h}, window {window_w}x{window_h}, {} hits",
            hits.len() - before
        );
    }
}

impl FaceLocator for CascadeFaceLocator {
    fn locate(&self, image: &Image) -> Vec<Region> {
        let (width, height) = (image.width(), image.height());
        let gray = image.to_intensity();

        let mut hits = Vec::new();
        for factor in self.scales(width, height) {
            self.scan(&gray, factor, &mut hits);
        }

        let faces: Vec<Region> = group_rectangles(&hits, self.params.min_neighbors, GROUPING_EPS)
            .into_iter()
            .filter_map(|r| r.clamped_to(width, height))
            .collect();
        log::debug!(
            "Located {} face(s) from {} raw hits in {width}x{height} image",
            faces.len(),
            hits.len()
        );
        faces
    }
}
