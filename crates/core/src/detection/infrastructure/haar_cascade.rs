//! Boosted Haar cascade model and its per-window evaluation.
//!
//! The model is built once (usually from an OpenCV cascade XML file via
//! [`HaarCascade::load`]) and is immutable afterwards, so a single instance
//! can be shared between locators and threads behind an `Arc`.
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::infrastructure::cascade_xml;
use crate::detection::infrastructure::integral_image::IntegralImage;

/// Windows whose `area / sqrt(area * sq_sum - sum^2)` reaches this value
/// are too flat to hold a face and are rejected before any stage runs.
const MIN_CONTRAST_RATIO: f64 = 0.1;

/// Stage thresholds are lowered by this much, in single precision, as
/// OpenCV does when it loads a cascade.
const STAGE_THRESHOLD_EPS: f32 = 1e-5;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cascade is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("cascade is missing <{0}>")]
    MissingElement(String),
    #[error("invalid number {value:?} in <{element}>")]
    InvalidNumber { element: String, value: String },
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
    #[error("invalid cascade: {0}")]
    Invalid(String),
}

/// One weighted rectangle of a Haar feature, in window coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<HaarRect>,
}

impl HaarFeature {
    fn value(&self, integral: &IntegralImage, x: usize, y: usize) -> f64 {
        self.rects
            .iter()
            .map(|r| {
                let sum = integral.rect_sum(
                    x + r.x as usize,
                    y + r.y as usize,
                    r.width as usize,
                    r.height as usize,
                );
                r.weight * sum as f64
            })
            .sum()
    }
}

/// Split node of a weak classifier tree.
///
/// `left` / `right` are either a later node index (`> 0`) or a leaf,
/// encoded as `-leaf_index` (`<= 0`).
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub feature: usize,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeakClassifier {
    pub nodes: Vec<TreeNode>,
    pub leaves: Vec<f64>,
}

impl WeakClassifier {
    fn response(
        &self,
        features: &[HaarFeature],
        integral: &IntegralImage,
        x: usize,
        y: usize,
        norm: f64,
    ) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            let value = features[node.feature].value(integral, x, y) * norm;
            let next = if value < node.threshold {
                node.left
            } else {
                node.right
            };
            if next <= 0 {
                return self.leaves[(-next) as usize];
            }
            idx = next as usize;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub threshold: f64,
    pub classifiers: Vec<WeakClassifier>,
}

/// Outcome of running the cascade on one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowVerdict {
    Accepted,
    /// Too little contrast to evaluate.
    TooFlat,
    Rejected { stage: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl HaarCascade {
    /// Assembles and validates a cascade.
    ///
    /// Every rectangle must fit inside the window, every node must reference
    /// an existing feature, and tree children must point forward (to a later
    /// node) or to an existing leaf.
    pub fn new(
        window_width: u32,
        window_height: u32,
        stages: Vec<Stage>,
        features: Vec<HaarFeature>,
    ) -> Result<Self, CascadeError> {
        if window_width < 3 || window_height < 3 {
            return Err(CascadeError::Invalid(format!(
                "window {window_width}x{window_height} is smaller than 3x3"
            )));
        }
        if stages.is_empty() {
            return Err(CascadeError::Invalid("cascade has no stages".into()));
        }
        for (i, feature) in features.iter().enumerate() {
            validate_feature(i, feature, window_width, window_height)?;
        }
        for (s, stage) in stages.iter().enumerate() {
            if stage.classifiers.is_empty() {
                return Err(CascadeError::Invalid(format!("stage {s} has no classifiers")));
            }
            for classifier in &stage.classifiers {
                validate_classifier(s, classifier, features.len())?;
            }
        }
        Ok(Self {
            window_width,
            window_height,
            stages,
            features,
        })
    }

    /// Reads an OpenCV cascade XML file.
    pub fn load(path: &Path) -> Result<Self, CascadeError> {
        let xml = fs::read_to_string(path).map_err(|source| CascadeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cascade = cascade_xml::parse(&xml)?;
        log::debug!(
            "Loaded cascade {} ({} stages, {} features, {}x{} window)",
            path.display(),
            cascade.stages.len(),
            cascade.features.len(),
            cascade.window_width,
            cascade.window_height
        );
        Ok(cascade)
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    #[cfg(test)]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs the cascade on the base-size window whose top-left corner is
    /// `(x, y)` in `integral`.
    pub fn evaluate(&self, integral: &IntegralImage, x: usize, y: usize) -> WindowVerdict {
        let Some(norm) = self.variance_norm(integral, x, y) else {
            return WindowVerdict::TooFlat;
        };
        for (index, stage) in self.stages.iter().enumerate() {
            let threshold = f64::from(stage.threshold as f32 - STAGE_THRESHOLD_EPS);
            let sum: f64 = stage
                .classifiers
                .iter()
                .map(|c| c.response(&self.features, integral, x, y, norm))
                .sum();
            if sum < threshold {
                return WindowVerdict::Rejected { stage: index };
            }
        }
        WindowVerdict::Accepted
    }

    /// Whether every stage accepts the window at `(x, y)`.
    #[cfg(test)]
    pub fn accepts(&self, integral: &IntegralImage, x: usize, y: usize) -> bool {
        self.evaluate(integral, x, y) == WindowVerdict::Accepted
    }

    /// `1 / (area * stddev)` over the window shrunk by one pixel per side,
    /// or `None` for windows too flat to evaluate.
    fn variance_norm(&self, integral: &IntegralImage, x: usize, y: usize) -> Option<f64> {
        let w = self.window_width as usize - 2;
        let h = self.window_height as usize - 2;
        let area = (w * h) as f64;
        let sum = integral.rect_sum(x + 1, y + 1, w, h) as f64;
        let sq_sum = integral.rect_sq_sum(x + 1, y + 1, w, h) as f64;

        let spread = area * sq_sum - sum * sum;
        if spread <= 0.0 {
            return None;
        }
        let norm = 1.0 / spread.sqrt();
        (area * norm < MIN_CONTRAST_RATIO).then_some(norm)
    }
}

fn validate_feature(
    index: usize,
    feature: &HaarFeature,
    window_width: u32,
    window_height: u32,
) -> Result<(), CascadeError> {
    if feature.rects.is_empty() {
        return Err(CascadeError::Invalid(format!("feature {index} has no rectangles")));
    }
    for r in &feature.rects {
        let inside = r.width > 0
            && r.height > 0
            && r.x as u64 + r.width as u64 <= window_width as u64
            && r.y as u64 + r.height as u64 <= window_height as u64;
        if !inside || !r.weight.is_finite() {
            return Err(CascadeError::Invalid(format!(
                "feature {index} has rectangle {r:?} outside the {window_width}x{window_height} window"
            )));
        }
    }
    Ok(())
}

fn validate_classifier(
    stage: usize,
    classifier: &WeakClassifier,
    feature_count: usize,
) -> Result<(), CascadeError> {
    if classifier.nodes.is_empty() {
        return Err(CascadeError::Invalid(format!("stage {stage} has an empty tree")));
    }
    for (idx, node) in classifier.nodes.iter().enumerate() {
        if node.feature >= feature_count {
            return Err(CascadeError::Invalid(format!(
                "stage {stage} references feature {} of {feature_count}",
                node.feature
            )));
        }
        for child in [node.left, node.right] {
            let valid = if child > 0 {
                (child as usize) > idx && (child as usize) < classifier.nodes.len()
            } else {
                (child.unsigned_abs() as usize) < classifier.leaves.len()
            };
            if !valid {
                return Err(CascadeError::Invalid(format!(
                    "stage {stage} node {idx} has dangling child {child}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shared::image::Image;
    use rstest::rstest;

    /// A 24x24 cascade that fires when the centre of the window is darker
    /// than its surroundings: `sum(window) - 4 * sum(centre) >= 0`.
    pub(crate) fn dark_centre_cascade() -> HaarCascade {
        dark_centre_cascade_with_split(0.0)
    }

    /// [`dark_centre_cascade`] with its stump split at `split`.
    pub(crate) fn dark_centre_cascade_with_split(split: f64) -> HaarCascade {
        let feature = HaarFeature {
            rects: vec![
                HaarRect {
                    x: 0,
                    y: 0,
                    width: 24,
                    height: 24,
                    weight: 1.0,
                },
                HaarRect {
                    x: 6,
                    y: 6,
                    width: 12,
                    height: 12,
                    weight: -4.0,
                },
            ],
        };
        let stump = WeakClassifier {
            nodes: vec![TreeNode {
                feature: 0,
                threshold: split,
                left: 0,
                right: -1,
            }],
            leaves: vec![-1.0, 1.0],
        };
        let stage = Stage {
            threshold: 0.0,
            classifiers: vec![stump],
        };
        HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap()
    }

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Image {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Image::new(data, width, height, 1)
    }

    fn stump(feature: usize, left: i32, right: i32) -> WeakClassifier {
        WeakClassifier {
            nodes: vec![TreeNode {
                feature,
                threshold: 0.0,
                left,
                right,
            }],
            leaves: vec![-1.0, 1.0],
        }
    }

    fn whole_window_feature() -> HaarFeature {
        HaarFeature {
            rects: vec![HaarRect {
                x: 0,
                y: 0,
                width: 24,
                height: 24,
                weight: 1.0,
            }],
        }
    }

    // ── Evaluation ───────────────────────────────────────────────────

    #[test]
    fn test_accepts_dark_centre() {
        let cascade = dark_centre_cascade();
        let image = gray(24, 24, |x, y| {
            if (6..18).contains(&x) && (6..18).contains(&y) {
                20
            } else {
                200
            }
        });
        assert!(cascade.accepts(&IntegralImage::new(&image), 0, 0));
    }

    #[test]
    fn test_rejection_reports_failing_stage() {
        let cascade = dark_centre_cascade();
        let image = gray(24, 24, |x, y| {
            if (6..18).contains(&x) && (6..18).contains(&y) {
                200
            } else {
                20
            }
        });
        assert_eq!(
            cascade.evaluate(&IntegralImage::new(&image), 0, 0),
            WindowVerdict::Rejected { stage: 0 }
        );
    }

    #[rstest]
    #[case(0.499_995, true)]
    #[case(0.5, true)]
    #[case(0.499_98, false)]
    fn test_stage_threshold_tolerance(#[case] leaf: f64, #[case] accepted: bool) {
        let feature = dark_centre_cascade().features[0].clone();
        let stage = Stage {
            threshold: 0.5,
            classifiers: vec![WeakClassifier {
                leaves: vec![leaf, leaf],
                ..stump(0, 0, -1)
            }],
        };
        let cascade = HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap();
        let image = gray(24, 24, |x, y| {
            if (6..18).contains(&x) && (6..18).contains(&y) {
                20
            } else {
                200
            }
        });
        assert_eq!(cascade.accepts(&IntegralImage::new(&image), 0, 0), accepted);
    }

    #[test]
    fn test_flat_window_is_too_flat() {
        let cascade = dark_centre_cascade();
        let image = gray(24, 24, |_, _| 90);
        assert_eq!(
            cascade.evaluate(&IntegralImage::new(&image), 0, 0),
            WindowVerdict::TooFlat
        );
    }

    #[test]
    fn test_rejects_bright_centre() {
        let cascade = dark_centre_cascade();
        let image = gray(24, 24, |x, y| {
            if (6..18).contains(&x) && (6..18).contains(&y) {
                200
            } else {
                20
            }
        });
        assert!(!cascade.accepts(&IntegralImage::new(&image), 0, 0));
    }

    #[test]
    fn test_rejects_flat_window() {
        let cascade = dark_centre_cascade();
        let image = gray(24, 24, |_, _| 128);
        assert!(!cascade.accepts(&IntegralImage::new(&image), 0, 0));
    }

    #[test]
    fn test_rejects_low_contrast_window() {
        // Alternating 127/129 has a standard deviation of 1, far below the
        // contrast floor.
        let cascade = dark_centre_cascade();
        let image = gray(24, 24, |x, y| if (x + y) % 2 == 0 { 127 } else { 129 });
        assert!(!cascade.accepts(&IntegralImage::new(&image), 0, 0));
    }

    #[test]
    fn test_window_offset_is_respected() {
        let cascade = dark_centre_cascade();
        let image = gray(48, 24, |x, y| {
            if (30..42).contains(&x) && (6..18).contains(&y) {
                20
            } else {
                200
            }
        });
        let integral = IntegralImage::new(&image);
        assert!(cascade.accepts(&integral, 24, 0));
    }

    #[test]
    fn test_deeper_tree_follows_right_branch_to_node() {
        // Root sends positive responses to node 1, which sends them to leaf 2.
        let tree = WeakClassifier {
            nodes: vec![
                TreeNode {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                TreeNode {
                    feature: 0,
                    threshold: 0.0,
                    left: -1,
                    right: -2,
                },
            ],
            leaves: vec![-5.0, -4.0, 3.0],
        };
        let stage = Stage {
            threshold: 2.5,
            classifiers: vec![tree],
        };
        let cascade = HaarCascade::new(24, 24, vec![stage], vec![whole_window_feature()]).unwrap();
        let image = gray(24, 24, |x, _| if x < 12 { 40 } else { 220 });
        assert!(cascade.accepts(&IntegralImage::new(&image), 0, 0));
    }

    // ── Validation ───────────────────────────────────────────────────

    #[test]
    fn test_rejects_tiny_window() {
        let stage = Stage {
            threshold: 0.0,
            classifiers: vec![stump(0, 0, -1)],
        };
        let result = HaarCascade::new(2, 24, vec![stage], vec![whole_window_feature()]);
        assert!(matches!(result, Err(CascadeError::Invalid(_))));
    }

    #[test]
    fn test_rejects_no_stages() {
        let result = HaarCascade::new(24, 24, vec![], vec![whole_window_feature()]);
        assert!(matches!(result, Err(CascadeError::Invalid(_))));
    }

    #[test]
    fn test_rejects_rect_outside_window() {
        let feature = HaarFeature {
            rects: vec![HaarRect {
                x: 20,
                y: 0,
                width: 5,
                height: 5,
                weight: 1.0,
            }],
        };
        let stage = Stage {
            threshold: 0.0,
            classifiers: vec![stump(0, 0, -1)],
        };
        let result = HaarCascade::new(24, 24, vec![stage], vec![feature]);
        assert!(matches!(result, Err(CascadeError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_feature_index() {
        let stage = Stage {
            threshold: 0.0,
            classifiers: vec![stump(3, 0, -1)],
        };
        let result = HaarCascade::new(24, 24, vec![stage], vec![whole_window_feature()]);
        assert!(matches!(result, Err(CascadeError::Invalid(_))));
    }

    #[test]
    fn test_rejects_dangling_leaf() {
        let stage = Stage {
            threshold: 0.0,
            classifiers: vec![stump(0, 0, -2)],
        };
        let result = HaarCascade::new(24, 24, vec![stage], vec![whole_window_feature()]);
        assert!(matches!(result, Err(CascadeError::Invalid(_))));
    }

    #[test]
    fn test_rejects_backward_child() {
        let node = |right| TreeNode {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right,
        };
        // Node 1 points back at itself and would never terminate.
        let tree = WeakClassifier {
            nodes: vec![node(1), node(1)],
            leaves: vec![1.0],
        };
        let stage = Stage {
            threshold: 0.0,
            classifiers: vec![tree],
        };
        let result = HaarCascade::new(24, 24, vec![stage], vec![whole_window_feature()]);
        assert!(matches!(result, Err(CascadeError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = HaarCascade::load(Path::new("/nonexistent/cascade.xml"));
        assert!(matches!(result, Err(CascadeError::Io { .. })));
    }
}
