pub const CASCADE_MODEL_NAME: &str = "haarcascade_frontalface_default.xml";
pub const CASCADE_MODEL_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_default.xml";

/// Pyramid step between detection scales.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;

/// Overlapping raw detections a cluster needs before it is reported.
pub const DEFAULT_MIN_NEIGHBORS: usize = 4;

/// Relative tolerance when clustering raw detections.
pub const GROUPING_EPS: f64 = 0.2;

/// Side length every face crop is resampled to before comparison.
pub const FACE_CROP_SIZE: u32 = 100;

pub const HISTOGRAM_BINS: usize = 256;

/// Upper end of the min-max rescaled histogram range.
pub const HISTOGRAM_SCALE_MAX: f64 = 255.0;

/// Minimum histogram correlation accepted as the same person.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;
