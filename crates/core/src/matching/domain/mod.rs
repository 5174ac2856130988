pub mod face_crop;
pub mod face_matcher;
pub mod intensity_histogram;
