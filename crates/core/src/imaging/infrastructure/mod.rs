pub mod image_crate_decoder;
pub mod resampling;
