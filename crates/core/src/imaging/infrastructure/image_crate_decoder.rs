use std::io::Cursor;

use image::{DynamicImage, ImageDecoder as _, ImageReader};

use crate::imaging::domain::image_decoder::{DecodeError, ImageDecoder};
use crate::shared::image::Image;

fn malformed(e: impl ToString) -> DecodeError {
    DecodeError::Malformed(e.to_string())
}

/// Decodes JPEG, PNG, BMP, TIFF and WebP buffers with the `image` crate.
///
/// Output is always 3-channel RGB: greyscale sources are expanded and
/// alpha is discarded, so every caller sees a color image. An EXIF
/// orientation tag is applied, so the pixels come out upright.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Image, DecodeError> {
        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(malformed)?
            .into_decoder()
            .map_err(malformed)?;
        let orientation = decoder.orientation().map_err(malformed)?;
        let mut decoded = DynamicImage::from_decoder(decoder).map_err(malformed)?;
        decoded.apply_orientation(orientation);
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(DecodeError::ZeroDimensions);
        }
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Image::new(rgb.into_raw(), width, height, 3))
    }
}
