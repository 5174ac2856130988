use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

use crate::shared::image::Image;

/// Resample `image` to exactly `width x height` with bilinear (triangle)
/// filtering. Channel count is preserved.
///
/// Pure and deterministic: identical inputs give bit-identical outputs.
pub fn resize_exact(image: &Image, width: u32, height: u32) -> Image {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    let data = image.data().to_vec();
    if image.is_intensity() {
        let buffer = GrayImage::from_raw(image.width(), image.height(), data)
            .expect("Image data length must match dimensions");
        let resized = imageops::resize(&buffer, width, height, FilterType::Triangle);
        Image::new(resized.into_raw(), width, height, 1)
    } else {
        let buffer = RgbImage::from_raw(image.width(), image.height(), data)
            .expect("Image data length must match dimensions");
        let resized = imageops::resize(&buffer, width, height, FilterType::Triangle);
        Image::new(resized.into_raw(), width, height, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32, channels: u8) -> Image {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 13) % 256) as u8;
                data.extend(std::iter::repeat(v).take(channels as usize));
            }
        }
        Image::new(data, width, height, channels)
    }

    #[test]
    fn test_output_has_requested_dimensions() {
        let resized = resize_exact(&gradient(37, 53, 3), 100, 100);
        assert_eq!(resized.width(), 100);
        assert_eq!(resized.height(), 100);
        assert_eq!(resized.channels(), 3);
        assert_eq!(resized.data().len(), 100 * 100 * 3);
    }

    #[test]
    fn test_intensity_images_stay_single_channel() {
        let resized = resize_exact(&gradient(64, 48, 1), 32, 24);
        assert_eq!(resized.channels(), 1);
        assert_eq!(resized.data().len(), 32 * 24);
    }

    #[test]
    fn test_same_size_is_identity() {
        let image = gradient(20, 10, 3);
        assert_eq!(resize_exact(&image, 20, 10), image);
    }

    #[test]
    fn test_uniform_image_stays_uniform() {
        let image = Image::new(vec![90; 30 * 30 * 3], 30, 30, 3);
        let resized = resize_exact(&image, 100, 100);
        assert!(resized.data().iter().all(|&v| v == 90));
    }

    #[test]
    fn test_resampling_is_deterministic() {
        let image = gradient(123, 77, 3);
        assert_eq!(resize_exact(&image, 100, 100), resize_exact(&image, 100, 100));
    }
}
