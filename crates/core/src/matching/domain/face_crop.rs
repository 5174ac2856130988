use crate::imaging::infrastructure::resampling::resize_exact;
use crate::shared::constants::FACE_CROP_SIZE;
use crate::shared::image::Image;
use crate::shared::region::Region;

/// A face cut out of its source image, resampled to a fixed square and
/// reduced to one intensity channel. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCrop {
    image: Image,
}

impl FaceCrop {
    /// Cuts `region` out of `image`, resizes it to `size x size` with
    /// bilinear filtering in the source colour space, then converts to
    /// intensity.
    ///
    /// `region` must lie inside `image`.
    pub fn extract(image: &Image, region: &Region, size: u32) -> Self {
        let cut = image.crop(region);
        let resized = resize_exact(&cut, size, size);
        Self {
            image: resized.to_intensity(),
        }
    }

    /// [`extract`](Self::extract) at the canonical comparison size.
    pub fn canonical(image: &Image, region: &Region) -> Self {
        Self::extract(image, region, FACE_CROP_SIZE)
    }

    /// Wraps an image that is already a single-channel crop.
    pub fn from_intensity(image: Image) -> Self {
        debug_assert!(image.is_intensity(), "face crop must be single-channel");
        Self { image }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn samples(&self) -> &[u8] {
        self.image.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> Image {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Image::new(data, width, height, 3)
    }

    #[test]
    fn test_canonical_crop_is_square_intensity() {
        let image = rgb(64, 48, |x, y| [x as u8, y as u8, 0]);
        let crop = FaceCrop::canonical(&image, &Region::new(10, 5, 30, 40));
        assert_eq!(crop.image().width(), FACE_CROP_SIZE);
        assert_eq!(crop.image().height(), FACE_CROP_SIZE);
        assert!(crop.image().is_intensity());
    }

    #[test]
    fn test_crop_only_sees_region() {
        // Left half red, right half blue; the crop takes only the right half.
        let image = rgb(40, 20, |x, _| if x < 20 { [255, 0, 0] } else { [0, 0, 255] });
        let crop = FaceCrop::extract(&image, &Region::new(20, 0, 20, 20), 10);
        assert!(crop.samples().iter().all(|&v| v == 29));
    }

    #[test]
    fn test_same_size_crop_keeps_samples() {
        let image = rgb(8, 8, |x, y| {
            let v = (x * 30 + y) as u8;
            [v, v, v]
        });
        let crop = FaceCrop::extract(&image, &Region::full(8, 8), 8);
        assert_eq!(crop.samples(), image.to_intensity().data());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let image = rgb(73, 91, |x, y| [(x * 3) as u8, (y * 2) as u8, (x + y) as u8]);
        let region = Region::new(3, 7, 61, 59);
        assert_eq!(
            FaceCrop::canonical(&image, &region),
            FaceCrop::canonical(&image, &region)
        );
    }
}
