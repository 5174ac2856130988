use crate::shared::region::Region;

/// A decoded raster image: contiguous samples in row-major order.
///
/// `channels` is 3 (RGB) or 1 (intensity). Images are immutable once
/// decoded; every transformation returns a new value.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Image {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert!(channels == 1 || channels == 3, "channels must be 1 or 3");
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_intensity(&self) -> bool {
        self.channels == 1
    }

    /// Single-channel copy using the Rec.601 luma weights.
    ///
    /// Intensity images are returned unchanged.
    pub fn to_intensity(&self) -> Image {
        if self.is_intensity() {
            return self.clone();
        }
        let samples = self
            .data
            .chunks_exact(3)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        Image::new(samples, self.width, self.height, 1)
    }

    /// Copies the samples covered by `region`.
    ///
    /// The region must satisfy [`Region::fits_within`] for this image.
    pub fn crop(&self, region: &Region) -> Image {
        debug_assert!(
            region.fits_within(self.width, self.height),
            "crop region must lie inside the image"
        );
        let channels = self.channels as usize;
        let row_len = region.width as usize * channels;
        let mut data = Vec::with_capacity(row_len * region.height as usize);
        for row in region.y..region.y + region.height {
            let start = (row as usize * self.width as usize + region.x as usize) * channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        Image::new(data, region.width, region.height, self.channels)
    }
}

const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// `0.299 R + 0.587 G + 0.114 B` in 14-bit fixed point, rounded.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
    ((y + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}
