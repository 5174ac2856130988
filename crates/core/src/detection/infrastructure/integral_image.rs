use ndarray::Array2;

use crate::shared::image::Image;

/// Summed-area tables of an intensity image and of its squares.
///
/// Both tables are `(height + 1) x (width + 1)` with a zero first row and
/// column, so any rectangle sum costs four lookups.
pub struct IntegralImage {
    sum: Array2<i64>,
    sq_sum: Array2<i64>,
}

impl IntegralImage {
    /// Builds the tables from a single-channel image.
    pub fn new(gray: &Image) -> Self {
        debug_assert!(gray.is_intensity(), "integral image needs one channel");
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let mut sum = Array2::<i64>::zeros((h + 1, w + 1));
        let mut sq_sum = Array2::<i64>::zeros((h + 1, w + 1));
        let data = gray.data();

        for y in 0..h {
            let mut row = 0i64;
            let mut sq_row = 0i64;
            for x in 0..w {
                let v = data[y * w + x] as i64;
                row += v;
                sq_row += v * v;
                sum[[y + 1, x + 1]] = sum[[y, x + 1]] + row;
                sq_sum[[y + 1, x + 1]] = sq_sum[[y, x + 1]] + sq_row;
            }
        }
        Self { sum, sq_sum }
    }

    /// Width of the source image.
    pub fn width(&self) -> usize {
        self.sum.ncols() - 1
    }

    /// Height of the source image.
    pub fn height(&self) -> usize {
        self.sum.nrows() - 1
    }

    /// Sum of samples in `[x, x + w) x [y, y + h)`.
    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        Self::lookup(&self.sum, x, y, w, h)
    }

    /// Sum of squared samples in `[x, x + w) x [y, y + h)`.
    pub fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        Self::lookup(&self.sq_sum, x, y, w, h)
    }

    fn lookup(table: &Array2<i64>, x: usize, y: usize, w: usize, h: usize) -> i64 {
        table[[y + h, x + w]] - table[[y, x + w]] - table[[y + h, x]] + table[[y, x]]
    }
}
