use crate::matching::domain::face_crop::FaceCrop;
use crate::shared::constants::{HISTOGRAM_BINS, HISTOGRAM_SCALE_MAX};

/// Per-intensity sample counts of a face crop: bin `i` holds how many
/// samples have value `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityHistogram {
    bins: Vec<f64>,
}

impl IntensityHistogram {
    pub fn from_samples(samples: &[u8]) -> Self {
        let mut bins = vec![0.0f64; HISTOGRAM_BINS];
        for &s in samples {
            bins[s as usize] += 1.0;
        }
        Self { bins }
    }

    pub fn from_crop(crop: &FaceCrop) -> Self {
        Self::from_samples(crop.samples())
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Min-max rescale so the smallest bin maps to 0 and the largest to
    /// 255. A flat histogram maps to all zeros.
    pub fn normalized(&self) -> Self {
        let min = self.bins.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.bins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        let scale = if range > f64::EPSILON {
            HISTOGRAM_SCALE_MAX / range
        } else {
            0.0
        };
        Self {
            bins: self.bins.iter().map(|&v| (v - min) * scale).collect(),
        }
    }

    /// Pearson correlation of the two bin vectors.
    ///
    /// `None` when either histogram has zero variance, where the
    /// coefficient is undefined.
    pub fn correlation(&self, other: &IntensityHistogram) -> Option<f64> {
        pearson_correlation(&self.bins, &other.bins)
    }
}

fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n == 0 {
        return None;
    }

    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a < f64::EPSILON || var_b < f64::EPSILON {
        return None;
    }
    Some((cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn every_value_once() -> Vec<u8> {
        (0..=255u8).collect()
    }

    #[test]
    fn test_counts_samples_per_value() {
        let hist = IntensityHistogram::from_samples(&[0, 0, 7, 255]);
        assert_eq!(hist.bins().len(), HISTOGRAM_BINS);
        assert_eq!(hist.bins()[0], 2.0);
        assert_eq!(hist.bins()[7], 1.0);
        assert_eq!(hist.bins()[255], 1.0);
        assert_eq!(hist.bins().iter().sum::<f64>(), 4.0);
    }

    #[test]
    fn test_normalized_spans_full_range() {
        let hist = IntensityHistogram::from_samples(&[3, 3, 3, 3, 9, 9]).normalized();
        assert_relative_eq!(hist.bins()[3], 255.0);
        assert_relative_eq!(hist.bins()[9], 127.5);
        assert_eq!(hist.bins()[0], 0.0);
    }

    #[test]
    fn test_flat_histogram_normalizes_to_zeros() {
        let hist = IntensityHistogram::from_samples(&every_value_once()).normalized();
        assert!(hist.bins().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_self_correlation_is_one() {
        let samples: Vec<u8> = (0..1000u32).map(|i| ((i * 37) % 200) as u8).collect();
        let hist = IntensityHistogram::from_samples(&samples).normalized();
        assert_relative_eq!(hist.correlation(&hist).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirrored_histograms_anticorrelate() {
        let a = IntensityHistogram::from_samples(&[0u8; 10]);
        let rest: Vec<u8> = (1..=255u8).flat_map(|v| [v; 10]).collect();
        let b = IntensityHistogram::from_samples(&rest);
        assert_relative_eq!(a.correlation(&b).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_variance_has_no_correlation() {
        let flat = IntensityHistogram::from_samples(&every_value_once());
        let peaked = IntensityHistogram::from_samples(&[10, 10, 10]);
        assert_eq!(flat.correlation(&peaked), None);
        assert_eq!(peaked.correlation(&flat), None);
        assert_eq!(flat.normalized().correlation(&flat.normalized()), None);
    }

    #[test]
    fn test_correlation_is_symmetric() {
        let a = IntensityHistogram::from_samples(&[1, 2, 2, 3, 3, 3, 200]);
        let b = IntensityHistogram::from_samples(&[2, 3, 3, 4, 4, 4, 100]);
        assert_relative_eq!(a.correlation(&b).unwrap(), b.correlation(&a).unwrap());
    }
}
