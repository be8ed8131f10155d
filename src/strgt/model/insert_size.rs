//! Fragment-length model shared by the fragment-geometry read classes.

use crate::utils::Result;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Smallest number of insert-size samples accepted for estimating the model.
pub const MIN_INSERT_SAMPLES: usize = 100;

/// Samples longer than this multiple of the sample median are treated as
/// discordant pairs and excluded from estimation.
const MAX_INSERT_MEDIAN_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct InsertSizeModel {
    mean: f64,
    sdev: f64,
    dist: Normal,
}

impl InsertSizeModel {
    pub fn new(mean: f64, sdev: f64) -> Result<Self> {
        if !mean.is_finite() || mean <= 0.0 {
            return Err(format!("Insert size mean must be positive, got {}", mean));
        }
        if !sdev.is_finite() || sdev <= 0.0 {
            return Err(format!(
                "Insert size standard deviation must be positive, got {}",
                sdev
            ));
        }
        let dist = Normal::new(mean, sdev).map_err(|e| format!("Insert size model: {}", e))?;
        Ok(InsertSizeModel { mean, sdev, dist })
    }

    /// Estimates mean and standard deviation from observed insert sizes of
    /// concordant pairs. Returns `None` when there are too few usable samples.
    pub fn estimate(samples: &[i32]) -> Option<Self> {
        let positive: Vec<i32> = samples.iter().copied().filter(|s| *s > 0).collect();
        let median = crate::utils::median(&positive)?;
        let usable: Vec<f64> = positive
            .iter()
            .map(|s| *s as f64)
            .filter(|s| *s <= MAX_INSERT_MEDIAN_FACTOR * median)
            .collect();
        if usable.len() < MIN_INSERT_SAMPLES {
            return None;
        }
        let n = usable.len() as f64;
        let mean = usable.iter().sum::<f64>() / n;
        let var = usable.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        InsertSizeModel::new(mean, var.sqrt()).ok()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sdev(&self) -> f64 {
        self.sdev
    }

    pub fn pdf(&self, fragment_len: f64) -> f64 {
        self.dist.pdf(fragment_len)
    }

    pub fn log_pdf(&self, fragment_len: f64) -> f64 {
        self.dist.ln_pdf(fragment_len)
    }

    pub fn cdf(&self, fragment_len: f64) -> f64 {
        self.dist.cdf(fragment_len)
    }

    /// E[max(0, F - threshold)] for F drawn from the model.
    pub fn expected_excess(&self, threshold: f64) -> f64 {
        let tail = 1.0 - self.cdf(threshold);
        let excess = (self.mean - threshold) * tail + self.sdev * self.sdev * self.pdf(threshold);
        excess.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(InsertSizeModel::new(400.0, 0.0).is_err());
        assert!(InsertSizeModel::new(-1.0, 50.0).is_err());
        assert!(InsertSizeModel::new(f64::NAN, 50.0).is_err());
    }

    #[test]
    fn cdf_is_centered_on_mean() {
        let model = InsertSizeModel::new(400.0, 50.0).unwrap();
        assert_abs_diff_eq!(model.cdf(400.0), 0.5, epsilon = 1e-9);
        assert!(model.log_pdf(400.0) > model.log_pdf(500.0));
    }

    #[test]
    fn expected_excess_limits() {
        let model = InsertSizeModel::new(400.0, 50.0).unwrap();
        // Far below the distribution the excess is just mean - threshold
        assert_abs_diff_eq!(model.expected_excess(0.0), 400.0, epsilon = 1e-6);
        // Far above it vanishes
        assert!(model.expected_excess(1000.0) < 1e-9);
        // Monotone in the threshold
        assert!(model.expected_excess(350.0) > model.expected_excess(400.0));
        assert_abs_diff_eq!(
            model.expected_excess(400.0),
            50.0 / (2.0 * std::f64::consts::PI).sqrt(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn estimates_from_samples() {
        let samples: Vec<i32> = (0..210).map(|i| 300 + (i % 21) * 10).collect();
        let model = InsertSizeModel::estimate(&samples).unwrap();
        assert_abs_diff_eq!(model.mean(), 400.0, epsilon = 1.0);
        assert!(model.sdev() > 50.0 && model.sdev() < 70.0);
    }

    #[test]
    fn estimate_ignores_discordant_pairs() {
        let mut samples: Vec<i32> = vec![400; 150];
        samples.extend([50_000, 80_000, -20]);
        let model = InsertSizeModel::estimate(&[samples.as_slice(), &[390, 410]].concat()).unwrap();
        assert!(model.mean() > 399.0 && model.mean() < 401.0);
    }

    #[test]
    fn estimate_needs_enough_samples() {
        assert!(InsertSizeModel::estimate(&[400; 10]).is_none());
        assert!(InsertSizeModel::estimate(&[]).is_none());
    }
}
