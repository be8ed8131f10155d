//! Run-wide model settings, validated once and read-only afterwards.

use crate::strgt::genotype::{GridPolicy, TieBreak};
use crate::strgt::model::{InsertSizeModel, StutterModel};
use crate::strgt::reads::ReadKind;
use crate::utils::{Ploidy, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub frr_weight: f64,
    pub enclosing_weight: f64,
    pub spanning_weight: f64,
    pub flanking_weight: f64,
    pub dist_mean: f64,
    pub dist_sdev: f64,
    /// Insert size parameters were given explicitly and must not be estimated
    pub dist_man_set: bool,
    pub stutter_up: f64,
    pub stutter_down: f64,
    pub stutter_p: f64,
    pub stutter_max: i32,
    pub ploidy: Ploidy,
    pub num_boot_samp: usize,
    pub seed: u64,
    pub flanklen: usize,
    pub realignment_flanklen: usize,
    pub regionsize: usize,
    pub grid_policy: GridPolicy,
    pub tie_break: TieBreak,
    pub output_bootstrap: bool,
    pub output_readinfo: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            frr_weight: 0.3,
            enclosing_weight: 0.3,
            spanning_weight: 1.0,
            flanking_weight: 0.5,
            dist_mean: 200.0,
            dist_sdev: 200.0,
            dist_man_set: false,
            stutter_up: 0.0364653,
            stutter_down: 0.0428387,
            stutter_p: 0.818913,
            stutter_max: 5,
            ploidy: Ploidy::Two,
            num_boot_samp: 0,
            seed: 0,
            flanklen: 3000,
            realignment_flanklen: 100,
            regionsize: 2000,
            grid_policy: GridPolicy::Union,
            tie_break: TieBreak::ClosestToReference,
            output_bootstrap: false,
            output_readinfo: false,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        for kind in ReadKind::ALL {
            let weight = self.weight(kind);
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!(
                    "{} weight must be a non-negative number, got {}",
                    kind, weight
                ));
            }
        }
        self.insert_model()?;
        self.stutter_model()?;
        if self.realignment_flanklen > self.flanklen {
            return Err(format!(
                "Realignment flank length {} exceeds the read collection window {}",
                self.realignment_flanklen, self.flanklen
            ));
        }
        Ok(())
    }

    pub fn weight(&self, kind: ReadKind) -> f64 {
        match kind {
            ReadKind::Frr => self.frr_weight,
            ReadKind::Enclosing => self.enclosing_weight,
            ReadKind::Spanning => self.spanning_weight,
            ReadKind::Flanking => self.flanking_weight,
        }
    }

    pub fn insert_model(&self) -> Result<InsertSizeModel> {
        InsertSizeModel::new(self.dist_mean, self.dist_sdev)
    }

    pub fn stutter_model(&self) -> Result<StutterModel> {
        StutterModel::new(
            self.stutter_up,
            self.stutter_down,
            self.stutter_p,
            self.stutter_max,
        )
    }

    /// Replaces the insert size parameters with estimates from `samples`
    /// unless they were set by hand. Returns whether they changed.
    pub fn estimate_insert_size(&mut self, samples: &[i32]) -> bool {
        if self.dist_man_set {
            return false;
        }
        match InsertSizeModel::estimate(samples) {
            Some(model) => {
                log::info!(
                    "Estimated insert size {:.1} +/- {:.1} from {} pairs",
                    model.mean(),
                    model.sdev(),
                    samples.len()
                );
                self.dist_mean = model.mean();
                self.dist_sdev = model.sdev();
                true
            }
            None => {
                log::warn!(
                    "Too few insert size samples ({}), using {:.1} +/- {:.1}",
                    samples.len(),
                    self.dist_mean,
                    self.dist_sdev
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strgt::model::MIN_INSERT_SAMPLES;

    #[test]
    fn defaults_are_valid() {
        let options = Options::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.weight(ReadKind::Spanning), 1.0);
        assert_eq!(options.ploidy, Ploidy::Two);
    }

    #[test]
    fn invalid_settings_err() {
        let options = Options {
            flanking_weight: -0.5,
            ..Default::default()
        };
        assert_eq!(
            options.validate().err().unwrap(),
            "FLANKING weight must be a non-negative number, got -0.5"
        );

        let options = Options {
            stutter_p: 1.5,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = Options {
            dist_sdev: 0.0,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = Options {
            realignment_flanklen: 500,
            flanklen: 200,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn insert_size_estimated_only_when_not_set() {
        let samples: Vec<i32> = (0..MIN_INSERT_SAMPLES as i32).map(|i| 380 + i % 41).collect();

        let mut options = Options::default();
        assert!(options.estimate_insert_size(&samples));
        assert!((options.dist_mean - 400.0).abs() < 5.0);

        let mut manual = Options {
            dist_man_set: true,
            ..Default::default()
        };
        assert!(!manual.estimate_insert_size(&samples));
        assert_eq!(manual.dist_mean, 200.0);

        let mut too_few = Options::default();
        assert!(!too_few.estimate_insert_size(&samples[..10]));
        assert_eq!(too_few.dist_sdev, 200.0);
    }
}
