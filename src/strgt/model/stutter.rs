//! PCR stutter error model.
//!
//! The observed repeat-unit count of a read differs from the true allele by
//! `d = observed - allele` units. No slippage happens with probability
//! `stutter_p`; the remaining mass is spread over expansions (`d > 0`, decaying
//! as `stutter_up^d`) and contractions (`d < 0`, decaying as
//! `stutter_down^|d|`), normalized over `|d| <= max_slip`.

use crate::utils::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct StutterModel {
    up: f64,
    down: f64,
    no_stutter: f64,
    max_slip: i32,
    tail_norm: f64,
}

impl StutterModel {
    pub fn new(stutter_up: f64, stutter_down: f64, stutter_p: f64, max_slip: i32) -> Result<Self> {
        for (name, value) in [
            ("stutter up", stutter_up),
            ("stutter down", stutter_down),
            ("stutter probability", stutter_p),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if max_slip < 0 {
            return Err(format!(
                "Maximum stutter slippage must be non-negative, got {}",
                max_slip
            ));
        }

        let tail_norm = (1..=max_slip)
            .map(|k| stutter_up.powi(k) + stutter_down.powi(k))
            .sum::<f64>();

        // Without any tail mass all probability sits on the true allele
        let no_stutter = if tail_norm > 0.0 { stutter_p } else { 1.0 };

        Ok(StutterModel {
            up: stutter_up,
            down: stutter_down,
            no_stutter,
            max_slip,
            tail_norm,
        })
    }

    pub fn max_slip(&self) -> i32 {
        self.max_slip
    }

    /// Probability of observing `observed` units from a true `allele`.
    /// Down-tail mass that would fall below zero units is dropped without
    /// renormalizing, so alleles shorter than `max_slip` sum to less than one.
    pub fn prob(&self, allele: i32, observed: i32) -> f64 {
        if allele < 0 || observed < 0 {
            return 0.0;
        }
        let delta = observed - allele;
        if delta.abs() > self.max_slip {
            return 0.0;
        }
        match delta {
            0 => self.no_stutter,
            _ if self.tail_norm == 0.0 => 0.0,
            d if d > 0 => (1.0 - self.no_stutter) * self.up.powi(d) / self.tail_norm,
            d => (1.0 - self.no_stutter) * self.down.powi(-d) / self.tail_norm,
        }
    }

    /// Natural-log counterpart of `prob`; `f64::NEG_INFINITY` marks deviations
    /// the model cannot produce.
    pub fn log_prob(&self, allele: i32, observed: i32) -> f64 {
        self.prob(allele, observed).ln()
    }
}
