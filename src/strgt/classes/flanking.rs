use super::{valid_grid_inputs, valid_lengths, ReadClass};
use crate::strgt::model::{FragmentGeometry, StutterModel};
use crate::strgt::reads::ReadKind;

/// Reads anchored in one flank that run into the repeat; the datum is the
/// number of repeat units the read covers, a lower bound on the allele.
#[derive(Debug, Clone)]
pub struct FlankingClass {
    geometry: FragmentGeometry,
    stutter: StutterModel,
}

impl FlankingClass {
    pub fn new(geometry: FragmentGeometry, stutter: StutterModel) -> Self {
        FlankingClass { geometry, stutter }
    }
}

impl ReadClass for FlankingClass {
    fn kind(&self) -> ReadKind {
        ReadKind::Flanking
    }

    fn geometry(&self) -> &FragmentGeometry {
        &self.geometry
    }

    fn log_data_prob(
        &self,
        allele: i32,
        data: i32,
        read_len: i32,
        motif_len: i32,
        _ref_count: i32,
    ) -> Option<f64> {
        if allele < 0 || !valid_lengths(read_len, motif_len) {
            return None;
        }
        let max_partial = read_len / motif_len;
        if data < 0 || data > max_partial {
            return None;
        }

        // Partial lengths are uniform over what the allele and read allow
        let cap = allele.min(max_partial);
        let uniform = -((cap + 1) as f64).ln();
        if data <= cap {
            return Some(uniform);
        }
        // Counts past the allele need an expansion stutter
        let log_prob = uniform + self.stutter.log_prob(allele, data);
        log_prob.is_finite().then_some(log_prob)
    }

    fn grid_boundaries(
        &self,
        data: &[i32],
        read_len: i32,
        motif_len: i32,
        coverage: f64,
        _offtarget_count: usize,
        _ref_count: i32,
    ) -> Option<(i32, i32)> {
        if !valid_grid_inputs(data, read_len, motif_len, coverage) {
            return None;
        }
        let longest = data.iter().copied().filter(|d| *d >= 0).max()?;
        let lo = (longest - self.stutter.max_slip()).max(0);
        Some((lo, longest + read_len / motif_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strgt::model::InsertSizeModel;
    use approx::assert_abs_diff_eq;

    fn class() -> FlankingClass {
        let geometry = FragmentGeometry::new(InsertSizeModel::new(400.0, 50.0).unwrap());
        FlankingClass::new(geometry, StutterModel::new(0.05, 0.05, 0.9, 1).unwrap())
    }

    #[test]
    fn partial_count_is_uniform_below_allele() {
        let class = class();
        let at_zero = class.log_data_prob(20, 0, 100, 3, 10).unwrap();
        let at_max = class.log_data_prob(20, 20, 100, 3, 10).unwrap();
        assert_abs_diff_eq!(at_zero, -(21.0_f64).ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(at_zero, at_max, epsilon = 1e-12);
    }

    #[test]
    fn long_alleles_cap_at_read_length() {
        let class = class();
        // 100bp reads hold at most 33 CAG units
        let p = class.log_data_prob(200, 10, 100, 3, 10).unwrap();
        assert_abs_diff_eq!(p, -(34.0_f64).ln(), epsilon = 1e-12);
        assert!(class.log_data_prob(200, 34, 100, 3, 10).is_none());
    }

    #[test]
    fn counts_past_allele_need_stutter() {
        let class = class();
        let within = class.log_data_prob(10, 10, 100, 3, 10).unwrap();
        let slipped = class.log_data_prob(10, 11, 100, 3, 10).unwrap();
        assert!(slipped < within);
        assert!(class.log_data_prob(10, 12, 100, 3, 10).is_none());
    }

    #[test]
    fn grid_starts_at_longest_partial() {
        let class = class();
        assert_eq!(
            class.grid_boundaries(&[4, 12, 7], 100, 3, 30.0, 0, 10),
            Some((11, 45))
        );
        assert_eq!(class.grid_boundaries(&[], 100, 3, 30.0, 0, 10), None);
        assert_eq!(class.grid_boundaries(&[-1], 100, 3, 30.0, 0, 10), None);
    }
}
