use super::{valid_grid_inputs, valid_lengths, ReadClass};
use crate::strgt::model::{FragmentGeometry, StutterModel};
use crate::strgt::reads::ReadKind;

/// Reads covering the whole repeat; the datum is the observed unit count.
#[derive(Debug, Clone)]
pub struct EnclosingClass {
    geometry: FragmentGeometry,
    stutter: StutterModel,
}

impl EnclosingClass {
    pub fn new(geometry: FragmentGeometry, stutter: StutterModel) -> Self {
        EnclosingClass { geometry, stutter }
    }
}

impl ReadClass for EnclosingClass {
    fn kind(&self) -> ReadKind {
        ReadKind::Enclosing
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
        if data < 0 || !valid_lengths(read_len, motif_len) {
            return None;
        }
        let log_prob = self.stutter.log_prob(allele, data);
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
        let observed = data.iter().copied().filter(|d| *d >= 0);
        let (min, max) = observed.fold(None, |acc: Option<(i32, i32)>, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })?;

        let slip = self.stutter.max_slip();
        let lo = (min - slip).max(0);
        // Alleles longer than a read cannot be enclosed
        let hi = (max + slip).min(read_len / motif_len).max(lo);
        Some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strgt::model::InsertSizeModel;

    fn class(stutter: StutterModel) -> EnclosingClass {
        let geometry = FragmentGeometry::new(InsertSizeModel::new(400.0, 50.0).unwrap());
        EnclosingClass::new(geometry, stutter)
    }

    #[test]
    fn exact_count_is_certain_without_stutter() {
        let class = class(StutterModel::new(0.0, 0.0, 1.0, 1).unwrap());
        assert_eq!(class.log_data_prob(10, 10, 100, 3, 10), Some(0.0));
        assert_eq!(class.log_data_prob(10, 11, 100, 3, 10), None);
    }

    #[test]
    fn stutter_favors_the_observed_count() {
        let class = class(StutterModel::new(0.05, 0.05, 0.9, 1).unwrap());
        let matching = class.log_read_prob(10, 10, 100, 3, 10).unwrap();
        let slipped = class.log_read_prob(11, 10, 100, 3, 10).unwrap();
        assert!(matching > slipped);
        assert!(class.log_read_prob(13, 10, 100, 3, 10).is_none());
    }

    #[test]
    fn invalid_inputs_yield_none() {
        let class = class(StutterModel::new(0.05, 0.05, 0.9, 1).unwrap());
        assert!(class.log_read_prob(10, -1, 100, 3, 10).is_none());
        assert!(class.log_read_prob(10, 10, 0, 3, 10).is_none());
        assert!(class.log_read_prob(10, 10, 100, 0, 10).is_none());
    }

    #[test]
    fn grid_pads_by_max_slip() {
        let class = class(StutterModel::new(0.05, 0.05, 0.9, 2).unwrap());
        assert_eq!(
            class.grid_boundaries(&[12, 8, 10], 100, 3, 30.0, 0, 10),
            Some((6, 14))
        );
        assert_eq!(class.grid_boundaries(&[1], 100, 3, 30.0, 0, 10), Some((0, 3)));
        // Capped at the longest enclosable allele
        assert_eq!(class.grid_boundaries(&[33], 100, 3, 30.0, 0, 10), Some((31, 33)));
        assert_eq!(class.grid_boundaries(&[], 100, 3, 30.0, 0, 10), None);
        assert_eq!(class.grid_boundaries(&[10], 100, 3, 0.0, 0, 10), None);
    }
}
