//! Placement counting shared by all read classes.
//!
//! For a repeat of `s` bases and reads of `L` bases, count the read (or
//! fragment) positions that would put a read into each evidence class. Both
//! mates are counted for the single-read classes; the spanning class counts
//! fragment starts whose mates fall on opposite sides of the repeat and is
//! averaged over the fragment-length distribution.

use super::InsertSizeModel;
use crate::strgt::reads::ReadKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placements {
    pub enclosing: f64,
    pub frr: f64,
    pub flanking: f64,
    pub spanning: f64,
}

impl Placements {
    pub fn total(&self) -> f64 {
        self.enclosing + self.frr + self.flanking + self.spanning
    }

    pub fn of(&self, kind: ReadKind) -> f64 {
        match kind {
            ReadKind::Frr => self.frr,
            ReadKind::Enclosing => self.enclosing,
            ReadKind::Spanning => self.spanning,
            ReadKind::Flanking => self.flanking,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentGeometry {
    insert: InsertSizeModel,
}

impl FragmentGeometry {
    pub fn new(insert: InsertSizeModel) -> Self {
        FragmentGeometry { insert }
    }

    pub fn insert(&self) -> &InsertSizeModel {
        &self.insert
    }

    /// Returns `None` for non-positive lengths or a negative allele.
    pub fn placements(&self, allele: i32, read_len: i32, motif_len: i32) -> Option<Placements> {
        if allele < 0 || read_len <= 0 || motif_len <= 0 {
            return None;
        }
        let str_len = allele as i64 * motif_len as i64;
        let read_len = read_len as i64;

        let enclosing_per_mate = (read_len - str_len + 1).max(0);
        let frr_per_mate = (str_len - read_len + 1).max(0);
        let overlapping_per_mate = read_len + str_len - 1;
        let flanking_per_mate =
            (overlapping_per_mate - enclosing_per_mate - frr_per_mate).max(0);
        let spanning = self
            .insert
            .expected_excess((2 * read_len + str_len - 1) as f64);

        Some(Placements {
            enclosing: 2.0 * enclosing_per_mate as f64,
            frr: 2.0 * frr_per_mate as f64,
            flanking: 2.0 * flanking_per_mate as f64,
            spanning,
        })
    }

    /// Log of the fraction of placements that fall into `kind`.
    pub fn log_class_prob(
        &self,
        kind: ReadKind,
        allele: i32,
        read_len: i32,
        motif_len: i32,
    ) -> Option<f64> {
        let placements = self.placements(allele, read_len, motif_len)?;
        let class_placements = placements.of(kind);
        let total = placements.total();
        if class_placements <= 0.0 || total <= 0.0 {
            return None;
        }
        Some(class_placements.ln() - total.ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn geometry() -> FragmentGeometry {
        FragmentGeometry::new(InsertSizeModel::new(400.0, 50.0).unwrap())
    }

    #[test]
    fn short_repeat_placements() {
        // 30bp repeat, 100bp reads
        let p = geometry().placements(10, 100, 3).unwrap();
        assert_eq!(p.enclosing, 142.0);
        assert_eq!(p.frr, 0.0);
        assert_eq!(p.flanking, 2.0 * (129.0 - 71.0));
        assert!(p.spanning > 150.0 && p.spanning < 200.0);
    }

    #[test]
    fn long_repeat_placements() {
        // 150bp repeat, 100bp reads
        let p = geometry().placements(50, 100, 3).unwrap();
        assert_eq!(p.enclosing, 0.0);
        assert_eq!(p.frr, 102.0);
        assert_eq!(p.flanking, 2.0 * (249.0 - 51.0));
    }

    #[test]
    fn class_probabilities_sum_to_one() {
        let geometry = geometry();
        for allele in [0, 5, 33, 34, 100, 400] {
            let total: f64 = ReadKind::ALL
                .iter()
                .filter_map(|kind| geometry.log_class_prob(*kind, allele, 100, 3))
                .map(f64::exp)
                .sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn invalid_inputs() {
        let geometry = geometry();
        assert!(geometry.placements(-1, 100, 3).is_none());
        assert!(geometry.placements(10, 0, 3).is_none());
        assert!(geometry.placements(10, 100, 0).is_none());
        assert!(geometry
            .log_class_prob(ReadKind::Frr, 10, 100, 3)
            .is_none());
    }
}
