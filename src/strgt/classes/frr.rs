use super::{background_count, fragment_density, valid_grid_inputs, valid_lengths, ReadClass};
use crate::strgt::model::FragmentGeometry;
use crate::strgt::reads::ReadKind;
use crate::utils::Ploidy;

/// Fully-repetitive reads; the datum is the distance from the anchored mate
/// to the repeat boundary.
#[derive(Debug, Clone)]
pub struct FrrClass {
    geometry: FragmentGeometry,
}

impl FrrClass {
    pub fn new(geometry: FragmentGeometry) -> Self {
        FrrClass { geometry }
    }

    /// Largest allele whose expected FRR count stays within a generous
    /// Poisson tolerance of `observed`, assuming the expansion sits on one
    /// haplotype of a diploid genome.
    pub fn allele_ceiling(
        &self,
        observed: usize,
        read_len: i32,
        motif_len: i32,
        coverage: f64,
        offtarget_count: usize,
    ) -> Option<i32> {
        if !valid_lengths(read_len, motif_len) {
            return None;
        }
        let density = fragment_density(coverage, read_len, Ploidy::Two)?;
        let observed = observed as f64;
        let tolerance = observed + 5.0 * (observed + 1.0).sqrt() + 5.0;
        let signal = (tolerance - background_count(offtarget_count)).max(0.0);

        // FRR placements of a haplotype are 2 * (s - L + 1)
        let max_str_len = signal / (2.0 * density) + read_len as f64 - 1.0;
        Some((max_str_len / motif_len as f64).floor() as i32)
    }
}

impl ReadClass for FrrClass {
    fn kind(&self) -> ReadKind {
        ReadKind::Frr
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
        if data < 0 || allele < 0 || !valid_lengths(read_len, motif_len) {
            return None;
        }
        let str_len = allele as i64 * motif_len as i64;
        let read_len = read_len as i64;
        if str_len < read_len {
            return None;
        }

        // Fragment must cover the anchor distance, the read and at most the
        // rest of the repeat
        let insert = self.geometry.insert();
        let lo = (data as i64 + read_len) as f64 - 0.5;
        let hi = (data as i64 + str_len) as f64 + 0.5;
        let mass = insert.cdf(hi) - insert.cdf(lo);
        if mass.is_nan() || mass <= 0.0 {
            return None;
        }
        Some(mass.ln() - ((str_len - read_len + 1) as f64).ln())
    }

    fn grid_boundaries(
        &self,
        data: &[i32],
        read_len: i32,
        motif_len: i32,
        coverage: f64,
        offtarget_count: usize,
        _ref_count: i32,
    ) -> Option<(i32, i32)> {
        if !valid_grid_inputs(data, read_len, motif_len, coverage) {
            return None;
        }
        // Smallest allele that fills a whole read
        let lo = (read_len + motif_len - 1) / motif_len;
        let hi = self.allele_ceiling(data.len(), read_len, motif_len, coverage, offtarget_count)?;
        Some((lo, hi.max(lo)))
    }
}
