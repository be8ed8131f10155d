use super::{valid_grid_inputs, valid_lengths, ReadClass};
use crate::strgt::model::FragmentGeometry;
use crate::strgt::reads::ReadKind;

/// Number of standard deviations searched around each spanning pair's
/// implied allele.
const SPAN_SDEVS: f64 = 3.0;

/// Pairs whose mates straddle the repeat; the datum is the insert size
/// measured against the reference.
#[derive(Debug, Clone)]
pub struct SpanningClass {
    geometry: FragmentGeometry,
}

impl SpanningClass {
    pub fn new(geometry: FragmentGeometry) -> Self {
        SpanningClass { geometry }
    }
}

impl ReadClass for SpanningClass {
    fn kind(&self) -> ReadKind {
        ReadKind::Spanning
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
        ref_count: i32,
    ) -> Option<f64> {
        if data <= 0 || allele < 0 || !valid_lengths(read_len, motif_len) {
            return None;
        }
        let str_len = allele as i64 * motif_len as i64;
        let fragment = data as i64 + (allele as i64 - ref_count as i64) * motif_len as i64;
        // Start positions that keep both mates outside the repeat
        let positions = fragment - 2 * read_len as i64 - str_len + 1;
        if positions <= 0 {
            return None;
        }
        let expected_positions = self.geometry.placements(allele, read_len, motif_len)?.spanning;
        if expected_positions <= 0.0 {
            return None;
        }

        let log_prob = self.geometry.insert().log_pdf(fragment as f64) + (positions as f64).ln()
            - expected_positions.ln();
        log_prob.is_finite().then_some(log_prob)
    }

    fn grid_boundaries(
        &self,
        data: &[i32],
        read_len: i32,
        motif_len: i32,
        coverage: f64,
        _offtarget_count: usize,
        ref_count: i32,
    ) -> Option<(i32, i32)> {
        if !valid_grid_inputs(data, read_len, motif_len, coverage) {
            return None;
        }
        let insert = self.geometry.insert();
        let motif_len = motif_len as f64;
        let spread = SPAN_SDEVS * insert.sdev() / motif_len;

        let (lo, hi) = data
            .iter()
            .filter(|d| **d > 0)
            .map(|d| ref_count as f64 + (insert.mean() - *d as f64) / motif_len)
            .fold(None, |acc: Option<(f64, f64)>, center| match acc {
                None => Some((center, center)),
                Some((lo, hi)) => Some((lo.min(center), hi.max(center))),
            })?;

        let hi = (hi + spread).ceil();
        if hi < 0.0 {
            return None;
        }
        let lo = (lo - spread).floor().max(0.0);
        Some((lo as i32, hi as i32))
    }
}
