/// Terms lying more than this far below the larger term are dropped by
/// `fast_log_sum_exp`; equals ln(1e-7).
pub const LOG_THRESH: f64 = -16.118_095_650_958_32;

/// Computes ln(e^a + e^b), ignoring the smaller term when it falls below
/// `log_thresh` relative to the larger one.
#[inline]
pub fn fast_log_sum_exp(log_v1: f64, log_v2: f64, log_thresh: f64) -> f64 {
    let (hi, lo) = if log_v1 >= log_v2 {
        (log_v1, log_v2)
    } else {
        (log_v2, log_v1)
    };
    if hi == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let diff = lo - hi;
    if diff < log_thresh {
        return hi;
    }
    hi + diff.exp().ln_1p()
}

pub fn median(data: &[i32]) -> Option<f64> {
    let size = data.len();
    if size == 0 {
        return None;
    }
    let mut data_copy = data.to_vec();
    let (left, upper_mid, _) = data_copy.select_nth_unstable(size / 2);
    let upper_mid = *upper_mid as f64;
    if size % 2 == 1 {
        return Some(upper_mid);
    }
    // The lower middle is the largest element left of the partition point
    let lower_mid = *left.iter().max()? as f64;
    Some((lower_mid + upper_mid) / 2.0)
}

/// Nearest-rank percentile, `pct` in [0, 100].
pub fn percentile(data: &[i32], pct: f64) -> Option<i32> {
    if data.is_empty() || !(0.0..=100.0).contains(&pct) {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_unstable();
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    Some(sorted[index])
}
