//! Bootstrap resampling of a locus's reads for genotype confidence intervals.

use super::{GridSearch, Gt, LocusEvidence};
use crate::strgt::reads::ClassifiedRead;
use crate::utils::{percentile, Ploidy};
use arrayvec::ArrayVec;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

const CI_LOWER_PCT: f64 = 2.5;
const CI_UPPER_PCT: f64 = 97.5;

/// Draws `reads.len()` reads with replacement; sample `index` of a run
/// seeded with `seed` always draws the same reads.
pub fn resample(reads: &[ClassifiedRead], seed: u64, index: usize) -> Vec<ClassifiedRead> {
    if reads.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed ^ index as u64);
    (0..reads.len())
        .map(|_| reads[rng.random_range(0..reads.len())])
        .collect()
}

/// Re-genotypes `num_samples` resamples of the pooled reads. Resamples that
/// cannot be genotyped are left out.
pub fn bootstrap(
    search: &GridSearch,
    evidence: &LocusEvidence,
    num_samples: usize,
    seed: u64,
) -> Vec<Gt> {
    let pooled = evidence.pooled();
    (0..num_samples)
        .into_par_iter()
        .filter_map(|index| {
            let reads = resample(&pooled, seed, index);
            search
                .search(&evidence.with_reads(&reads))
                .ok()
                .map(|(gt, _)| gt)
        })
        .collect()
}

/// 95% percentile interval of each allele across bootstrap genotypes.
pub fn confidence_intervals(samples: &[Gt], ploidy: Ploidy) -> Option<ArrayVec<(i32, i32), 2>> {
    let mut intervals = ArrayVec::new();
    for haplotype in 0..ploidy.copies() {
        let alleles: Vec<i32> = samples
            .iter()
            .filter_map(|gt| gt.get(haplotype).copied())
            .collect();
        let lower = percentile(&alleles, CI_LOWER_PCT)?;
        let upper = percentile(&alleles, CI_UPPER_PCT)?;
        intervals.push((lower, upper));
    }
    Some(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strgt::reads::ReadKind;

    fn reads() -> Vec<ClassifiedRead> {
        (0..30)
            .map(|i| ClassifiedRead::new(ReadKind::Enclosing, 100, i, 3))
            .collect()
    }

    #[test]
    fn resample_is_reproducible() {
        let reads = reads();
        assert_eq!(resample(&reads, 7, 3), resample(&reads, 7, 3));
        assert_ne!(resample(&reads, 7, 3), resample(&reads, 8, 3));
        assert_ne!(resample(&reads, 7, 3), resample(&reads, 7, 4));
        assert_eq!(resample(&reads, 7, 3).len(), reads.len());
        assert!(resample(&[], 7, 3).is_empty());
    }

    #[test]
    fn intervals_per_haplotype() {
        let samples: Vec<Gt> = (0..100)
            .map(|i| Gt::from([10 + i % 3, 20 + i % 5]))
            .collect();
        let ci = confidence_intervals(&samples, Ploidy::Two).unwrap();
        assert_eq!(ci.as_slice(), &[(10, 12), (20, 24)]);

        let haploid: Vec<Gt> = samples
            .iter()
            .map(|gt| gt.iter().take(1).copied().collect())
            .collect();
        let ci = confidence_intervals(&haploid, Ploidy::One).unwrap();
        assert_eq!(ci.as_slice(), &[(10, 12)]);
        assert!(confidence_intervals(&[], Ploidy::Two).is_none());
    }
}
