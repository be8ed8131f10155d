//! Evidence classes and their likelihood contracts.
//!
//! Every class answers four questions for a candidate allele: how likely a
//! read is to land in the class at all (`log_class_prob`), how well one read's
//! datum fits (`log_read_prob`), how likely the observed number of reads in
//! the class is (`count_log_likelihood`), and which alleles are worth
//! searching given the class's reads (`grid_boundaries`). `None` means the
//! quantity is undefined for the inputs, which callers treat as "skip" for
//! invalid inputs and as zero probability for an allele that cannot produce
//! the read.

mod enclosing;
mod flanking;
mod frr;
mod spanning;

pub use enclosing::EnclosingClass;
pub use flanking::FlankingClass;
pub use frr::FrrClass;
pub use spanning::SpanningClass;

use crate::strgt::model::{FragmentGeometry, StutterModel};
use crate::strgt::reads::ReadKind;
use crate::utils::Ploidy;
use statrs::distribution::{Discrete, Poisson};

/// Expected reads per class that come from mismapped or misclassified
/// fragments, per off-target read observed (plus one).
pub const BACKGROUND_RATE: f64 = 0.01;

pub trait ReadClass: Send + Sync {
    fn kind(&self) -> ReadKind;

    fn geometry(&self) -> &FragmentGeometry;

    /// Log-probability of a read's datum given that the read is in this class.
    fn log_data_prob(
        &self,
        allele: i32,
        data: i32,
        read_len: i32,
        motif_len: i32,
        ref_count: i32,
    ) -> Option<f64>;

    /// Allele range supported by this class's reads.
    fn grid_boundaries(
        &self,
        data: &[i32],
        read_len: i32,
        motif_len: i32,
        coverage: f64,
        offtarget_count: usize,
        ref_count: i32,
    ) -> Option<(i32, i32)>;

    fn log_class_prob(&self, allele: i32, read_len: i32, motif_len: i32) -> Option<f64> {
        self.geometry()
            .log_class_prob(self.kind(), allele, read_len, motif_len)
    }

    fn log_read_prob(
        &self,
        allele: i32,
        data: i32,
        read_len: i32,
        motif_len: i32,
        ref_count: i32,
    ) -> Option<f64> {
        let class_prob = self.log_class_prob(allele, read_len, motif_len)?;
        let data_prob = self.log_data_prob(allele, data, read_len, motif_len, ref_count)?;
        let log_prob = class_prob + data_prob;
        log_prob.is_finite().then_some(log_prob)
    }

    /// Poisson log-likelihood of seeing `observed` reads of this class.
    #[allow(clippy::too_many_arguments)]
    fn count_log_likelihood(
        &self,
        allele1: i32,
        allele2: i32,
        read_len: i32,
        motif_len: i32,
        coverage: f64,
        ploidy: Ploidy,
        offtarget_count: usize,
        observed: usize,
    ) -> Option<f64> {
        let rate = expected_class_count(
            self.geometry(),
            self.kind(),
            (allele1, allele2),
            read_len,
            motif_len,
            coverage,
            ploidy,
            offtarget_count,
        )?;
        let poisson = Poisson::new(rate).ok()?;
        Some(poisson.ln_pmf(observed as u64))
    }
}

/// All four classes paired with their likelihood weights, in `ReadKind::ALL`
/// order.
pub fn weighted_classes(
    geometry: &FragmentGeometry,
    stutter: &StutterModel,
    weights: [f64; 4],
) -> [(Box<dyn ReadClass>, f64); 4] {
    let frr: Box<dyn ReadClass> = Box::new(FrrClass::new(geometry.clone()));
    let enclosing: Box<dyn ReadClass> =
        Box::new(EnclosingClass::new(geometry.clone(), stutter.clone()));
    let spanning: Box<dyn ReadClass> = Box::new(SpanningClass::new(geometry.clone()));
    let flanking: Box<dyn ReadClass> =
        Box::new(FlankingClass::new(geometry.clone(), stutter.clone()));
    [
        (frr, weights[0]),
        (enclosing, weights[1]),
        (spanning, weights[2]),
        (flanking, weights[3]),
    ]
}

/// Fragment starts per reference base contributed by one haplotype.
pub fn fragment_density(coverage: f64, read_len: i32, ploidy: Ploidy) -> Option<f64> {
    if coverage.is_nan() || coverage <= 0.0 || read_len <= 0 {
        return None;
    }
    Some(coverage / (2.0 * read_len as f64) / ploidy.copies() as f64)
}

pub fn background_count(offtarget_count: usize) -> f64 {
    (1 + offtarget_count) as f64 * BACKGROUND_RATE
}

/// Expected number of reads in `kind` for a genotype; haploid genotypes only
/// use the first allele.
#[allow(clippy::too_many_arguments)]
pub fn expected_class_count(
    geometry: &FragmentGeometry,
    kind: ReadKind,
    alleles: (i32, i32),
    read_len: i32,
    motif_len: i32,
    coverage: f64,
    ploidy: Ploidy,
    offtarget_count: usize,
) -> Option<f64> {
    let density = fragment_density(coverage, read_len, ploidy)?;
    let haplotypes: &[i32] = match ploidy {
        Ploidy::One => &[alleles.0],
        Ploidy::Two => &[alleles.0, alleles.1],
    };
    let mut signal = 0.0;
    for allele in haplotypes {
        signal += geometry.placements(*allele, read_len, motif_len)?.of(kind);
    }
    Some(density * signal + background_count(offtarget_count))
}

fn valid_lengths(read_len: i32, motif_len: i32) -> bool {
    read_len > 0 && motif_len > 0
}

fn valid_grid_inputs(data: &[i32], read_len: i32, motif_len: i32, coverage: f64) -> bool {
    !data.is_empty() && valid_lengths(read_len, motif_len) && coverage > 0.0
}
