//! Allele grid construction and exhaustive genotype search.

use super::Gt;
use crate::strgt::classes::{FrrClass, ReadClass};
use crate::strgt::reads::{ClassifiedRead, ReadKind};
use crate::strgt::locus::RejectReason;
use crate::utils::{fast_log_sum_exp, Ploidy, LOG_THRESH};
use rayon::prelude::*;
use std::{fmt, str::FromStr};

/// Widest allele range searched at a single locus.
pub const MAX_GRID_WIDTH: i32 = 500;

/// Log-probability assigned to a read no haplotype of a genotype can produce.
pub const READ_LOG_FLOOR: f64 = -23.025_850_929_940_457;

const TIE_TOLERANCE: f64 = 1e-9;

/// How per-class allele ranges are combined into one search range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPolicy {
    Union,
    Intersection,
}

impl GridPolicy {
    pub fn reconcile(&self, bounds: &[(i32, i32)]) -> Option<(i32, i32)> {
        let (first, rest) = bounds.split_first()?;
        let (lo, hi) = rest.iter().fold(*first, |(lo, hi), (l, h)| match self {
            GridPolicy::Union => (lo.min(*l), hi.max(*h)),
            GridPolicy::Intersection => (lo.max(*l), hi.min(*h)),
        });
        (lo <= hi).then_some((lo, hi))
    }
}

impl FromStr for GridPolicy {
    type Err = &'static str;
    fn from_str(policy: &str) -> Result<Self, Self::Err> {
        match policy {
            "union" => Ok(GridPolicy::Union),
            "intersection" => Ok(GridPolicy::Intersection),
            _ => Err("Invalid grid policy"),
        }
    }
}

impl fmt::Display for GridPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridPolicy::Union => f.write_str("union"),
            GridPolicy::Intersection => f.write_str("intersection"),
        }
    }
}

/// Which of several equally likely genotypes is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Fewest total units away from the reference, then smallest
    ClosestToReference,
    Smallest,
}

impl TieBreak {
    fn prefers(&self, candidate: &[i32], incumbent: &[i32], ref_count: i32) -> bool {
        match self {
            TieBreak::ClosestToReference => {
                let distance = |gt: &[i32]| gt.iter().map(|a| (a - ref_count).abs()).sum::<i32>();
                (distance(candidate), candidate) < (distance(incumbent), incumbent)
            }
            TieBreak::Smallest => candidate < incumbent,
        }
    }
}

impl FromStr for TieBreak {
    type Err = &'static str;
    fn from_str(tie_break: &str) -> Result<Self, Self::Err> {
        match tie_break {
            "closest" => Ok(TieBreak::ClosestToReference),
            "smallest" => Ok(TieBreak::Smallest),
            _ => Err("Invalid tie-break rule"),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::ClosestToReference => f.write_str("closest"),
            TieBreak::Smallest => f.write_str("smallest"),
        }
    }
}

/// Classified reads of one locus with the locus-wide quantities the
/// likelihood depends on.
#[derive(Debug, Clone)]
pub struct LocusEvidence {
    reads: [Vec<ClassifiedRead>; 4],
    pub read_len: i32,
    pub motif_len: i32,
    pub ref_count: i32,
    pub coverage: f64,
    pub offtarget_count: usize,
}

impl LocusEvidence {
    pub fn new(
        reads: &[ClassifiedRead],
        read_len: i32,
        motif_len: i32,
        ref_count: i32,
        coverage: f64,
        offtarget_count: usize,
    ) -> Self {
        let mut by_kind: [Vec<ClassifiedRead>; 4] = Default::default();
        for read in reads {
            by_kind[read.kind.index()].push(*read);
        }
        LocusEvidence {
            reads: by_kind,
            read_len,
            motif_len,
            ref_count,
            coverage,
            offtarget_count,
        }
    }

    /// Same locus-wide quantities, different reads.
    pub fn with_reads(&self, reads: &[ClassifiedRead]) -> Self {
        LocusEvidence::new(
            reads,
            self.read_len,
            self.motif_len,
            self.ref_count,
            self.coverage,
            self.offtarget_count,
        )
    }

    pub fn reads(&self, kind: ReadKind) -> &[ClassifiedRead] {
        &self.reads[kind.index()]
    }

    pub fn pooled(&self) -> Vec<ClassifiedRead> {
        self.reads.iter().flatten().copied().collect()
    }

    fn data(&self, kind: ReadKind) -> Vec<i32> {
        self.reads(kind).iter().map(|r| r.data).collect()
    }
}

/// Maximum-likelihood genotype search over an allele grid.
pub struct GridSearch {
    classes: [(Box<dyn ReadClass>, f64); 4],
    ceiling: FrrClass,
    ploidy: Ploidy,
    policy: GridPolicy,
    tie_break: TieBreak,
}

impl GridSearch {
    pub fn new(
        classes: [(Box<dyn ReadClass>, f64); 4],
        ceiling: FrrClass,
        ploidy: Ploidy,
        policy: GridPolicy,
        tie_break: TieBreak,
    ) -> Self {
        GridSearch {
            classes,
            ceiling,
            ploidy,
            policy,
            tie_break,
        }
    }

    /// Allele range to search, bounded below by zero and above by the
    /// coverage-derived ceiling.
    pub fn bounds(&self, evidence: &LocusEvidence) -> Option<(i32, i32)> {
        let class_bounds: Vec<(i32, i32)> = self
            .classes
            .iter()
            .filter_map(|(class, _)| {
                let kind = class.kind();
                let bounds = class.grid_boundaries(
                    &evidence.data(kind),
                    evidence.read_len,
                    evidence.motif_len,
                    evidence.coverage,
                    evidence.offtarget_count,
                    evidence.ref_count,
                );
                if let Some((lo, hi)) = bounds {
                    log::trace!("{} reads bound alleles to [{}, {}]", kind, lo, hi);
                }
                bounds
            })
            .collect();

        let (lo, hi) = self.policy.reconcile(&class_bounds)?;
        let lo = lo.max(0);
        let ceiling = self
            .ceiling
            .allele_ceiling(
                evidence.reads(ReadKind::Frr).len(),
                evidence.read_len,
                evidence.motif_len,
                evidence.coverage,
                evidence.offtarget_count,
            )
            .unwrap_or(hi)
            .max(lo);
        let hi = hi.min(ceiling).min(lo + MAX_GRID_WIDTH - 1);
        (lo <= hi).then_some((lo, hi))
    }

    pub fn search(&self, evidence: &LocusEvidence) -> Result<(Gt, f64), RejectReason> {
        let (lo, hi) = self.bounds(evidence).ok_or(RejectReason::EmptyGrid)?;
        let table = self.read_prob_table(evidence, lo, hi);

        let cells = grid_cells(lo, hi, self.ploidy);
        let scored: Vec<(Gt, f64)> = cells
            .into_par_iter()
            .map(|gt| {
                let ll = self.cell_log_likelihood(&gt, lo, &table, evidence);
                (gt, ll)
            })
            .collect();

        best_cell(&scored, self.tie_break, evidence.ref_count).ok_or(RejectReason::NoLikelihood)
    }

    /// Per-allele log-probabilities of every read, `[allele - lo][kind][read]`.
    fn read_prob_table(&self, evidence: &LocusEvidence, lo: i32, hi: i32) -> Vec<[Vec<f64>; 4]> {
        (lo..=hi)
            .into_par_iter()
            .map(|allele| {
                let mut row: [Vec<f64>; 4] = Default::default();
                for (class, _) in self.classes.iter() {
                    let kind = class.kind();
                    row[kind.index()] = evidence
                        .reads(kind)
                        .iter()
                        .map(|read| {
                            class
                                .log_read_prob(
                                    allele,
                                    read.data,
                                    read.read_len,
                                    read.motif_len,
                                    evidence.ref_count,
                                )
                                .unwrap_or(f64::NEG_INFINITY)
                        })
                        .collect();
                }
                row
            })
            .collect()
    }

    fn cell_log_likelihood(
        &self,
        gt: &Gt,
        lo: i32,
        table: &[[Vec<f64>; 4]],
        evidence: &LocusEvidence,
    ) -> f64 {
        let (allele1, allele2) = match gt.as_slice() {
            [a] => (*a, *a),
            [a1, a2] => (*a1, *a2),
            _ => return f64::NEG_INFINITY,
        };
        let row1 = &table[(allele1 - lo) as usize];
        let row2 = &table[(allele2 - lo) as usize];
        let ln_half = 0.5_f64.ln();

        let mut total = 0.0;
        for (class, weight) in self.classes.iter() {
            if *weight == 0.0 {
                continue;
            }
            let kind = class.kind();
            let reads = evidence.reads(kind);
            let count_ll = class
                .count_log_likelihood(
                    allele1,
                    allele2,
                    evidence.read_len,
                    evidence.motif_len,
                    evidence.coverage,
                    self.ploidy,
                    evidence.offtarget_count,
                    reads.len(),
                )
                .unwrap_or(0.0);

            let reads_ll: f64 = row1[kind.index()]
                .iter()
                .zip(row2[kind.index()].iter())
                .map(|(p1, p2)| {
                    let mix = match self.ploidy {
                        Ploidy::One => *p1,
                        Ploidy::Two => fast_log_sum_exp(ln_half + p1, ln_half + p2, LOG_THRESH),
                    };
                    if mix == f64::NEG_INFINITY {
                        READ_LOG_FLOOR
                    } else {
                        mix
                    }
                })
                .sum();

            total += weight * (count_ll + reads_ll);
        }
        total
    }
}

/// Genotypes over `[lo, hi]`: singletons when haploid, `a1 <= a2` pairs
/// when diploid.
pub fn grid_cells(lo: i32, hi: i32, ploidy: Ploidy) -> Vec<Gt> {
    match ploidy {
        Ploidy::One => (lo..=hi).map(|a| [a].into_iter().collect()).collect(),
        Ploidy::Two => (lo..=hi)
            .flat_map(|a1| (a1..=hi).map(move |a2| Gt::from([a1, a2])))
            .collect(),
    }
}

/// Highest-scoring finite cell; ties go to the rule's preferred genotype.
pub fn best_cell(cells: &[(Gt, f64)], tie_break: TieBreak, ref_count: i32) -> Option<(Gt, f64)> {
    let mut best: Option<&(Gt, f64)> = None;
    for cell in cells.iter().filter(|(_, ll)| ll.is_finite()) {
        best = match best {
            None => Some(cell),
            Some(incumbent) => {
                let (gt, ll) = cell;
                let (best_gt, best_ll) = incumbent;
                if *ll > best_ll + TIE_TOLERANCE
                    || ((ll - best_ll).abs() <= TIE_TOLERANCE
                        && tie_break.prefers(gt, best_gt, ref_count))
                {
                    Some(cell)
                } else {
                    Some(incumbent)
                }
            }
        };
    }
    best.cloned()
}
