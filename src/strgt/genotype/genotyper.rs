//! Per-locus genotyping workflow.

use super::bootstrap::{bootstrap, confidence_intervals};
use super::{GridSearch, LocusEvidence};
use crate::strgt::classes::{weighted_classes, FrrClass};
use crate::strgt::locus::{Locus, LocusState, RejectReason};
use crate::strgt::model::FragmentGeometry;
use crate::strgt::options::Options;
use crate::strgt::reads::{ClassifiedRead, LocusReads, ReadKind, ReadSource};
use crate::strgt::reference::{get_flanks, ReferenceSource};
use crate::utils::{median, Ploidy, Result};

pub struct Genotyper<'a> {
    reference: &'a dyn ReferenceSource,
    search: GridSearch,
    ploidy: Ploidy,
    realignment_flanklen: usize,
    regionsize: usize,
    num_boot_samp: usize,
    seed: u64,
}

impl<'a> Genotyper<'a> {
    pub fn new(options: &Options, reference: &'a dyn ReferenceSource) -> Result<Self> {
        options.validate()?;
        let geometry = FragmentGeometry::new(options.insert_model()?);
        let stutter = options.stutter_model()?;

        let weights = ReadKind::ALL.map(|kind| options.weight(kind));
        let classes = weighted_classes(&geometry, &stutter, weights);
        let search = GridSearch::new(
            classes,
            FrrClass::new(geometry),
            options.ploidy,
            options.grid_policy,
            options.tie_break,
        );

        Ok(Genotyper {
            reference,
            search,
            ploidy: options.ploidy,
            realignment_flanklen: options.realignment_flanklen,
            regionsize: options.regionsize,
            num_boot_samp: options.num_boot_samp,
            seed: options.seed,
        })
    }

    /// Fills in the locus flanks; false if they would leave the contig.
    pub fn set_flanks(&self, locus: &mut Locus) -> bool {
        match get_flanks(self.reference, &locus.region, self.realignment_flanklen) {
            Ok((pre_flank, post_flank)) => {
                locus.pre_flank = pre_flank;
                locus.post_flank = post_flank;
                true
            }
            Err(err) => {
                log::debug!("{}: {}", locus.region, err);
                false
            }
        }
    }

    /// Genotypes `locus` from the reads `source` reports for it. Returns
    /// `Ok(false)` when the locus is rejected; errors only come from the
    /// read source.
    pub fn process_locus(&self, source: &mut dyn ReadSource, locus: &mut Locus) -> Result<bool> {
        locus.reset();
        if !self.set_flanks(locus) {
            return reject(locus, RejectReason::FlanksUnavailable);
        }
        locus.transition(LocusState::FlanksSet)?;

        let locus_reads = source.fetch_locus_reads(locus)?;
        let evidence = match self.collect_evidence(locus, locus_reads) {
            Some(evidence) => evidence,
            None => return reject(locus, RejectReason::NoReads),
        };
        locus.transition(LocusState::Classified)?;
        log::debug!(
            "{}: {} FRR, {} enclosing, {} spanning, {} flanking, {} off-target reads, coverage {:.2}",
            locus.region,
            locus.read_counts.get(ReadKind::Frr),
            locus.read_counts.get(ReadKind::Enclosing),
            locus.read_counts.get(ReadKind::Spanning),
            locus.read_counts.get(ReadKind::Flanking),
            locus.offtarget_count,
            locus.coverage
        );

        let (gt, max_ll) = match self.search.search(&evidence) {
            Ok(best) => best,
            Err(reason) => return reject(locus, reason),
        };
        locus.gt = Some(gt);
        locus.max_ll = Some(max_ll);
        locus.transition(LocusState::GridSearched)?;

        if self.num_boot_samp > 0 {
            locus.bootstrap = bootstrap(&self.search, &evidence, self.num_boot_samp, self.seed);
            locus.ci = confidence_intervals(&locus.bootstrap, self.ploidy);
            if locus.bootstrap.len() < self.num_boot_samp {
                log::debug!(
                    "{}: {} of {} bootstrap samples genotyped",
                    locus.region,
                    locus.bootstrap.len(),
                    self.num_boot_samp
                );
            }
        }
        locus.transition(LocusState::Done)?;
        Ok(true)
    }

    /// Records read counts and coverage on the locus; `None` if no usable
    /// read remains.
    fn collect_evidence(&self, locus: &mut Locus, locus_reads: LocusReads) -> Option<LocusEvidence> {
        let total = locus_reads.reads.len();
        let reads: Vec<ClassifiedRead> = locus_reads
            .reads
            .into_iter()
            .filter(|read| read.read_len > 0)
            .collect();
        if reads.len() < total {
            log::debug!(
                "{}: dropped {} reads without a positive read length",
                locus.region,
                total - reads.len()
            );
        }

        for read in &reads {
            locus.read_counts.add(read.kind);
        }
        locus.offtarget_count = locus_reads.offtarget_count;
        if reads.is_empty() {
            return None;
        }

        let read_lens: Vec<i32> = reads.iter().map(|r| r.read_len).collect();
        let read_len = median(&read_lens)?.round() as i32;
        let window = locus.region.length() as f64 + 2.0 * self.regionsize as f64;
        locus.coverage =
            (reads.len() + locus.offtarget_count) as f64 * read_len as f64 / window;

        let evidence = LocusEvidence::new(
            &reads,
            read_len,
            locus.period,
            locus.ref_count(),
            locus.coverage,
            locus.offtarget_count,
        );
        locus.reads = reads;
        Some(evidence)
    }
}

fn reject(locus: &mut Locus, reason: RejectReason) -> Result<bool> {
    locus.transition(LocusState::Rejected(reason))?;
    log::info!("{}: skipping locus, {}", locus.region, reason);
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strgt::genotype::{GridPolicy, Gt};
    use crate::strgt::reference::InMemoryReference;

    struct FixedReads {
        reads: LocusReads,
        fetches: usize,
    }

    impl FixedReads {
        fn new(reads: Vec<ClassifiedRead>, offtarget_count: usize) -> Self {
            FixedReads {
                reads: LocusReads {
                    reads,
                    offtarget_count,
                },
                fetches: 0,
            }
        }
    }

    impl ReadSource for FixedReads {
        fn fetch_locus_reads(&mut self, _locus: &Locus) -> Result<LocusReads> {
            self.fetches += 1;
            Ok(self.reads.clone())
        }
    }

    fn reference() -> InMemoryReference {
        InMemoryReference::new().with_contig("chr1", &"ACGT".repeat(250))
    }

    fn options() -> Options {
        Options {
            dist_mean: 400.0,
            dist_sdev: 50.0,
            stutter_up: 0.0,
            stutter_down: 0.0,
            stutter_p: 1.0,
            ..Default::default()
        }
    }

    fn locus() -> Locus {
        // CAG x 10 in the reference
        Locus::new("chr1", 201, 230, "CAG").unwrap()
    }

    fn enclosing(counts: &[(i32, usize)]) -> Vec<ClassifiedRead> {
        counts
            .iter()
            .flat_map(|(count, n)| {
                std::iter::repeat(ClassifiedRead::new(ReadKind::Enclosing, 100, *count, 3)).take(*n)
            })
            .collect()
    }

    fn spanning() -> Vec<ClassifiedRead> {
        (0..24)
            .map(|k| ClassifiedRead::new(ReadKind::Spanning, 100, 310 + (k * 13) % 60, 3))
            .collect()
    }

    #[test]
    fn recovers_heterozygous_genotype() {
        let reference = reference();
        let genotyper = Genotyper::new(&options(), &reference).unwrap();
        let mut source = FixedReads::new(enclosing(&[(10, 20), (14, 20)]), 0);
        let mut locus = locus();

        assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert_eq!(locus.gt, Some(Gt::from([10, 14])));
        assert_eq!(locus.state, LocusState::Done);
        assert_eq!(locus.read_counts.get(ReadKind::Enclosing), 40);
        assert_eq!(locus.pre_flank.len(), 100);
        assert_eq!(locus.post_flank.len(), 100);
        assert!(locus.max_ll.unwrap().is_finite());
    }

    /// Reads from a (10, 14) locus at roughly 30x: enclosing, flanking and
    /// spanning evidence from both haplotypes, topped up with off-target reads.
    fn mixed_class_reads() -> (Vec<ClassifiedRead>, usize) {
        let mut reads = enclosing(&[(10, 10), (14, 10)]);
        for count in [2, 4, 6, 8, 9, 11, 12, 13] {
            reads.push(ClassifiedRead::new(ReadKind::Flanking, 100, count, 3));
        }
        for k in 0..12 {
            let offset = (k * 17) % 60;
            reads.push(ClassifiedRead::new(ReadKind::Spanning, 100, 370 + offset, 3));
            reads.push(ClassifiedRead::new(ReadKind::Spanning, 100, 358 + offset, 3));
        }
        // 1209 reads of 100bp over a 4030bp window
        let offtarget_count = 1209 - reads.len();
        (reads, offtarget_count)
    }

    #[test]
    fn recovers_genotype_from_mixed_classes() {
        let reference = reference();
        let genotyper = Genotyper::new(&options(), &reference).unwrap();
        let (reads, offtarget_count) = mixed_class_reads();
        let mut source = FixedReads::new(reads, offtarget_count);
        let mut locus = locus();

        assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert_eq!(locus.gt, Some(Gt::from([10, 14])));
        assert!((locus.coverage - 30.0).abs() < 0.01);
        assert_eq!(locus.read_counts.get(ReadKind::Enclosing), 20);
        assert_eq!(locus.read_counts.get(ReadKind::Flanking), 8);
        assert_eq!(locus.read_counts.get(ReadKind::Spanning), 24);
        assert_eq!(locus.read_counts.get(ReadKind::Frr), 0);
        assert_eq!(locus.offtarget_count, 1157);
    }

    #[test]
    fn disjoint_class_bounds_reject_under_intersection() {
        let reference = reference();
        let options = Options {
            grid_policy: GridPolicy::Intersection,
            ..options()
        };
        let genotyper = Genotyper::new(&options, &reference).unwrap();
        // Enclosing bounds [5, 15], flanking bounds [25, 63]
        let mut reads = enclosing(&[(10, 10)]);
        reads.push(ClassifiedRead::new(ReadKind::Flanking, 100, 30, 3));
        let mut source = FixedReads::new(reads.clone(), 0);
        let mut locus = locus();

        assert_eq!(genotyper.process_locus(&mut source, &mut locus), Ok(false));
        assert_eq!(locus.state, LocusState::Rejected(RejectReason::EmptyGrid));
        assert!(locus.gt.is_none());
        assert!(locus.max_ll.is_none());

        // The same reads genotype under the default union policy
        let genotyper = Genotyper::new(&self::options(), &reference).unwrap();
        let mut source = FixedReads::new(reads, 0);
        assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert!(locus.gt.is_some());
    }

    #[test]
    fn recovers_haploid_genotype() {
        let reference = reference();
        let options = Options {
            ploidy: Ploidy::One,
            ..options()
        };
        let genotyper = Genotyper::new(&options, &reference).unwrap();
        let mut source = FixedReads::new(enclosing(&[(12, 30)]), 0);
        let mut locus = locus();

        assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert_eq!(locus.gt, Some(Gt::from_iter([12])));
    }

    #[test]
    fn processing_is_idempotent() {
        let reference = reference();
        let genotyper = Genotyper::new(&options(), &reference).unwrap();
        let mut reads = enclosing(&[(10, 15), (14, 12)]);
        reads.extend(spanning());
        let mut source = FixedReads::new(reads, 3);
        let mut locus = locus();

        assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
        let first = locus.clone();
        assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert_eq!(locus.gt, first.gt);
        assert_eq!(locus.max_ll, first.max_ll);
        assert_eq!(locus.read_counts, first.read_counts);
        assert_eq!(locus.coverage, first.coverage);
        assert_eq!(locus.offtarget_count, 3);
    }

    #[test]
    fn bootstrap_is_reproducible() {
        let reference = reference();
        let run = |seed: u64| {
            let options = Options {
                num_boot_samp: 20,
                seed,
                ..options()
            };
            let genotyper = Genotyper::new(&options, &reference).unwrap();
            let mut source = FixedReads::new(spanning(), 0);
            let mut locus = locus();
            assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
            locus
        };

        let first = run(42);
        let second = run(42);
        let other = run(43);
        assert_eq!(first.bootstrap.len(), 20);
        assert_eq!(first.bootstrap, second.bootstrap);
        assert_eq!(first.ci, second.ci);
        assert_ne!(first.bootstrap, other.bootstrap);

        let ci = first.ci.unwrap();
        assert_eq!(ci.len(), 2);
        assert!(ci.iter().all(|(lo, hi)| lo <= hi));
    }

    #[test]
    fn empty_read_set_is_rejected() {
        let reference = reference();
        let genotyper = Genotyper::new(&options(), &reference).unwrap();
        let mut locus = locus();

        let mut source = FixedReads::new(Vec::new(), 0);
        assert!(!genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert_eq!(locus.state, LocusState::Rejected(RejectReason::NoReads));
        assert!(locus.gt.is_none());

        // Off-target reads and reads without a length are not evidence
        let mut source = FixedReads::new(
            vec![ClassifiedRead::new(ReadKind::Enclosing, 0, 10, 3)],
            5,
        );
        assert!(!genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert_eq!(locus.state, LocusState::Rejected(RejectReason::NoReads));
        assert!(locus.gt.is_none());
    }

    #[test]
    fn locus_near_contig_start_skips_read_source() {
        let reference = reference();
        let genotyper = Genotyper::new(&options(), &reference).unwrap();
        let mut locus = Locus::new("chr1", 50, 61, "CAG").unwrap();
        assert!(!genotyper.set_flanks(&mut locus));

        let mut source = FixedReads::new(enclosing(&[(4, 10)]), 0);
        assert!(!genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert_eq!(source.fetches, 0);
        assert_eq!(
            locus.state,
            LocusState::Rejected(RejectReason::FlanksUnavailable)
        );
    }

    #[test]
    fn rejected_results_do_not_leak_between_runs() {
        let reference = reference();
        let genotyper = Genotyper::new(&options(), &reference).unwrap();
        let mut locus = locus();

        let mut source = FixedReads::new(enclosing(&[(10, 20)]), 0);
        assert!(genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert!(locus.gt.is_some());

        let mut source = FixedReads::new(Vec::new(), 0);
        assert!(!genotyper.process_locus(&mut source, &mut locus).unwrap());
        assert!(locus.gt.is_none());
        assert!(locus.reads.is_empty());
    }
}
