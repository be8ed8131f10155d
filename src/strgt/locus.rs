use crate::strgt::genotype::{ClassCounts, Gt};
use crate::strgt::reads::ClassifiedRead;
use crate::utils::{open_catalog_reader, GenomicRegion, Result};
use arrayvec::ArrayVec;
use crossbeam_channel::Sender;
use std::{fmt, io::BufRead, path::Path};

/// Why a locus was not genotyped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    FlanksUnavailable,
    NoReads,
    EmptyGrid,
    NoLikelihood,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectReason::FlanksUnavailable => "flanks could not be extracted",
            RejectReason::NoReads => "no informative reads",
            RejectReason::EmptyGrid => "empty allele search grid",
            RejectReason::NoLikelihood => "no genotype with a finite likelihood",
        };
        f.write_str(msg)
    }
}

/// Processing stage of a locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocusState {
    Idle,
    FlanksSet,
    Classified,
    GridSearched,
    Done,
    Rejected(RejectReason),
}

impl LocusState {
    fn allows(&self, next: &LocusState) -> bool {
        use LocusState::*;
        matches!(
            (self, next),
            (Idle, FlanksSet)
                | (Idle, Rejected(RejectReason::FlanksUnavailable))
                | (FlanksSet, Classified)
                | (FlanksSet, Rejected(RejectReason::NoReads))
                | (Classified, GridSearched)
                | (Classified, Rejected(RejectReason::EmptyGrid))
                | (Classified, Rejected(RejectReason::NoLikelihood))
                | (GridSearched, Done)
        )
    }
}

/// A reference STR locus together with the genotype estimated for it.
#[derive(Debug, Clone)]
pub struct Locus {
    /// Repeat coordinates, 1-based and fully closed
    pub region: GenomicRegion,
    pub motif: String,
    pub period: i32,
    pub pre_flank: String,
    pub post_flank: String,
    pub state: LocusState,
    /// Maximum-likelihood alleles in repeat units, sorted ascending
    pub gt: Option<Gt>,
    pub max_ll: Option<f64>,
    /// 95% bootstrap interval per allele
    pub ci: Option<ArrayVec<(i32, i32), 2>>,
    pub bootstrap: Vec<Gt>,
    pub read_counts: ClassCounts,
    /// Reads the genotype was estimated from
    pub reads: Vec<ClassifiedRead>,
    pub coverage: f64,
    pub offtarget_count: usize,
}

impl Locus {
    pub fn new(chrom: &str, start: u32, end: u32, motif: &str) -> Result<Self> {
        if motif.is_empty() {
            return Err(format!("Empty motif for locus {}:{}", chrom, start));
        }
        let region = GenomicRegion::new(chrom, start, end)?;
        Ok(Locus {
            region,
            motif: motif.to_uppercase(),
            period: motif.len() as i32,
            pre_flank: String::new(),
            post_flank: String::new(),
            state: LocusState::Idle,
            gt: None,
            max_ll: None,
            ci: None,
            bootstrap: Vec::new(),
            read_counts: ClassCounts::default(),
            reads: Vec::new(),
            coverage: 0.0,
            offtarget_count: 0,
        })
    }

    /// Parses a region line in the format `chrom start end period motif`.
    pub fn from_region_line(line: &str) -> Result<Self> {
        const EXPECTED_FIELD_COUNT: usize = 5;
        let split_line: Vec<&str> = line.split_whitespace().collect();
        if split_line.len() != EXPECTED_FIELD_COUNT {
            return Err(format!(
                "Expected {} fields in the format 'chrom start end period motif', found {}: {}",
                EXPECTED_FIELD_COUNT,
                split_line.len(),
                line
            ));
        }

        let (chrom, start, end, period, motif) = match &split_line[..] {
            [chrom, start, end, period, motif] => (*chrom, *start, *end, *period, *motif),
            _ => unreachable!(),
        };

        let parse_coord = |name: &str, value: &str| {
            value
                .parse::<u32>()
                .map_err(|_| format!("Invalid {}: '{}'", name, value))
        };
        let start = parse_coord("start", start)?;
        let end = parse_coord("end", end)?;
        let period: usize = period
            .parse()
            .map_err(|_| format!("Invalid period: '{}'", period))?;
        if period != motif.len() {
            return Err(format!(
                "Period {} does not match length of motif '{}'",
                period, motif
            ));
        }

        Locus::new(chrom, start, end, motif)
    }

    /// Number of motif copies in the reference.
    pub fn ref_count(&self) -> i32 {
        self.region.length() as i32 / self.period
    }

    /// Returns the locus to its freshly-parsed state.
    pub fn reset(&mut self) {
        self.pre_flank.clear();
        self.post_flank.clear();
        self.state = LocusState::Idle;
        self.gt = None;
        self.max_ll = None;
        self.ci = None;
        self.bootstrap.clear();
        self.read_counts = ClassCounts::default();
        self.reads.clear();
        self.coverage = 0.0;
        self.offtarget_count = 0;
    }

    pub fn transition(&mut self, next: LocusState) -> Result<()> {
        if !self.state.allows(&next) {
            return Err(format!(
                "{}: invalid state transition {:?} -> {:?}",
                self.region, self.state, next
            ));
        }
        self.state = next;
        Ok(())
    }
}

/// Sends every parsed region line, or its parse error, through `sender`.
/// Stops early once the receiving side has hung up.
pub fn stream_loci_into_channel(regions_path: &Path, sender: Sender<Result<Locus>>) -> Result<()> {
    for locus in get_loci(regions_path)? {
        if sender.send(locus).is_err() {
            log::debug!("Locus receiver closed, stopping region stream");
            break;
        }
    }
    Ok(())
}

pub fn get_loci(path: &Path) -> Result<impl Iterator<Item = Result<Locus>>> {
    let reader = open_catalog_reader(path)?;
    Ok(parse_loci(reader))
}

pub fn parse_loci<R: BufRead>(reader: R) -> impl Iterator<Item = Result<Locus>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(line_number, result_line)| {
            let line = match result_line {
                Ok(line) => line,
                Err(e) => return Some(Err(format!("Error at region line {}: {}", line_number + 1, e))),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            Some(
                Locus::from_region_line(trimmed)
                    .map_err(|e| format!("Error at region line {}: {}", line_number + 1, e)),
            )
        })
}
