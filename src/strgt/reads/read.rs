//! Reads as seen by the likelihood engine: already classified, reduced to the
//! one datum each evidence class is informative through.

use crate::strgt::locus::Locus;
use crate::utils::Result;
use std::{fmt, str::FromStr};

/// Geometric relationship between a read (or its fragment) and the repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReadKind {
    /// Read made entirely of repeat units, mate anchored outside the repeat
    Frr,
    /// Read covering the whole repeat plus flank on both sides
    Enclosing,
    /// Pair with mates on opposite sides of the repeat
    Spanning,
    /// Read covering one flank and part of the repeat
    Flanking,
}

impl ReadKind {
    pub const ALL: [ReadKind; 4] = [
        ReadKind::Frr,
        ReadKind::Enclosing,
        ReadKind::Spanning,
        ReadKind::Flanking,
    ];

    pub fn index(&self) -> usize {
        match self {
            ReadKind::Frr => 0,
            ReadKind::Enclosing => 1,
            ReadKind::Spanning => 2,
            ReadKind::Flanking => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReadKind::Frr => "FRR",
            ReadKind::Enclosing => "ENCLOSING",
            ReadKind::Spanning => "SPANNING",
            ReadKind::Flanking => "FLANKING",
        }
    }
}

impl FromStr for ReadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FRR" => Ok(ReadKind::Frr),
            "ENCLOSING" => Ok(ReadKind::Enclosing),
            "SPANNING" => Ok(ReadKind::Spanning),
            "FLANKING" => Ok(ReadKind::Flanking),
            _ => Err(format!("Unknown read class: '{}'", s)),
        }
    }
}

impl fmt::Display for ReadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedRead {
    pub kind: ReadKind,
    /// Read length in bases
    pub read_len: i32,
    /// Repeat-unit count (enclosing, flanking), insert size (spanning) or
    /// anchored-mate distance to the repeat (FRR)
    pub data: i32,
    pub motif_len: i32,
}

impl ClassifiedRead {
    pub fn new(kind: ReadKind, read_len: i32, data: i32, motif_len: i32) -> Self {
        ClassifiedRead {
            kind,
            read_len,
            data,
            motif_len,
        }
    }
}

/// Everything the alignment layer reports for one locus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocusReads {
    pub reads: Vec<ClassifiedRead>,
    /// Reads near the locus that could not be assigned to any class
    pub offtarget_count: usize,
}

impl LocusReads {
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

/// Source of classified reads, implemented by the alignment layer.
pub trait ReadSource {
    fn fetch_locus_reads(&mut self, locus: &Locus) -> Result<LocusReads>;

    /// Insert sizes of well-behaved pairs, used to estimate the fragment
    /// length distribution when it was not set explicitly.
    fn sample_insert_sizes(&mut self) -> Result<Vec<i32>> {
        Ok(Vec::new())
    }
}
