//! Genotype table with one row per genotyped locus.

use super::{create_file, write_error, write_preamble};
use crate::strgt::{locus::Locus, reads::ReadKind};
use crate::utils::Result;
use itertools::Itertools;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

const COLUMNS: [&str; 14] = [
    "chrom",
    "start",
    "end",
    "motif",
    "ref_count",
    "genotype",
    "ci",
    "max_ll",
    "coverage",
    "frr",
    "enclosing",
    "spanning",
    "flanking",
    "offtarget",
];

pub struct TsvWriter<W: Write> {
    writer: W,
}

impl TsvWriter<BufWriter<File>> {
    pub fn new(output_path: &str) -> Result<Self> {
        Self::from_writer(create_file(output_path)?)
    }
}

impl<W: Write> TsvWriter<W> {
    pub fn from_writer(mut writer: W) -> Result<Self> {
        write_preamble(&mut writer)?;
        writeln!(writer, "#{}", COLUMNS.join("\t")).map_err(write_error)?;
        Ok(TsvWriter { writer })
    }

    /// Writes the locus if it was genotyped; rejected loci are skipped.
    pub fn write(&mut self, locus: &Locus) -> Result<()> {
        let gt = match &locus.gt {
            Some(gt) => gt,
            None => return Ok(()),
        };
        let ci = match &locus.ci {
            Some(ci) => ci.iter().map(|(lo, hi)| format!("{}-{}", lo, hi)).join(","),
            None => ".".to_string(),
        };
        let max_ll = locus
            .max_ll
            .map_or(".".to_string(), |ll| format!("{:.4}", ll));
        let counts = ReadKind::ALL
            .iter()
            .map(|kind| locus.read_counts.get(*kind))
            .join("\t");

        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{}\t{}",
            locus.region.contig,
            locus.region.start,
            locus.region.end,
            locus.motif,
            locus.ref_count(),
            gt.iter().join(","),
            ci,
            max_ll,
            locus.coverage,
            counts,
            locus.offtarget_count
        )
        .map_err(write_error)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(write_error)
    }
}
