use super::{create_file, write_error, write_preamble};
use crate::strgt::locus::Locus;
use crate::utils::Result;
use itertools::Itertools;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// Bootstrap genotypes per locus, samples separated by `;`.
pub struct BootstrapWriter<W: Write> {
    writer: W,
}

impl BootstrapWriter<BufWriter<File>> {
    pub fn new(output_path: &str) -> Result<Self> {
        Self::from_writer(create_file(output_path)?)
    }
}

impl<W: Write> BootstrapWriter<W> {
    pub fn from_writer(mut writer: W) -> Result<Self> {
        write_preamble(&mut writer)?;
        writeln!(writer, "#chrom\tstart\tend\tmotif\tsamples").map_err(write_error)?;
        Ok(BootstrapWriter { writer })
    }

    pub fn write(&mut self, locus: &Locus) -> Result<()> {
        if locus.gt.is_none() || locus.bootstrap.is_empty() {
            return Ok(());
        }
        let samples = locus
            .bootstrap
            .iter()
            .map(|gt| gt.iter().join(","))
            .join(";");
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}",
            locus.region.contig, locus.region.start, locus.region.end, locus.motif, samples
        )
        .map_err(write_error)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(write_error)
    }
}
