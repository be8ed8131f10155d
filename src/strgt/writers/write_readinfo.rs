use super::{create_file, write_error, write_preamble};
use crate::strgt::locus::Locus;
use crate::utils::Result;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// One row per classified read used at a locus.
pub struct ReadInfoWriter<W: Write> {
    writer: W,
}

impl ReadInfoWriter<BufWriter<File>> {
    pub fn new(output_path: &str) -> Result<Self> {
        Self::from_writer(create_file(output_path)?)
    }
}

impl<W: Write> ReadInfoWriter<W> {
    pub fn from_writer(mut writer: W) -> Result<Self> {
        write_preamble(&mut writer)?;
        writeln!(writer, "#chrom\tstart\tend\tclass\tdata\tread_len").map_err(write_error)?;
        Ok(ReadInfoWriter { writer })
    }

    pub fn write(&mut self, locus: &Locus) -> Result<()> {
        for read in &locus.reads {
            writeln!(
                self.writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                locus.region.contig,
                locus.region.start,
                locus.region.end,
                read.kind,
                read.data,
                read.read_len
            )
            .map_err(write_error)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(write_error)
    }
}
