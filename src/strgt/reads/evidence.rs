//! Tab-separated table of pre-classified reads.
//!
//! Each non-comment line holds `chrom start class data read_len`, where
//! `chrom`/`start` identify the locus (1-based start as in the region file)
//! and `class` is one of FRR, ENCLOSING, SPANNING, FLANKING, OFFTARGET or
//! INSERT. INSERT rows carry an insert size from a concordant pair in `data`
//! and are not tied to any locus.

use super::{ClassifiedRead, LocusReads, ReadKind, ReadSource};
use crate::strgt::locus::Locus;
use crate::utils::{open_catalog_reader, Result};
use std::{collections::HashMap, io::BufRead, path::Path};

#[derive(Debug, Default)]
pub struct EvidenceTable {
    by_locus: HashMap<(String, u32), LocusReads>,
    insert_sizes: Vec<i32>,
}

enum Row {
    Read(String, u32, ReadKind, i32, i32),
    Offtarget(String, u32),
    Insert(i32),
}

impl EvidenceTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_catalog_reader(path)?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = EvidenceTable::default();
        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error at evidence line {}: {}", line_number + 1, e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let row = parse_row(trimmed)
                .map_err(|e| format!("Error at evidence line {}: {}", line_number + 1, e))?;
            match row {
                Row::Read(chrom, start, kind, data, read_len) => {
                    table
                        .by_locus
                        .entry((chrom, start))
                        .or_default()
                        .reads
                        .push(ClassifiedRead::new(kind, read_len, data, 0));
                }
                Row::Offtarget(chrom, start) => {
                    table.by_locus.entry((chrom, start)).or_default().offtarget_count += 1;
                }
                Row::Insert(size) => table.insert_sizes.push(size),
            }
        }
        log::debug!(
            "Loaded evidence for {} loci and {} insert size samples",
            table.by_locus.len(),
            table.insert_sizes.len()
        );
        Ok(table)
    }

    pub fn num_loci(&self) -> usize {
        self.by_locus.len()
    }
}

fn parse_row(line: &str) -> Result<Row> {
    const EXPECTED_FIELD_COUNT: usize = 5;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != EXPECTED_FIELD_COUNT {
        return Err(format!(
            "Expected {} fields in the format 'chrom start class data read_len', found {}",
            EXPECTED_FIELD_COUNT,
            fields.len()
        ));
    }
    let parse_int = |name: &str, value: &str| {
        value
            .parse::<i32>()
            .map_err(|_| format!("Invalid {}: '{}'", name, value))
    };

    let class = fields[2].to_ascii_uppercase();
    if class == "INSERT" {
        return Ok(Row::Insert(parse_int("insert size", fields[3])?));
    }

    let chrom = fields[0].to_string();
    let start = fields[1]
        .parse::<u32>()
        .map_err(|_| format!("Invalid locus start: '{}'", fields[1]))?;
    if class == "OFFTARGET" {
        return Ok(Row::Offtarget(chrom, start));
    }

    let kind = class.parse::<ReadKind>()?;
    let data = parse_int("data", fields[3])?;
    let read_len = parse_int("read length", fields[4])?;
    Ok(Row::Read(chrom, start, kind, data, read_len))
}

impl ReadSource for EvidenceTable {
    fn fetch_locus_reads(&mut self, locus: &Locus) -> Result<LocusReads> {
        let key = (locus.region.contig.clone(), locus.region.start);
        let mut locus_reads = self.by_locus.get(&key).cloned().unwrap_or_default();
        for read in locus_reads.reads.iter_mut() {
            read.motif_len = locus.period;
        }
        Ok(locus_reads)
    }

    fn sample_insert_sizes(&mut self) -> Result<Vec<i32>> {
        Ok(self.insert_sizes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "\
# chrom start class data read_len
chr1\t201\tENCLOSING\t10\t100
chr1\t201\tenclosing\t12\t100
chr1\t201\tSPANNING\t380\t100
chr1\t201\tOFFTARGET\t0\t100

chr2\t50\tFRR\t120\t100
*\t*\tINSERT\t410\t100
*\t*\tINSERT\t390\t100
";

    #[test]
    fn loads_reads_by_locus() {
        let mut table = EvidenceTable::from_reader(Cursor::new(TABLE)).unwrap();
        assert_eq!(table.num_loci(), 2);

        let locus = Locus::new("chr1", 201, 230, "CAG").unwrap();
        let reads = table.fetch_locus_reads(&locus).unwrap();
        assert_eq!(reads.reads.len(), 3);
        assert_eq!(reads.offtarget_count, 1);
        assert_eq!(
            reads.reads[1],
            ClassifiedRead::new(ReadKind::Enclosing, 100, 12, 3)
        );
        assert_eq!(reads.reads[2].kind, ReadKind::Spanning);

        assert_eq!(table.sample_insert_sizes().unwrap(), vec![410, 390]);
    }

    #[test]
    fn unknown_locus_has_no_reads() {
        let mut table = EvidenceTable::from_reader(Cursor::new(TABLE)).unwrap();
        let locus = Locus::new("chr3", 1000, 1011, "AT").unwrap();
        let reads = table.fetch_locus_reads(&locus).unwrap();
        assert!(reads.is_empty());
        assert_eq!(reads.offtarget_count, 0);
    }

    #[test]
    fn malformed_rows_err() {
        let short = EvidenceTable::from_reader(Cursor::new("chr1\t201\tFRR\t10\n"));
        assert_eq!(
            short.err().unwrap(),
            "Error at evidence line 1: Expected 5 fields in the format 'chrom start class data read_len', found 4"
        );

        let bad_class = EvidenceTable::from_reader(Cursor::new("chr1\t201\tSOFTCLIP\t10\t100\n"));
        assert!(bad_class.is_err());

        let bad_data = EvidenceTable::from_reader(Cursor::new("chr1\t201\tFRR\tten\t100\n"));
        assert_eq!(
            bad_data.err().unwrap(),
            "Error at evidence line 1: Invalid data: 'ten'"
        );
    }
}
