//! Reference sequence access for flank extraction.

use crate::utils::{open_genome_reader, GenomicRegion, Result};
use rust_htslib::faidx;
use std::{collections::HashMap, path::Path};

pub trait ReferenceSource {
    fn contig_len(&self, contig: &str) -> Option<u64>;

    /// Fetches the uppercased sequence of `contig` over the 0-based, fully
    /// closed interval `[start, end]`.
    fn fetch_seq(&self, contig: &str, start: usize, end: usize) -> Result<String>;
}

pub struct FastaReference {
    reader: faidx::Reader,
    chrom_lookup: HashMap<String, u64>,
}

impl FastaReference {
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_genome_reader(path)?;
        let chrom_lookup = create_chrom_lookup(&reader)?;
        Ok(FastaReference {
            reader,
            chrom_lookup,
        })
    }
}

impl ReferenceSource for FastaReference {
    fn contig_len(&self, contig: &str) -> Option<u64> {
        self.chrom_lookup.get(contig).copied()
    }

    fn fetch_seq(&self, contig: &str, start: usize, end: usize) -> Result<String> {
        self.reader
            .fetch_seq_string(contig, start, end)
            .map_err(|e| {
                format!(
                    "Error fetching sequence for region {}:{}-{}: {}",
                    contig, start, end, e
                )
            })
            .map(|seq| seq.to_uppercase())
    }
}

pub fn create_chrom_lookup(reader: &faidx::Reader) -> Result<HashMap<String, u64>> {
    let num_seqs = reader.n_seqs() as usize;
    let mut map = HashMap::with_capacity(num_seqs);
    for i in 0..num_seqs {
        let name = reader.seq_name(i as i32).map_err(|e| e.to_string())?;
        let len = reader.fetch_seq_len(&name);
        let len = u64::try_from(len)
            .map_err(|_| format!("Sequence length for '{}' cannot be converted to u64", &name))?;
        map.insert(name, len);
    }
    Ok(map)
}

/// Contigs held in memory; used for small references and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReference {
    contigs: HashMap<String, String>,
}

impl InMemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contig(mut self, name: &str, seq: &str) -> Self {
        self.contigs.insert(name.to_string(), seq.to_uppercase());
        self
    }
}

impl ReferenceSource for InMemoryReference {
    fn contig_len(&self, contig: &str) -> Option<u64> {
        self.contigs.get(contig).map(|seq| seq.len() as u64)
    }

    fn fetch_seq(&self, contig: &str, start: usize, end: usize) -> Result<String> {
        let seq = self
            .contigs
            .get(contig)
            .ok_or_else(|| format!("Unknown contig '{}'", contig))?;
        seq.get(start..=end)
            .map(|s| s.to_string())
            .ok_or_else(|| format!("Interval {}:{}-{} out of bounds", contig, start, end))
    }
}

/// Extracts `flank_len` bases on either side of the repeat.
pub fn get_flanks(
    reference: &dyn ReferenceSource,
    region: &GenomicRegion,
    flank_len: usize,
) -> Result<(String, String)> {
    check_region_bounds(reference, region, flank_len)?;
    if flank_len == 0 {
        return Ok((String::new(), String::new()));
    }

    // 0-based repeat interval is [start - 1, end - 1]
    let repeat_start = region.start as usize - 1;
    let repeat_end = region.end as usize - 1;
    let pre_flank = reference.fetch_seq(
        &region.contig,
        repeat_start - flank_len,
        repeat_start - 1,
    )?;
    let post_flank = reference.fetch_seq(
        &region.contig,
        repeat_end + 1,
        repeat_end + flank_len,
    )?;
    Ok((pre_flank, post_flank))
}

fn check_region_bounds(
    reference: &dyn ReferenceSource,
    region: &GenomicRegion,
    flank_len: usize,
) -> Result<()> {
    let chrom_length = reference.contig_len(&region.contig).ok_or_else(|| {
        format!(
            "FASTA reference does not contain chromosome '{}'",
            &region.contig
        )
    })?;

    if (region.start as usize) < flank_len + 1 {
        return Err(format!(
            "Region start '{}' with flank length '{}' underflows for chromosome '{}'",
            region.start, flank_len, &region.contig
        ));
    }

    let adjusted_end = region.end as u64 + flank_len as u64;
    if adjusted_end > chrom_length {
        return Err(format!(
            "Region end '{}' with flank length '{}' exceeds chromosome '{}' bounds (1..{})",
            region.end, flank_len, &region.contig, chrom_length
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> InMemoryReference {
        // 10 bases of flank, CAG x 4, 10 bases of flank
        InMemoryReference::new().with_contig("chr1", "acgtacgtacCAGCAGCAGCAGttggccaatt")
    }

    #[test]
    fn extracts_flanks() {
        let region = GenomicRegion::new("chr1", 11, 22).unwrap();
        let (pre, post) = get_flanks(&reference(), &region, 4).unwrap();
        assert_eq!(pre, "GTAC");
        assert_eq!(post, "TTGG");

        let (pre, post) = get_flanks(&reference(), &region, 10).unwrap();
        assert_eq!(pre, "ACGTACGTAC");
        assert_eq!(post, "TTGGCCAATT");
    }

    #[test]
    fn flanks_past_contig_start_err() {
        let region = GenomicRegion::new("chr1", 11, 22).unwrap();
        let err = get_flanks(&reference(), &region, 11).err().unwrap();
        assert!(err.contains("underflows"));
    }

    #[test]
    fn flanks_past_contig_end_err() {
        let region = GenomicRegion::new("chr1", 15, 25).unwrap();
        let err = get_flanks(&reference(), &region, 8).err().unwrap();
        assert!(err.contains("exceeds"));
    }

    #[test]
    fn unknown_contig_err() {
        let region = GenomicRegion::new("chr2", 11, 22).unwrap();
        assert!(get_flanks(&reference(), &region, 4).is_err());
    }
}
