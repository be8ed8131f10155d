mod evidence;
mod read;

pub use evidence::EvidenceTable;
pub use read::{ClassifiedRead, LocusReads, ReadKind, ReadSource};
