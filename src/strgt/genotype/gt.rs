use crate::strgt::reads::ReadKind;
use arrayvec::ArrayVec;

/// Allele copy numbers, sorted ascending; one entry per haplotype.
pub type Gt = ArrayVec<i32, 2>;

/// Number of reads seen per evidence class.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClassCounts {
    counts: [usize; 4],
}

impl ClassCounts {
    pub fn get(&self, kind: ReadKind) -> usize {
        self.counts[kind.index()]
    }

    pub fn add(&mut self, kind: ReadKind) {
        self.counts[kind.index()] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_kind() {
        let mut counts = ClassCounts::default();
        counts.add(ReadKind::Frr);
        counts.add(ReadKind::Frr);
        counts.add(ReadKind::Spanning);
        assert_eq!(counts.get(ReadKind::Frr), 2);
        assert_eq!(counts.get(ReadKind::Spanning), 1);
        assert_eq!(counts.get(ReadKind::Enclosing), 0);
    }
}
