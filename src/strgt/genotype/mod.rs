mod bootstrap;
mod genotyper;
mod grid;
mod gt;

pub use genotyper::Genotyper;
pub use grid::{GridPolicy, GridSearch, LocusEvidence, TieBreak};
pub use gt::{ClassCounts, Gt};
