pub mod classes;
pub mod genotype;
pub mod locus;
pub mod model;
pub mod options;
pub mod reads;
pub mod reference;
pub mod writers;
