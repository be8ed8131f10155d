mod io_utils;
pub mod math;
mod ploidy;
mod readers;
mod region;
mod util;

pub use io_utils::create_writer;
pub use math::{fast_log_sum_exp, median, percentile, LOG_THRESH};
pub use ploidy::Ploidy;
pub use readers::{open_catalog_reader, open_genome_reader};
pub use region::GenomicRegion;
pub use util::{handle_error_and_exit, Result};
