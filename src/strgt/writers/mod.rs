mod write_bootstrap;
mod write_readinfo;
mod write_tsv;

pub use write_bootstrap::BootstrapWriter;
pub use write_readinfo::ReadInfoWriter;
pub use write_tsv::TsvWriter;

use crate::utils::Result;
use std::{
    env,
    fs::File,
    io::{BufWriter, Write},
};

fn create_file(output_path: &str) -> Result<BufWriter<File>> {
    let file = File::create(output_path).map_err(|e| e.to_string())?;
    Ok(BufWriter::new(file))
}

/// Writes the `##` provenance lines shared by all tables.
fn write_preamble<W: Write>(writer: &mut W) -> Result<()> {
    let args: Vec<String> = env::args().collect();
    writeln!(
        writer,
        "##{}Version={}",
        env!("CARGO_PKG_NAME"),
        *crate::cli::FULL_VERSION
    )
    .and_then(|_| writeln!(writer, "##{}Command={}", env!("CARGO_PKG_NAME"), args.join(" ")))
    .map_err(|e| format!("Failed to write header: {}", e))
}

fn write_error(e: std::io::Error) -> String {
    format!("Failed to write record: {}", e)
}
