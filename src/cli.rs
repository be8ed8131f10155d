use crate::strgt::genotype::{GridPolicy, TieBreak};
use crate::utils::{Ploidy, Result};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="strgt",
          version=&**FULL_VERSION,
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Short Tandem Repeat Genotyper")]
    Genotype(GenotypeArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("genotype")))]
#[command(arg_required_else_help(true))]
pub struct GenotypeArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "ref")]
    #[clap(help = "Path to indexed reference genome FASTA")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub genome_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reads")]
    #[clap(help = "Table of classified reads (chrom, start, class, data, read_len)")]
    #[clap(value_name = "READS")]
    #[arg(value_parser = check_file_exists)]
    pub reads_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'b')]
    #[clap(long = "regions")]
    #[clap(help = "Repeat regions (chrom, start, end, period, motif)")]
    #[clap(value_name = "REGIONS")]
    #[arg(value_parser = check_file_exists)]
    pub regions_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "out")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(long = "ploidy")]
    #[clap(value_name = "PLOIDY")]
    #[clap(help = "Indicate whether data is haploid (1) or diploid (2)")]
    #[clap(default_value = "2")]
    pub ploidy: Ploidy,

    #[clap(long = "numbstrap")]
    #[clap(value_name = "N")]
    #[clap(help = "Number of bootstrap resamples")]
    #[clap(default_value = "0")]
    pub num_boot_samp: usize,

    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Random number generator initial seed")]
    #[clap(default_value = "0")]
    pub seed: u64,

    #[clap(long = "output-bootstraps")]
    #[clap(help = "Output file with bootstrap samples")]
    pub output_bootstrap: bool,

    #[clap(long = "output-readinfo")]
    #[clap(help = "Output read class info")]
    pub output_readinfo: bool,

    #[clap(help_heading("Model"))]
    #[clap(long = "frrweight")]
    #[clap(value_name = "WEIGHT")]
    #[clap(help = "Weight of FRR reads in the likelihood model")]
    #[clap(default_value = "0.3")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub frr_weight: f64,

    #[clap(help_heading("Model"))]
    #[clap(long = "enclweight")]
    #[clap(value_name = "WEIGHT")]
    #[clap(help = "Weight of enclosing reads in the likelihood model")]
    #[clap(default_value = "0.3")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub enclosing_weight: f64,

    #[clap(help_heading("Model"))]
    #[clap(long = "spanweight")]
    #[clap(value_name = "WEIGHT")]
    #[clap(help = "Weight of spanning reads in the likelihood model")]
    #[clap(default_value = "1.0")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub spanning_weight: f64,

    #[clap(help_heading("Model"))]
    #[clap(long = "flankweight")]
    #[clap(value_name = "WEIGHT")]
    #[clap(help = "Weight of flanking reads in the likelihood model")]
    #[clap(default_value = "0.5")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub flanking_weight: f64,

    #[clap(help_heading("Model"))]
    #[clap(long = "insertmean")]
    #[clap(value_name = "MEAN")]
    #[clap(help = "Insert size mean; estimated from the reads table if not given")]
    #[clap(requires = "insert_sdev")]
    #[arg(value_parser = ensure_positive_float)]
    pub insert_mean: Option<f64>,

    #[clap(help_heading("Model"))]
    #[clap(long = "insertsdev")]
    #[clap(value_name = "SDEV")]
    #[clap(help = "Insert size standard deviation")]
    #[clap(requires = "insert_mean")]
    #[arg(value_parser = ensure_positive_float)]
    pub insert_sdev: Option<f64>,

    #[clap(help_heading("Model"))]
    #[clap(long = "stutterup")]
    #[clap(value_name = "RATE")]
    #[clap(help = "Stutter expansion rate")]
    #[clap(default_value = "0.0364653")]
    #[arg(value_parser = ensure_unit_float)]
    pub stutter_up: f64,

    #[clap(help_heading("Model"))]
    #[clap(long = "stutterdown")]
    #[clap(value_name = "RATE")]
    #[clap(help = "Stutter contraction rate")]
    #[clap(default_value = "0.0428387")]
    #[arg(value_parser = ensure_unit_float)]
    pub stutter_down: f64,

    #[clap(help_heading("Model"))]
    #[clap(long = "stutterprob")]
    #[clap(value_name = "PROB")]
    #[clap(help = "Probability of observing the true repeat count")]
    #[clap(default_value = "0.818913")]
    #[arg(value_parser = ensure_unit_float)]
    pub stutter_p: f64,

    #[clap(help_heading("Model"))]
    #[clap(long = "stuttermax")]
    #[clap(value_name = "UNITS")]
    #[clap(help = "Largest stutter slippage in repeat units")]
    #[clap(default_value = "5")]
    #[arg(value_parser = clap::value_parser!(i32).range(0..))]
    pub stutter_max: i32,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "flanklen")]
    #[clap(value_name = "FLANK_LEN")]
    #[clap(help = "Window around each locus the reads were collected from")]
    #[clap(default_value = "3000")]
    pub flanklen: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "realignment-flanklen")]
    #[clap(value_name = "FLANK_LEN")]
    #[clap(help = "Length of reference flanks extracted around each locus")]
    #[clap(default_value = "100")]
    pub realignment_flanklen: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "regionsize")]
    #[clap(value_name = "SIZE")]
    #[clap(help = "Bases on either side of a locus used to estimate coverage")]
    #[clap(default_value = "2000")]
    pub regionsize: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "grid-policy")]
    #[clap(value_name = "POLICY")]
    #[clap(help = "Combine per-class allele ranges by union or intersection")]
    #[clap(default_value = "union")]
    pub grid_policy: GridPolicy,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "tie-break")]
    #[clap(value_name = "RULE")]
    #[clap(help = "Genotype reported among equally likely ones (closest or smallest)")]
    #[clap(default_value = "closest")]
    pub tie_break: TieBreak,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn parse_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("The value must be finite, got: {}", value))
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = parse_float(s)?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

fn ensure_non_negative_float(s: &str) -> Result<f64> {
    let value = parse_float(s)?;
    if value < 0.0 {
        Err(format!("The value must be non-negative, got: {}", value))
    } else {
        Ok(value)
    }
}

fn ensure_positive_float(s: &str) -> Result<f64> {
    let value = parse_float(s)?;
    if value <= 0.0 {
        Err(format!("The value must be positive, got: {}", value))
    } else {
        Ok(value)
    }
}
