use crate::cli::GenotypeArgs;
use crate::strgt::{
    genotype::Genotyper,
    locus::{stream_loci_into_channel, Locus},
    options::Options,
    reads::{EvidenceTable, ReadSource},
    reference::FastaReference,
    writers::{BootstrapWriter, ReadInfoWriter, TsvWriter},
};
use crate::utils::{create_writer, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use itertools::Itertools;
use rayon::ThreadPoolBuilder;
use std::thread;

const CHANNEL_BUFFER_SIZE: usize = 2048;

pub fn strgt(args: GenotypeArgs) -> Result<()> {
    let mut options = build_options(&args);
    let mut source = EvidenceTable::from_path(&args.reads_path)?;
    log::debug!("Loaded reads for {} loci", source.num_loci());
    if !options.dist_man_set {
        let samples = source.sample_insert_sizes()?;
        options.estimate_insert_size(&samples);
    }
    options.validate()?;

    let reference = FastaReference::from_path(&args.genome_path)?;
    let genotyper = Genotyper::new(&options, &reference)?;

    let tsv_writer = create_writer(&args.output_prefix, "tsv", TsvWriter::new)?;
    let bootstrap_writer = if options.output_bootstrap {
        Some(create_writer(
            &args.output_prefix,
            "bootstrap.tsv",
            BootstrapWriter::new,
        )?)
    } else {
        None
    };
    let readinfo_writer = if options.output_readinfo {
        Some(create_writer(
            &args.output_prefix,
            "readinfo.tsv",
            ReadInfoWriter::new,
        )?)
    } else {
        None
    };

    log::debug!(
        "Initializing thread pool with {} threads...",
        args.num_threads
    );
    initialize_thread_pool(args.num_threads)?;

    let (sender_locus, receiver_locus) = bounded(CHANNEL_BUFFER_SIZE);
    let regions_path = args.regions_path.clone();
    let locus_stream_thread =
        thread::spawn(move || stream_loci_into_channel(&regions_path, sender_locus));

    let (sender_result, receiver_result) = bounded(CHANNEL_BUFFER_SIZE);
    let writer_thread = thread::spawn(move || {
        write_results(receiver_result, tsv_writer, bootstrap_writer, readinfo_writer)
    });

    let processing_result = genotype_loci(&genotyper, &mut source, &receiver_locus, &sender_result);

    // Clean-up
    drop(receiver_locus);
    drop(sender_result);
    writer_thread
        .join()
        .map_err(|_| "Writer thread panicked".to_string())??;
    log::trace!("Writer thread finished");
    match locus_stream_thread.join() {
        Ok(Ok(_)) => log::trace!("Locus stream thread finished"),
        Ok(Err(e)) => return Err(format!("Locus streaming failed: {}", e)),
        Err(_) => return Err("Locus stream thread panicked".to_string()),
    }
    let (num_processed, num_genotyped) = processing_result?;

    log::info!(
        "Genotyped {} of {} loci",
        num_genotyped,
        num_processed
    );
    Ok(())
}

/// Genotypes every streamed locus and forwards it to the writer. A malformed
/// region line aborts the run. Returns the processed and genotyped counts.
fn genotype_loci(
    genotyper: &Genotyper,
    source: &mut dyn ReadSource,
    loci: &Receiver<Result<Locus>>,
    results: &Sender<Locus>,
) -> Result<(usize, usize)> {
    let mut num_processed = 0;
    let mut num_genotyped = 0;
    for locus_result in loci {
        let mut locus = locus_result.map_err(|err| format!("Malformed region file: {}", err))?;
        num_processed += 1;
        match genotyper.process_locus(source, &mut locus) {
            Ok(true) => {
                num_genotyped += 1;
                if let Some(gt) = &locus.gt {
                    log::info!("{}: genotype {}", locus.region, gt.iter().join(","));
                }
            }
            Ok(false) => {}
            Err(err) => return Err(format!("Error analyzing locus {}: {}", locus.region, err)),
        }
        if let Err(e) = results.send(locus) {
            log::error!("Failed to send locus result to writer thread: {}", e);
        }
    }
    Ok((num_processed, num_genotyped))
}

fn build_options(args: &GenotypeArgs) -> Options {
    let (dist_mean, dist_sdev, dist_man_set) = match (args.insert_mean, args.insert_sdev) {
        (Some(mean), Some(sdev)) => (mean, sdev, true),
        _ => {
            let defaults = Options::default();
            (defaults.dist_mean, defaults.dist_sdev, false)
        }
    };
    Options {
        frr_weight: args.frr_weight,
        enclosing_weight: args.enclosing_weight,
        spanning_weight: args.spanning_weight,
        flanking_weight: args.flanking_weight,
        dist_mean,
        dist_sdev,
        dist_man_set,
        stutter_up: args.stutter_up,
        stutter_down: args.stutter_down,
        stutter_p: args.stutter_p,
        stutter_max: args.stutter_max,
        ploidy: args.ploidy,
        num_boot_samp: args.num_boot_samp,
        seed: args.seed,
        flanklen: args.flanklen,
        realignment_flanklen: args.realignment_flanklen,
        regionsize: args.regionsize,
        grid_policy: args.grid_policy,
        tie_break: args.tie_break,
        output_bootstrap: args.output_bootstrap,
        output_readinfo: args.output_readinfo,
    }
}

fn write_results(
    receiver: Receiver<Locus>,
    mut tsv_writer: TsvWriter<std::io::BufWriter<std::fs::File>>,
    mut bootstrap_writer: Option<BootstrapWriter<std::io::BufWriter<std::fs::File>>>,
    mut readinfo_writer: Option<ReadInfoWriter<std::io::BufWriter<std::fs::File>>>,
) -> Result<()> {
    for locus in &receiver {
        tsv_writer.write(&locus)?;
        if let Some(writer) = bootstrap_writer.as_mut() {
            writer.write(&locus)?;
        }
        if let Some(writer) = readinfo_writer.as_mut() {
            writer.write(&locus)?;
        }
    }
    tsv_writer.flush()?;
    if let Some(writer) = bootstrap_writer.as_mut() {
        writer.flush()?;
    }
    if let Some(writer) = readinfo_writer.as_mut() {
        writer.flush()?;
    }
    Ok(())
}

fn initialize_thread_pool(num_threads: usize) -> Result<()> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("strgt-{}", i))
        .build_global()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
