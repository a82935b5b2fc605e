mod cli;

use burn_sampler::SamplerError;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::SmokeArgs;

fn main() -> Result<(), SamplerError> {
    let args = SmokeArgs::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    // Also forwards the `log` records of the sampler.
    if let Err(err) = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Failed to install the logger: {err}");
    }

    let report = cli::run(&args)?;
    log::info!(
        "Sampler built: {} samples per replica, {} in total",
        report.num_samples,
        report.total_size,
    );
    if let Some(num_duplicated) = report.num_duplicated {
        log::info!("Shards verified, {num_duplicated} samples iterated twice");
    }

    Ok(())
}
