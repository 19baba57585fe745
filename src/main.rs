use uavgen::clock::SystemClock;
use uavgen::config::{self, Configuration};
use uavgen::error::Result;
use uavgen::export;
use uavgen::generator::Generator;
use uavgen::sampler::RngSampler;
use uavgen::ui::Progress;
use uavgen::*;
mod cmd;

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;

fn run(args: cmd::Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => {
            log::info!("No configuration file: using the default configuration");
            Configuration::default()
        }
    };
    let mode = Mode::from_uplink_flag(args.uplink);
    let outdir = PathBuf::from(
        args.outdir
            .clone()
            .unwrap_or_else(|| config.output.directory.clone()),
    );

    if let Some(s) = args.seed {
        log::info!("Generating {} {mode} packets with seed {s}", args.packets_count);
    } else {
        log::info!("Generating {} {mode} packets", args.packets_count);
    }

    let start = Instant::now();
    let generator = Generator::new(
        &config,
        mode,
        RngSampler::from_seed(args.seed),
        SystemClock,
    );
    let progress = Progress::new(args.packets_count as u64);
    let results = generator.run(args.packets_count, &progress)?;

    let files = export::save_output(&results, &outdir, config.output.bins(mode))?;
    log::info!("Packets saved into {}", files.pcap.display());
    log::info!("Statistics saved into {}", files.statistics.display());
    log::info!("Histograms saved into {}", files.histograms.display());
    log::info!("Figure saved into {}", files.figure.display());
    log::info!("Total time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cmd::Args::parse();

    if let Err(e) = run(args) {
        log::error!("{e}");
        process::exit(1);
    }
}
