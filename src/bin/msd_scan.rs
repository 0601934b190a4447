// src/bin/msd_scan.rs - Mean MSD of a walker on a disordered lattice

use clap::Parser;
use csv::WriterBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use kmcgrid::batch::run_batch_with_progress;
use kmcgrid::observables::{mean_per_time, stats_per_time, windowed_slope};
use kmcgrid::sample::{sample_msd, sample_rmsd};
use kmcgrid::{target_times, BatchConfig, KmcError, Lattice};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
struct Cli {
    /// Lattice extents, one per axis (1 to 3 axes)
    #[arg(long, default_value = "100,100", value_delimiter = ',')]
    extents: Vec<usize>,

    /// Start site, one index per axis
    #[arg(long, default_value = "50,50", value_delimiter = ',')]
    start: Vec<usize>,

    /// Std dev of the Gaussian site energies (eV)
    #[arg(long, default_value = "0.0")]
    energy_std_dev: f64,

    /// Hop-rate prefactor
    #[arg(long, default_value = "1.0")]
    hop_rate: f64,

    /// Temperature (K)
    #[arg(long, default_value = "300.0")]
    temperature: f64,

    /// Simulated time per trajectory
    #[arg(long, default_value = "30.0")]
    horizon: f64,

    /// Number of trajectories
    #[arg(long, default_value = "1000")]
    trajectories: usize,

    /// Number of evenly spaced sampling times in [0, horizon]
    #[arg(long, default_value = "40")]
    samples: usize,

    /// Points per regression window for the MSD slope
    #[arg(long, default_value = "5")]
    window: usize,

    /// Reuse one disorder realization for every trajectory
    #[arg(long)]
    frozen: bool,

    /// Master seed
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Output CSV
    #[arg(long, default_value = "msd.csv")]
    output: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    tracing_subscriber::registry()
        .with(level_filter)
        .with(stderr_layer)
        .init();
}

fn axes<const D: usize>(name: &str, values: &[usize]) -> Result<[usize; D], KmcError> {
    values.try_into().map_err(|_| {
        KmcError::Dimension(format!("--{name} has {} entries, expected {D}", values.len()))
    })
}

fn scan<const D: usize>(args: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let extents: [usize; D] = axes("extents", &args.extents)?;
    let start: [usize; D] = axes("start", &args.start)?;

    let mut rng = ChaCha20Rng::seed_from_u64(args.seed);
    let lattice = Lattice::random_with(
        &mut rng,
        extents,
        args.energy_std_dev,
        args.hop_rate,
        args.temperature,
    )?;
    let config = BatchConfig {
        num_trajectories: args.trajectories,
        horizon: args.horizon,
        start,
        seed: args.seed,
        reshuffle: !args.frozen,
    };

    let bar = ProgressBar::new(args.trajectories as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
    )?);
    let batch = run_batch_with_progress(&lattice, &config, || bar.inc(1))?;
    bar.finish();
    info!(mean_jumps = batch.mean_jumps(), "trajectories collected");

    let times = target_times(args.horizon, args.samples);
    let msd = sample_msd(&start, &batch.trajectories, &times)?;
    let rmsd = sample_rmsd(&start, &batch.trajectories, &times)?;
    let msd_stats = stats_per_time(&msd);
    let mean_msd = mean_per_time(&msd);
    let mean_rmsd = mean_per_time(&rmsd);
    let slopes = windowed_slope(&times, &mean_msd, args.window)?;
    if slopes.is_empty() {
        warn!(window = args.window, samples = args.samples, "window too wide, no slopes");
    }

    let mut wtr = WriterBuilder::new().from_path(&args.output)?;
    wtr.write_record(["time", "mean_msd", "std_msd", "mean_rmsd", "slope"])?;
    for (i, &t) in times.iter().enumerate() {
        let slope = slopes.get(i).map(|s| s.to_string()).unwrap_or_default();
        wtr.write_record(&[
            t.to_string(),
            mean_msd[i].to_string(),
            msd_stats[i].std_dev().to_string(),
            mean_rmsd[i].to_string(),
            slope,
        ])?;
    }
    wtr.flush()?;
    println!("Scan complete → {}", args.output.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    setup_logging(args.verbose, args.quiet);
    info!(?args, "configuration");

    match args.extents.len() {
        1 => scan::<1>(&args),
        2 => scan::<2>(&args),
        3 => scan::<3>(&args),
        n => Err(KmcError::Dimension(format!("supported lattices have 1 to 3 axes, got {n}")).into()),
    }
}
