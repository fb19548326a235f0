// SPDX-License-Identifier: GPL-3.0-only

//! Command-line front end for disc capacity and image pruning

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use disc_sys::check::check_capacity;
use disc_sys::config::{self, Config};
use disc_sys::fit::FitStrategy;
use disc_sys::image::{
    CapacityPruner, ImageSizeEstimator, IsoImage, Mkisofs, PaddedEstimator, SizeTable, expand_entries,
};
use disc_sys::writer::{MediaWriter, calculate_capacity, calculate_dvd_capacity};
use disc_types::{
    BYTES_PER_MBYTE, Boundaries, EntryMap, MediaCapacity, MediaType, bytes_to_pretty, display_bytes,
    pretty_to_bytes,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "discfit")]
#[command(about = "Fit backups onto CD and DVD media", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct MediaArgs {
    /// Media type (cdr74, cdrw74, cdr80, cdrw80, dvdplusr, dvdplusrw); defaults to the configured one
    #[arg(long)]
    media: Option<MediaType>,

    /// Multisession boundaries as reported by `cdrecord -msinfo`
    #[arg(long, conflicts_with_all = ["query", "sectors_used"])]
    boundaries: Option<Boundaries>,

    /// Sectors already used on DVD media
    #[arg(long, conflicts_with = "query")]
    sectors_used: Option<f64>,

    /// Ask the writer about the disc in the drive instead
    #[arg(long)]
    query: bool,

    /// Report capacity as if the disc were rewritten from scratch
    #[arg(long)]
    entire_disc: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show used and available space on a disc
    Capacity {
        #[command(flatten)]
        media: MediaArgs,
        #[arg(long)]
        json: bool,
    },
    /// Check a disc against the configured capacity limit
    Check {
        #[command(flatten)]
        media: MediaArgs,
    },
    /// Prune a set of entries so their image fits a capacity
    Prune {
        /// Entries as `path` or `path=graft/point`
        #[arg(required = true)]
        entries: Vec<String>,
        /// Capacity such as "650 MB" or "332800 sectors"
        #[arg(long)]
        capacity: String,
        /// Knapsack strategy; defaults to the configured one
        #[arg(long, value_enum)]
        strategy: Option<FitStrategy>,
        #[arg(long)]
        json: bool,
    },
    /// Compare the knapsack strategies over the files in a directory
    Fit {
        /// Directory to draw files from
        dir: PathBuf,
        /// Container capacity in megabytes
        #[arg(long, default_value_t = 650.0)]
        capacity_mb: f64,
    },
}

#[derive(Serialize)]
struct PrunedEntry<'a> {
    path: &'a Path,
    graft_point: Option<&'a str>,
}

#[derive(Serialize)]
struct PruneReport<'a> {
    estimated_size: f64,
    entries: Vec<PrunedEntry<'a>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Capacity { media, json } => {
            let capacity = media_capacity(&config, &media)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&capacity)?);
            } else {
                print_capacity(&capacity);
            }
        }
        Commands::Check { media } => {
            let limit = config
                .capacity_limit()?
                .context("no [capacity] limit is configured")?;
            let capacity = media_capacity(&config, &media)?;
            print_capacity(&capacity);
            if check_capacity(&capacity, &limit).limit_reached() {
                println!("status:    limit reached");
                std::process::exit(2);
            }
            println!("status:    within limit");
        }
        Commands::Prune {
            entries,
            capacity,
            strategy,
            json,
        } => prune(&config, &entries, &capacity, strategy, json)?,
        Commands::Fit { dir, capacity_mb } => compare_strategies(&dir, capacity_mb)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "disc_sys=debug,discfit=debug,warn"
    } else {
        "disc_sys=info,discfit=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn media_capacity(config: &Config, args: &MediaArgs) -> Result<MediaCapacity> {
    let media_type = args.media.unwrap_or(config.writer.media);
    let media = media_type.definition();

    if args.query {
        let hardware_id = config
            .hardware_id()
            .context("querying the drive needs a device or hardware_id in the configuration")?;
        let writer = MediaWriter::for_media(
            media_type,
            hardware_id,
            config.writer.multisession,
            config.writer.drive_speed,
        )?;
        return Ok(writer.retrieve_capacity(args.entire_disc, config.writer.multisession)?);
    }

    if media_type.is_dvd() {
        let sectors_used = if args.entire_disc {
            0.0
        } else {
            args.sectors_used.unwrap_or(0.0)
        };
        Ok(calculate_dvd_capacity(&media, sectors_used))
    } else {
        let boundaries = if args.entire_disc { None } else { args.boundaries };
        Ok(calculate_capacity(&media, boundaries))
    }
}

fn print_capacity(capacity: &MediaCapacity) {
    println!("used:      {}", bytes_to_pretty(capacity.bytes_used() as u64));
    println!("available: {}", bytes_to_pretty(capacity.bytes_available() as u64));
    if let Some(boundaries) = capacity.boundaries() {
        println!("sessions:  {}", boundaries);
    }
    println!("{}", capacity);
}

fn parse_entry(spec: &str) -> (PathBuf, Option<&str>) {
    match spec.split_once('=') {
        Some((path, graft)) if !graft.is_empty() => (PathBuf::from(path), Some(graft)),
        Some((path, _)) => (PathBuf::from(path), None),
        None => (PathBuf::from(spec), None),
    }
}

fn prune(
    config: &Config,
    entries: &[String],
    capacity: &str,
    strategy: Option<FitStrategy>,
    json: bool,
) -> Result<()> {
    let capacity = pretty_to_bytes(capacity)?;

    let options = config.image_options();
    let mut image = IsoImage::new(options.clone());
    for spec in entries {
        let (path, graft_point) = parse_entry(spec);
        image.add_entry(&path, graft_point, false, false)?;
    }

    let mkisofs = Mkisofs::new(options)?;
    let strategy = strategy.unwrap_or(config.image.prune_strategy);
    let estimated_size = if config.writer.media.is_dvd() {
        prune_with(&mut image, PaddedEstimator::dvd(&mkisofs), strategy, capacity)?
    } else {
        prune_with(&mut image, &mkisofs, strategy, capacity)?
    };

    if json {
        let report = PruneReport {
            estimated_size,
            entries: image
                .entries()
                .iter()
                .map(|(path, graft_point)| PrunedEntry {
                    path,
                    graft_point: graft_point.as_deref(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for spec in disc_sys::image::path_specs(image.entries()) {
        println!("{spec}");
    }
    println!();
    println!(
        "{} entries, estimated size {} of {}",
        image.entries().len(),
        display_bytes(estimated_size, 2),
        display_bytes(capacity, 2)
    );
    Ok(())
}

fn prune_with<E: ImageSizeEstimator>(
    image: &mut IsoImage,
    estimator: E,
    strategy: FitStrategy,
    capacity: f64,
) -> Result<f64> {
    let pruner = CapacityPruner::new(estimator).with_strategy(strategy);
    Ok(image.prune_image_with(&pruner, capacity)?)
}

fn compare_strategies(dir: &Path, capacity_mb: f64) -> Result<()> {
    let capacity = capacity_mb * BYTES_PER_MBYTE;
    let entries = expand_entries(&EntryMap::from([(dir.to_path_buf(), None)]));
    let table = SizeTable::build(&entries);
    let items = table.items();

    println!(
        "{} files totalling {}, capacity {}",
        items.len(),
        display_bytes(table.total_file_bytes(), 2),
        display_bytes(capacity, 2)
    );
    println!();
    println!("STRATEGY        FILES        BYTES   UTILIZED   ELAPSED");
    println!("--------------------------------------------------------");

    for strategy in FitStrategy::ALL {
        let started = Instant::now();
        let selection = strategy.fit(&items, capacity);
        let elapsed = started.elapsed();
        let utilized = if capacity > 0.0 {
            selection.used / capacity * 100.0
        } else {
            0.0
        };
        println!(
            "{:<13} {:>7} {:>12} {:>9.2}% {:>8.3}s",
            strategy.as_str(),
            selection.keys.len(),
            display_bytes(selection.used, 2),
            utilized,
            elapsed.as_secs_f64()
        );
    }

    Ok(())
}
