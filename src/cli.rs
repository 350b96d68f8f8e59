use crate::{
    config::Config,
    gateways::geocoding_gateway,
    report,
    session::{load_state, save_state},
};
use amap_core::{
    normalize::{normalize_address, select_address},
    repositories::GeoCacheRepo,
    usecases::{self, BatchSettings, ResolutionSession},
};
use amap_geocache::GeoCacheStore;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "auctionmap")]
#[command(about = "Resolve the addresses of scraped auction records to map positions")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: auctionmap.toml)
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the positions of all records in a JSON report
    Resolve {
        /// Report with auction records (JSON)
        report: PathBuf,

        /// Write the enriched records into this file
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Query the geocoding service even if the report is unchanged
        #[arg(long)]
        force: bool,

        /// Query the geocoding service if the report has not been processed completely
        #[arg(long)]
        auto: bool,
    },

    /// Print the lookup keys of addresses
    Normalize {
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Manage the geocode cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Print the number of cached positions
    Stats,
    /// Remove all cached positions
    Clear,
}

pub fn run(cli: Cli) -> Result<()> {
    let Cli { config, command } = cli;
    match command {
        Commands::Normalize { addresses } => {
            for addr in addresses {
                println!("{}", normalize_address(&addr));
            }
            Ok(())
        }
        Commands::Cache { command } => {
            let cfg = Config::try_load_from_file_or_default(config)?;
            let store = GeoCacheStore::new(cfg.geocache.file);
            match command {
                CacheCommands::Stats => {
                    println!("{}: {} entries", store.path().display(), store.count_entries());
                }
                CacheCommands::Clear => {
                    let count = usecases::clear_geocache(&store)?;
                    println!("Removed {count} entries from {}", store.path().display());
                }
            }
            Ok(())
        }
        Commands::Resolve {
            report,
            output,
            force,
            auto,
        } => {
            let cfg = Config::try_load_from_file_or_default(config)?;
            resolve(&cfg, &report, output.as_deref(), force, auto)
        }
    }
}

fn resolve(
    cfg: &Config,
    report_path: &Path,
    output: Option<&Path>,
    explicit: bool,
    auto_enabled: bool,
) -> Result<()> {
    let records = report::load_records(report_path)?;
    let signature = report::file_signature(report_path)?;
    let store = GeoCacheStore::new(&cfg.geocache.file);
    let mut state = load_state(&cfg.session.state_file);

    let resolved = match ResolutionSession::start(signature, explicit, auto_enabled, &state) {
        Some(session) => {
            let gateway = geocoding_gateway(cfg.geocoding.gateway.clone())?;
            let settings = BatchSettings {
                throttle: cfg.geocoding.throttle,
                workers: cfg.geocoding.workers,
                ..Default::default()
            };
            let outcome = session.run(&mut state, &store, &gateway, records, &settings)?;
            save_state(&cfg.session.state_file, &state)?;
            outcome.records
        }
        None => {
            log::info!("Skip geocoding, only cached positions are used");
            usecases::prefill_from_cache(&store, records)
        }
    };

    let unmapped: Vec<_> = resolved.iter().filter(|r| !r.is_mapped()).collect();
    log::info!(
        "{} of {} record(s) are mapped",
        resolved.len() - unmapped.len(),
        resolved.len()
    );
    for r in &unmapped {
        log::info!(
            "Unmapped: '{}' => '{}'",
            select_address(&r.record).unwrap_or_default(),
            r.key
        );
    }

    if let Some(output) = output {
        report::write_enriched(output, &resolved)?;
    }
    Ok(())
}
