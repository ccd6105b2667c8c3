//! Wallet transfer analysis CLI.
//!
//! Scores a wallet snapshot against risk heuristics and lays out its
//! transfer graph.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use log::LevelFilter;

use walletscope::analysis;
use walletscope::config::Config;
use walletscope::config_loader::{self, CliOverrides};
use walletscope::graph::{build_graph, ForceSimulation, LayoutResult};
use walletscope::ingest::{self, SnapshotMetadata, WalletSnapshot};
use walletscope::utils::{format_wei, validate_address};

#[derive(Parser)]
#[command(name = "walletscope")]
#[command(about = "Wallet transfer risk analysis and transfer graph layout")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the wallet snapshot JSON
    #[arg(short, long, global = true, default_value = "wallet.json")]
    snapshot: PathBuf,

    /// Path to the configuration YAML (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for reports
    #[arg(short, long, global = true, default_value = "walletscope_output")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Seed for the initial layout placement
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Tick ceiling for the layout
    #[arg(long, global = true)]
    max_ticks: Option<u64>,

    /// Concurrent token metadata lookups
    #[arg(long, global = true)]
    lookup_parallelism: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis (risk + tokens + layout)
    Analyze {
        /// Skip the transfer graph layout
        #[arg(long)]
        no_layout: bool,
    },

    /// Compute the risk profile only
    Risk,

    /// Lay out the transfer graph only
    Layout {
        /// Stream every frame to frames.jsonl, paced by layout.frame_interval
        #[arg(long)]
        frames: bool,
    },

    /// Show snapshot statistics without analysis
    Summary,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Logging starts before the config is read so its messages are kept.
    // Without --log-level or RUST_LOG the config's level is applied once loaded.
    let explicit_filters = cli
        .log_level
        .clone()
        .or_else(|| std::env::var(env_logger::DEFAULT_FILTER_ENV).ok());
    let mut logger = env_logger::Builder::new();
    match explicit_filters.as_deref() {
        Some(filters) => logger.parse_filters(filters),
        None => logger.filter_level(LevelFilter::Trace),
    };
    logger.init();
    if explicit_filters.is_none() {
        log::set_max_level(LevelFilter::Info);
    }

    let mut config = config_loader::load_or_default(cli.config.as_deref())?;
    if explicit_filters.is_none() {
        if let Some(level) = config_loader::config_log_level(&config)? {
            log::set_max_level(level);
        }
    }

    config_loader::apply_overrides(
        &mut config,
        &CliOverrides {
            seed: cli.seed,
            max_ticks: cli.max_ticks,
            lookup_parallelism: cli.lookup_parallelism,
        },
    )?;

    // Set thread pool size
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let snapshot = ingest::load_snapshot(&cli.snapshot)?;
    validate_address(&snapshot.address)
        .wrap_err_with(|| format!("Rejected snapshot {}", cli.snapshot.display()))?;

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create output directory: {}", cli.output.display()))?;

    match cli.command {
        Commands::Analyze { no_layout } => {
            if no_layout {
                config.general.include_layout = false;
            }
            run_analysis(&cli.output, &snapshot, &config)?;
        }
        Commands::Risk => {
            let transfers = ingest::normalize_transfers(&snapshot.transfers);
            let context = analysis::wallet_context(&snapshot);
            let result = analysis::analyze_risk(&transfers, &context, &config.risk).to_risk_result();

            let path = cli.output.join("risk_report.json");
            let json = serde_json::to_string_pretty(&result)
                .context("Failed to serialize risk profile")?;
            fs::write(&path, &json)
                .with_context(|| format!("Failed to write risk profile to {}", path.display()))?;

            log::info!("Risk profile written to {}", path.display());
            println!("{}", json);
        }
        Commands::Layout { frames } => {
            let transfers = ingest::normalize_transfers(&snapshot.transfers);
            let simulation = ForceSimulation::new(build_graph(&transfers), config.layout.clone());

            let result = if frames {
                stream_layout(&cli.output, &simulation, &config)?
            } else {
                simulation.run()
            };

            let path = cli.output.join("layout.json");
            let json = serde_json::to_string_pretty(&result)
                .context("Failed to serialize layout")?;
            fs::write(&path, json)
                .with_context(|| format!("Failed to write layout to {}", path.display()))?;

            log::info!("Layout written to {}", path.display());
            println!(
                "Layout {} after {} ticks: {} nodes, {} edges",
                result.status,
                result.ticks,
                result.frame.positions.len(),
                result.edges.len()
            );
        }
        Commands::Summary => print_snapshot_summary(&cli.snapshot, &snapshot),
    }

    Ok(())
}

fn run_analysis(output_dir: &Path, snapshot: &WalletSnapshot, config: &Config) -> Result<()> {
    log::info!("Running full analysis...");

    let source = SnapshotMetadata::new(&snapshot.token_metadata);
    let report = analysis::analyze_wallet(snapshot, &source, config)?;

    analysis::generate_json_report(&report, &output_dir.join("wallet_report.json"))?;
    analysis::generate_text_report(&report, &output_dir.join("wallet_report.txt"))?;
    analysis::print_summary(&report);

    log::info!("Analysis complete. Reports written to {}", output_dir.display());
    Ok(())
}

/// Write every frame as it is produced, then return the final layout
fn stream_layout(output_dir: &Path, simulation: &ForceSimulation, config: &Config) -> Result<LayoutResult> {
    let interval = config.layout.frame_interval;
    let mut frames = simulation.frames();

    analysis::write_frames(
        frames.by_ref().inspect(|_| {
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }),
        &output_dir.join("frames.jsonl"),
    )?;

    let state = frames.into_state();
    Ok(LayoutResult {
        status: state.status(),
        ticks: state.tick_count(),
        frame: state.snapshot(),
        edges: simulation.graph().edges.clone(),
    })
}

fn print_snapshot_summary(path: &Path, snapshot: &WalletSnapshot) {
    let transfers = ingest::normalize_transfers(&snapshot.transfers);
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for transfer in &transfers {
        *categories.entry(transfer.category.to_string()).or_default() += 1;
    }

    println!("\n=== WALLETSCOPE SNAPSHOT SUMMARY ===\n");
    println!("Snapshot: {}", path.display());
    println!("Wallet: {}", snapshot.address);
    if let Some(eth) = snapshot.balance.as_deref().and_then(format_wei) {
        println!("ETH balance: {}", eth);
    }
    println!("Lifetime transactions: {}", snapshot.transaction_count);
    println!();
    println!("Transfer records: {}", snapshot.transfers.len());
    println!("  Usable: {}", transfers.len());
    println!(
        "  Token transfers: {}",
        transfers.iter().filter(|t| t.category.is_token()).count()
    );
    for (category, count) in &categories {
        println!("  {}: {}", category, count);
    }
    println!();
    println!("Token balances: {}", snapshot.token_balances.len());
    println!("  Non-zero: {}", ingest::count_nonzero_tokens(&snapshot.token_balances));
    println!("  Inline metadata: {}", snapshot.token_metadata.len());
    println!();
}
