// antroute: ant-colony route planning from the command line
//
// Loads a road network, a traffic snapshot and an optional engine config,
// then routes single requests or generates a batch of random trips.

mod config;
mod output;

use anyhow::{Context, Result};
use antroute_core::{
    AntRouter, RoadNetwork, RouteResult, RoutingStats, SegmentId, SnapshotFrame,
};
use clap::{Args, Parser, Subcommand};
use colored::*;
use output::OutputFormat;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "antroute")]
#[command(about = "AntRoute: context-aware ant-colony route planning", long_about = None)]
#[command(version)]
struct Cli {
    /// Log routing decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one request
    Route {
        #[command(flatten)]
        inputs: Inputs,
        /// Start segment id
        #[arg(long)]
        from: String,
        /// Destination segment id
        #[arg(long)]
        to: String,
        /// Send this many ants and report the best route
        #[arg(long, default_value = "1")]
        ants: usize,
    },
    /// Route random trips between network segments and write them out
    Generate {
        #[command(flatten)]
        inputs: Inputs,
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Inspect or edit an engine config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct Inputs {
    /// Road network JSON file
    #[arg(long)]
    network: PathBuf,
    /// Traffic snapshot JSON file; omit for empty roads
    #[arg(long)]
    traffic: Option<PathBuf>,
    /// Engine config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Run seed; overrides the config file
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print every setting, or just KEY
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
        key: Option<String>,
    },
    /// Check a config file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Change one setting, creating the file if needed
    Set {
        #[arg(short, long)]
        config: PathBuf,
        key: String,
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Route {
            inputs,
            from,
            to,
            ants,
        } => cmd_route(inputs, from, to, ants),
        Commands::Generate {
            inputs,
            count,
            output,
            format,
        } => cmd_generate(inputs, count, &output, format),
        Commands::Config { action } => cmd_config(action),
    }
}

struct Loaded {
    router: AntRouter<RoadNetwork>,
    traffic: SnapshotFrame,
}

fn load_inputs(inputs: &Inputs) -> Result<Loaded> {
    let network = RoadNetwork::from_json_file(&inputs.network)
        .with_context(|| format!("Failed to load network {}", inputs.network.display()))?;
    let traffic = match &inputs.traffic {
        Some(path) => SnapshotFrame::from_json_file(path)
            .with_context(|| format!("Failed to load traffic snapshot {}", path.display()))?,
        None => SnapshotFrame::new(),
    };
    let config = config::ConfigFile::load(inputs.config.as_deref())?.with_seed(inputs.seed);

    tracing::info!(
        "Loaded {} segments and {} occupants",
        network.segment_count(),
        traffic.total_occupants()
    );
    let router = AntRouter::new(network, config.aco).context("Invalid engine configuration")?;
    Ok(Loaded { router, traffic })
}

fn cmd_route(inputs: Inputs, from: String, to: String, ants: usize) -> Result<()> {
    let Loaded { router, traffic } = load_inputs(&inputs)?;
    let from = SegmentId::new(from);
    let to = SegmentId::new(to);

    let result = router
        .colony_search(&from, &to, &traffic, ants)
        .context("Routing failed")?;
    print_route(&result.best);
    if ants > 1 {
        println!(
            "  Ants:      {} ({} reached the destination)",
            result.ants, result.complete_routes
        );
    }
    println!("  Run seed:  {}", router.run_seed().to_string().dimmed());
    Ok(())
}

fn cmd_generate(inputs: Inputs, count: usize, output: &Path, format: OutputFormat) -> Result<()> {
    let Loaded { router, traffic } = load_inputs(&inputs)?;
    let endpoints = router.graph().segment_ids().to_vec();

    let results = router
        .generate(count, &endpoints, &traffic)
        .context("Route generation failed")?;
    output::write_routes(output, format, &results)?;

    println!(
        "{} Wrote {} routes to {}",
        "✓".green(),
        results.len(),
        output.display().to_string().bright_cyan()
    );
    print_stats(&router.stats());
    println!("  Run seed:  {}", router.run_seed().to_string().dimmed());
    Ok(())
}

fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { config, key } => {
            let config = config::ConfigFile::load(config.as_deref())?;
            if let Some(key) = key {
                let value = config
                    .get(&key)
                    .with_context(|| format!("Unknown config key: {}", key))?;
                println!("{}", value);
                return Ok(());
            }
            println!("{}", "Engine configuration".bold());
            if let Some(path) = &config.path {
                println!("  {}", path.display().to_string().dimmed());
            }
            println!();
            for (key, value) in config.list() {
                println!("  {:<20} {}", key.bright_cyan(), value);
            }
        }

        ConfigAction::Validate { config } => {
            config::ConfigFile::load(Some(&config))?;
            println!("{} {} is valid", "✓".green(), config.display());
        }

        ConfigAction::Set { config, key, value } => {
            let mut file = config::ConfigFile::load_or_create(&config)?;
            file.set(&key, &value)?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }
    }

    Ok(())
}

fn print_route(result: &RouteResult) {
    let route = result.outcome.route();
    let status = match result.outcome.termination() {
        None => "complete".green(),
        Some(reason) => format!("incomplete ({:?})", reason).as_str().yellow(),
    };

    println!("{}", "Route".bold());
    println!(
        "  {} -> {}: {}",
        result.request.start, result.request.destination, status
    );
    let segments: Vec<&str> = route.iter().map(SegmentId::as_str).collect();
    println!("  Segments:  {}", segments.join(" ").bright_cyan());
    println!("  Hops:      {}", route.len());
    println!("  Quality:   {:.6e}", result.quality.quality().value());
}

fn print_stats(stats: &RoutingStats) {
    println!("{}", "Statistics".bold());
    println!("  Routes:     {}", stats.total_routes);
    println!("  Complete:   {}", stats.complete_routes);
    println!(
        "  Incomplete: {} (dead end {}, loop {}, hop cap {})",
        stats.incomplete_routes, stats.dead_ends, stats.loops, stats.hop_cap_hits
    );
    println!("  Mean quality: {:.6e}", stats.mean_quality);
}
