#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `loc_analyze`: turns directories of operator location logs into HTML
//! reports with map images of the most frequent locations.
//!
//! Uses `indicatif-log-bridge` (via [`loc_analyze_cli_utils::init_logger`])
//! so that log lines and the batch progress bar share the terminal.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use loc_analyze_cli_utils::IndicatifProgress;
use loc_analyze_ingest::Analyzer;
use loc_analyze_ingest::classify::{classify, is_eligible};
use loc_analyze_ingest::pipeline::analyze_log;
use loc_analyze_location_models::config::AnalyzeConfig;
use loc_analyze_render::{CommandRenderer, MapRenderer, RasterRenderer};

#[derive(Parser)]
#[command(name = "loc_analyze", about = "Operator location log analysis")]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every file group under ROOT and write one report per group
    Run {
        /// Directory to search for location logs
        root: PathBuf,
        /// Directory for reports and map images (default: next to each log)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of top locations to map and describe
        #[arg(long)]
        top: Option<usize>,
    },
    /// List the file groups under ROOT and whether they can be analyzed
    Scan {
        /// Directory to search for location logs
        root: PathBuf,
    },
    /// Parse a single location log and print its ranking as JSON
    Inspect {
        /// Location log file
        file: PathBuf,
        /// Number of ranked locations to print (default: all)
        #[arg(long)]
        top: Option<usize>,
    },
}

fn load_config(path: Option<&Path>) -> Result<AnalyzeConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(AnalyzeConfig::default());
    };
    let config = AnalyzeConfig::load(path)?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn renderer(config: &AnalyzeConfig) -> Box<dyn MapRenderer> {
    match &config.render.command {
        Some(program) => {
            log::info!("Rendering maps with external program '{program}'");
            Box::new(CommandRenderer::new(program.clone()))
        }
        None => Box::new(RasterRenderer::new()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = loc_analyze_cli_utils::init_logger();
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { root, output, top } => {
            if let Some(top) = top {
                config.render.top_n = top;
            }

            let renderer = renderer(&config);
            let analyzer = Analyzer::new(config, renderer, output)?;
            let progress = IndicatifProgress::groups_bar(&multi, "Analyzing");
            let summary = analyzer.run_batch(&root, progress.as_ref())?;

            for report in &summary.reports {
                println!(
                    "{}: {} locations, {} maps ({} failed) -> {}",
                    report.base_name,
                    report.locations,
                    report.maps.len(),
                    report.failed_maps,
                    report.report_path.display()
                );
            }
            println!(
                "{} reported, {} skipped, {} failed",
                summary.processed, summary.skipped, summary.failed
            );
        }
        Commands::Scan { root } => {
            let groups = classify(&root, &config.discovery)?;
            for group in &groups {
                let extensions: Vec<&str> = group.extensions().into_iter().collect();
                let status = if is_eligible(group, &config.discovery) {
                    "ok"
                } else {
                    "no location log"
                };
                println!("{}\t{}\t{status}", group.base_name, extensions.join(","));
            }
            println!("{} file groups", groups.len());
        }
        Commands::Inspect { file, top } => {
            let analysis = analyze_log(&file, &config.discovery.encoding)?;
            let locations = top.map_or(analysis.ranking.locations.as_slice(), |n| {
                analysis.ranking.top(n)
            });
            let issues: Vec<String> = analysis
                .events
                .skipped
                .iter()
                .chain(&analysis.stats.skipped)
                .map(ToString::to_string)
                .chain(
                    analysis
                        .events
                        .warnings
                        .iter()
                        .chain(&analysis.stats.warnings)
                        .map(ToString::to_string),
                )
                .collect();

            let value = serde_json::json!({
                "file": file,
                "header": analysis.header,
                "events": analysis.events.records.len(),
                "statistics": analysis.stats.records.len(),
                "totalEvents": analysis.ranking.total_events(),
                "locations": locations,
                "issues": issues,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
