#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use ahp_engine::config::{load_config_from_path, EngineConfig};
use ahp_engine::evaluation::{analyze, run_evaluation_with, EvaluationRequest, Judgments};
use ahp_engine::random_index::simulate_random_index;
use ahp_engine::report::render_markdown;
use ahp_engine::workbook::{evaluate_workbook, read_workbook};

#[derive(Parser)]
#[command(name = "ahp", version, about = "AHP evaluation CLI")]
struct Cli {
    /// Engine config JSON (consistency threshold, tolerances)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one pairwise matrix from JSON input
    Solve {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run a full evaluation from a JSON request
    Evaluate {
        #[arg(long)]
        request: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Also write a markdown report
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Evaluate a spreadsheet: first sheet compares criteria, one sheet per criterion
    Workbook {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Estimate random consistency indices by simulation (JSONL, one line per size)
    RandomIndex {
        #[arg(long, default_value_t = 10)]
        max_n: usize,
        #[arg(long, default_value_t = 1000)]
        samples: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

/// `{"item_ids": [...], "comparisons": [...]}` or `{"item_ids": [...], "matrix": [[...]]}`.
#[derive(Deserialize)]
struct SolveInput {
    item_ids: Vec<String>,
    #[serde(flatten)]
    judgments: Judgments,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ahp_engine=info,warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Solve { input, out } => {
            cfg.validate()?;
            let input: SolveInput = read_json(&input)?;
            let analysis = analyze("input", &input.judgments, &input.item_ids, &cfg)?;
            write_json(&out, &analysis)?;
        }
        Commands::Evaluate {
            request,
            out,
            report,
        } => {
            let req: EvaluationRequest = read_json(&request)?;
            let resp = run_evaluation_with(&req, &cfg)?;
            write_json(&out, &resp)?;
            if let Some(path) = report {
                std::fs::write(path, render_markdown(&resp))?;
            }
        }
        Commands::Workbook { input, out, report } => {
            let sheets = read_workbook(&input)?;
            let resp = evaluate_workbook(&sheets, &cfg)?;
            write_json(&out, &resp)?;
            if let Some(path) = report {
                std::fs::write(path, render_markdown(&resp))?;
            }
        }
        Commands::RandomIndex {
            max_n,
            samples,
            seed,
            out,
        } => {
            let mut file = File::create(out)?;
            for n in 1..=max_n {
                let estimate = simulate_random_index(n, samples, seed.wrapping_add(n as u64));
                let line = serde_json::to_string(&estimate)?;
                writeln!(file, "{line}")?;
            }
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &PathBuf,
) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    std::fs::write(path, json)
}
