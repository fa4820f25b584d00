//! Command line front end: solve a Hashiwokakero grid with one or more strategies and compare them.

mod grid;
mod settings;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use hashiwokakero::validate::verify;
use hashiwokakero::{PuzzleGraph, PuzzleGraphBuilder, SolveResult, Strategy};
use serde::Serialize;

use crate::grid::{load_grid, render};
use crate::settings::{CliOverrides, OutputFormat, Settings};

#[derive(Parser)]
#[command(name = "solver")]
#[command(about = "Hashiwokakero (Bridges) puzzle solver")]
#[command(version = "0.1.0")]
struct Cli {
    /// Grid file: one row per line, cells separated by commas or whitespace, 0 for water
    grid: PathBuf,

    /// Strategy to run (sat, astar, backtracking, brute-force or all); repeat or comma-separate for several
    #[arg(short, long, value_delimiter = ',')]
    strategy: Vec<String>,

    /// Seconds each strategy may run before it is abandoned
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report progress on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Status {
    Solved,
    Failed,
    Timeout,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Status::Solved => "SOLVED",
            Status::Failed => "FAILED",
            Status::Timeout => "TIMEOUT",
        })
    }
}

#[derive(Debug, Serialize)]
struct Bridge {
    // (row, col)
    from: (usize, usize),
    to: (usize, usize),
    count: u8,
}

#[derive(Debug, Serialize)]
struct StrategyReport {
    strategy: String,
    status: Status,
    seconds: Option<f64>,
    stats: Option<String>,
    fault: Option<String>,
    bridges: Vec<Bridge>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rendering: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GridSummary {
    width: usize,
    height: usize,
    islands: usize,
    edges: usize,
    crossings: usize,
}

#[derive(Debug, Serialize)]
struct RunReport {
    grid: GridSummary,
    timeout_seconds: f64,
    results: Vec<StrategyReport>,
}

enum Outcome {
    Finished(SolveResult, Duration),
    TimedOut,
    Crashed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.merge_with_cli(&CliOverrides {
        strategies: cli.strategy.clone(),
        timeout_seconds: cli.timeout,
        format: cli.format,
    });
    settings.validate().context("Configuration validation failed")?;

    let strategies = settings.strategies()?;
    let timeout = settings.timeout()?;

    let rows = load_grid(&cli.grid)?;
    let graph = PuzzleGraphBuilder::from_rows(rows.as_slice())
        .build()
        .with_context(|| format!("Malformed grid in {}", cli.grid.display()))?;
    let graph = Arc::new(graph);

    let summary = summarize(&graph);
    if cli.verbose {
        eprintln!(
            "Loaded {}: {}x{}, {} islands, {} candidate edges, {} crossing pairs",
            cli.grid.display(), summary.width, summary.height, summary.islands, summary.edges, summary.crossings,
        );
    }

    let mut results = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        if cli.verbose {
            eprintln!("Running {strategy} (timeout {:.1}s)...", timeout.as_secs_f64());
        }

        let outcome = run_with_timeout(&graph, strategy, timeout)?;
        let report = report(&graph, strategy, outcome, settings.output.render)?;

        if cli.verbose {
            eprintln!("  {} {}", report.status, report.stats.as_deref().unwrap_or("-"));
        }
        results.push(report);
    }

    let run = RunReport { grid: summary, timeout_seconds: timeout.as_secs_f64(), results };
    match settings.output.format {
        OutputFormat::Text => print_text(&run),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&run).context("Failed to serialize results")?;
            println!("{json}");
        }
    }

    Ok(())
}

fn summarize(graph: &PuzzleGraph) -> GridSummary {
    let (width, height) = graph.dims();
    GridSummary {
        width: width.get(),
        height: height.get(),
        islands: graph.islands().len(),
        edges: graph.edges().len(),
        crossings: graph.crossings().len(),
    }
}

/// Solve on a worker thread, giving up on it after `timeout`.
///
/// A timed out worker is left running detached; it shares the graph through an `Arc` and exits with the process.
fn run_with_timeout(graph: &Arc<PuzzleGraph>, strategy: Strategy, timeout: Duration) -> Result<Outcome> {
    let (sender, receiver) = mpsc::channel();
    let graph = Arc::clone(graph);

    thread::Builder::new()
        .name(strategy.to_string())
        .spawn(move || {
            let start = Instant::now();
            let result = strategy.instantiate().solve(&graph);
            // nobody is listening once the run has timed out
            let _ = sender.send((result, start.elapsed()));
        })
        .with_context(|| format!("Failed to start a worker for {strategy}"))?;

    Ok(match receiver.recv_timeout(timeout) {
        Ok((result, elapsed)) => Outcome::Finished(result, elapsed),
        Err(RecvTimeoutError::Timeout) => Outcome::TimedOut,
        Err(RecvTimeoutError::Disconnected) => Outcome::Crashed,
    })
}

fn report(graph: &PuzzleGraph, strategy: Strategy, outcome: Outcome, draw: bool) -> Result<StrategyReport> {
    let mut report = StrategyReport {
        strategy: strategy.to_string(),
        status: Status::Failed,
        seconds: None,
        stats: None,
        fault: None,
        bridges: Vec::new(),
        rendering: Vec::new(),
    };

    let (result, elapsed) = match outcome {
        Outcome::Finished(result, elapsed) => (result, elapsed),
        Outcome::TimedOut => {
            report.status = Status::Timeout;
            return Ok(report);
        }
        Outcome::Crashed => {
            report.fault = Some("worker thread panicked".into());
            return Ok(report);
        }
    };

    report.seconds = Some(elapsed.as_secs_f64());
    report.stats = Some(result.stats.to_string());
    report.fault = result.fault;

    if let Some(solution) = result.solution {
        if let Err(violation) = verify(graph, &solution) {
            bail!("{strategy} returned a layout which breaks the rules: {violation}");
        }

        report.status = Status::Solved;
        report.bridges = graph.edges().iter()
            .filter_map(|edge| solution.get(&edge.endpoints()).map(|count| {
                let from = graph.islands()[edge.from].location;
                let to = graph.islands()[edge.to].location;
                Bridge { from: (from.row(), from.col()), to: (to.row(), to.col()), count: *count }
            }))
            .collect();
        if draw {
            report.rendering = render(graph, &solution);
        }
    }

    Ok(report)
}

fn print_text(run: &RunReport) {
    let grid = &run.grid;
    println!(
        "Grid {}x{}: {} islands, {} candidate edges, {} crossing pairs",
        grid.width, grid.height, grid.islands, grid.edges, grid.crossings,
    );
    println!();
    println!("{:<15} {:<10} {:<12} Stats", "Strategy", "Status", "Time (s)");
    println!("{}", "=".repeat(70));

    for result in &run.results {
        let time = result.seconds.map_or_else(|| "-".to_string(), |seconds| format!("{seconds:.4}"));
        let detail = match (&result.fault, &result.stats) {
            (Some(fault), _) => format!("fault: {fault}"),
            (None, Some(stats)) => stats.clone(),
            (None, None) => "-".to_string(),
        };
        println!("{:<15} {:<10} {:<12} {}", result.strategy, result.status, time, detail);
    }

    for result in run.results.iter().filter(|result| !result.rendering.is_empty()) {
        println!();
        println!("{}:", result.strategy);
        for line in &result.rendering {
            println!("  {line}");
        }
    }
}
