//! IR Evaluator CLI
//!
//! Scores ranked retrieval runs against graded relevance judgments.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ir_evaluator::{
    config::EvalConfig,
    judgments::load_qrels,
    persistence::{load_evaluation, save_evaluation},
    report::{Evaluation, evaluate},
    runs::load_results_dir,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// IR Evaluator - ranking-quality metrics for retrieval systems
#[derive(Parser)]
#[command(name = "ir-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every system and write the .eval reports
    Evaluate {
        /// Directory containing one results file per system
        #[arg(short, long)]
        results_dir: Option<PathBuf>,

        /// Relevance judgments file
        #[arg(short, long)]
        qrels: Option<PathBuf>,

        /// Directory for the .eval reports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also save the full evaluation (.json or .bin)
        #[arg(long)]
        save: Option<PathBuf>,

        /// Cutoff for Precision@k
        #[arg(long)]
        precision_k: Option<usize>,

        /// Cutoff for Recall@k
        #[arg(long)]
        recall_k: Option<usize>,

        /// Cutoffs for nDCG@k, comma-separated
        #[arg(long, value_delimiter = ',')]
        ndcg_k: Option<Vec<usize>>,
    },

    /// Display the summary of a saved evaluation
    Show {
        /// Path to a saved evaluation (.json or .bin)
        report: PathBuf,

        /// Average only over queries where each metric is defined
        #[arg(long)]
        defined_only: bool,
    },

    /// Load the inputs and show what they contain
    Info {
        /// Directory containing one results file per system
        #[arg(short, long)]
        results_dir: Option<PathBuf>,

        /// Relevance judgments file
        #[arg(short, long)]
        qrels: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Evaluate {
            results_dir,
            qrels,
            output_dir,
            save,
            precision_k,
            recall_k,
            ndcg_k,
        } => {
            let mut config = EvalConfig::load().context("Failed to load configuration")?;
            if let Some(dir) = results_dir {
                config.paths.results_dir = dir;
            }
            if let Some(qrels) = qrels {
                config.paths.qrels = qrels;
            }
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }
            if let Some(k) = precision_k {
                config.cutoffs.precision = k;
            }
            if let Some(k) = recall_k {
                config.cutoffs.recall = k;
            }
            if let Some(ks) = ndcg_k {
                config.cutoffs.ndcg = ks;
            }
            cmd_evaluate(config, save)
        }
        Commands::Show {
            report,
            defined_only,
        } => cmd_show(report, defined_only),
        Commands::Info { results_dir, qrels } => {
            let mut config = EvalConfig::load().context("Failed to load configuration")?;
            if let Some(dir) = results_dir {
                config.paths.results_dir = dir;
            }
            if let Some(qrels) = qrels {
                config.paths.qrels = qrels;
            }
            cmd_info(config)
        }
    }
}

fn cmd_evaluate(config: EvalConfig, save: Option<PathBuf>) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let start = Instant::now();

    let store = load_qrels(&config.paths.qrels).context("Failed to load relevance judgments")?;
    let runs = load_results_dir(&config.paths.results_dir, &config.paths.results_extension)
        .context("Failed to load system results")?;

    println!(
        "Evaluating {} systems on {} queries...",
        runs.len(),
        store.len()
    );

    let evaluation = evaluate(&store, &runs, &config.cutoffs).context("Evaluation failed")?;

    let written = evaluation
        .write_reports(&config.paths.output_dir)
        .context("Failed to write reports")?;

    println!();
    print!("{}", evaluation.render_summary_table());
    println!();
    print_undefined_counts(&evaluation);

    println!(
        "Wrote {} reports to {} in {:.2?}",
        written.len(),
        config.paths.output_dir.display(),
        start.elapsed()
    );

    if let Some(path) = save {
        save_evaluation(&evaluation, &path).context("Failed to save evaluation")?;
        println!("Evaluation saved to: {}", path.display());
    }

    Ok(())
}

fn cmd_show(path: PathBuf, defined_only: bool) -> Result<()> {
    let evaluation = load_evaluation(&path).context("Failed to load evaluation")?;

    if defined_only {
        print!("{}", evaluation.render_defined_summary_table());
    } else {
        print!("{}", evaluation.render_summary_table());
    }

    println!();
    print_undefined_counts(&evaluation);
    Ok(())
}

fn cmd_info(config: EvalConfig) -> Result<()> {
    let store = load_qrels(&config.paths.qrels).context("Failed to load relevance judgments")?;
    let runs = load_results_dir(&config.paths.results_dir, &config.paths.results_extension)
        .context("Failed to load system results")?;

    let without_relevant = store
        .query_ids()
        .filter(|q| matches!(store.num_relevant(*q), Ok(0)))
        .count();

    println!("Evaluation Inputs");
    println!("{}", "─".repeat(40));
    println!("  Judgments:      {}", config.paths.qrels.display());
    println!("  Queries:        {}", store.len());
    println!("  Judged docs:    {}", store.judgment_count());
    println!("  No relevant:    {}", without_relevant);
    println!("  Results dir:    {}", config.paths.results_dir.display());
    println!("  Systems:        {}", runs.len());

    for (system, run) in runs.iter() {
        let missing = store
            .query_ids()
            .filter(|q| run.results_for(*q).is_none())
            .count();
        println!(
            "    S{:<4} {:>4} queries, {:>6} rows, {} judged queries missing",
            system,
            run.query_count(),
            run.row_count(),
            missing
        );
    }

    Ok(())
}

fn print_undefined_counts(evaluation: &Evaluation) {
    for report in &evaluation.systems {
        let undefined = report.undefined_rows();
        if undefined > 0 {
            println!(
                "{}: {} of {} queries have no relevant documents (reported as 0.0)",
                report.label(),
                undefined,
                report.rows.len()
            );
        }
    }
}
