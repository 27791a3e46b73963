//! IR Evaluator - ranking-quality metrics for retrieval systems.
//!
//! Given graded relevance judgments per query and, for each system, a
//! ranked result list per query, this library computes Precision@k,
//! Recall@k, r-Precision, Average Precision and nDCG@k per query and the
//! per-system means.
//!
//! # Quick Start
//!
//! ```no_run
//! use ir_evaluator::{
//!     config::EvalConfig,
//!     judgments::load_qrels,
//!     report::evaluate,
//!     runs::load_results_dir,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = EvalConfig::load()?;
//!     config.validate()?;
//!
//!     // Load phase: both stores are read-only afterwards
//!     let store = load_qrels(&config.paths.qrels)?;
//!     let runs = load_results_dir(&config.paths.results_dir, &config.paths.results_extension)?;
//!
//!     let evaluation = evaluate(&store, &runs, &config.cutoffs)?;
//!     evaluation.write_reports(&config.paths.output_dir)?;
//!
//!     print!("{}", evaluation.render_summary_table());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **RelevanceStore**: graded judgments per query ([`judgments`])
//! - **RankedRuns**: ranked result lists per system and query ([`runs`])
//! - **Metrics**: pure per-query metric functions ([`metrics`])
//! - **Evaluation**: per-system rows, means and report tables ([`report`])

pub mod config;
pub mod error;
pub mod judgments;
pub mod metrics;
pub mod persistence;
pub mod report;
pub mod runs;

// Re-export commonly used types
pub use config::{Cutoffs, EvalConfig};
pub use error::{EvalError, Result};
pub use judgments::{DocumentId, Grade, QueryId, RelevanceStore, load_qrels};
pub use metrics::{MetricValue, QueryMetrics};
pub use persistence::{load_evaluation, save_evaluation};
pub use report::{Evaluation, MetricSummary, SystemReport, evaluate};
pub use runs::{RankedRuns, RetrievedDocument, SystemId, SystemRun, load_results_dir};
