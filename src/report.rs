//! Per-system evaluation and tab-separated report rendering.
//!
//! Every system is evaluated on every judged query, in ascending ID order,
//! so identical inputs always produce identical reports.

use crate::config::Cutoffs;
use crate::error::{EvalError, Result};
use crate::judgments::RelevanceStore;
use crate::metrics::{MetricValue, QueryMetrics};
use crate::runs::{RankedRuns, SystemId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the cross-system summary file.
pub const SUMMARY_FILENAME: &str = "All.eval";

/// Aggregate of one metric column over a system's queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct MetricSummary {
    /// Arithmetic mean over all queries, undefined values counted as 0.0.
    pub mean: f64,
    /// Mean over the queries where the value was defined.
    pub defined_mean: Option<f64>,
    /// Number of queries where the value was undefined.
    pub undefined_count: usize,
}

impl MetricSummary {
    /// Summarise one column of values.
    pub fn from_values(values: &[MetricValue]) -> Self {
        let defined: Vec<f64> = values
            .iter()
            .filter(|v| !v.is_undefined())
            .map(|v| v.value)
            .collect();

        let mean = if values.is_empty() {
            0.0
        } else {
            values.iter().map(|v| v.value).sum::<f64>() / values.len() as f64
        };

        let defined_mean = if defined.is_empty() {
            None
        } else {
            Some(defined.iter().sum::<f64>() / defined.len() as f64)
        };

        Self {
            mean,
            defined_mean,
            undefined_count: values.len() - defined.len(),
        }
    }
}

/// All per-query rows and column summaries for one system.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SystemReport {
    /// System ID.
    pub system: SystemId,
    /// One row per judged query, ascending by query ID.
    pub rows: Vec<QueryMetrics>,
    /// One summary per report column.
    pub summary: Vec<MetricSummary>,
}

impl SystemReport {
    /// Build a report from computed rows.
    pub fn from_rows(system: SystemId, rows: Vec<QueryMetrics>, columns: usize) -> Self {
        let summary = (0..columns)
            .map(|col| {
                let column: Vec<MetricValue> = rows
                    .iter()
                    .filter_map(|row| row.values().get(col).copied())
                    .collect();
                MetricSummary::from_values(&column)
            })
            .collect();

        Self {
            system,
            rows,
            summary,
        }
    }

    /// Label used in reports, e.g. `S1`.
    pub fn label(&self) -> String {
        format!("S{}", self.system)
    }

    /// Mean of each column, undefined values counted as 0.0.
    pub fn means(&self) -> Vec<f64> {
        self.summary.iter().map(|s| s.mean).collect()
    }

    /// Number of rows with at least one undefined value.
    pub fn undefined_rows(&self) -> usize {
        self.rows.iter().filter(|row| row.has_undefined()).count()
    }

    /// Report file name, e.g. `S1.eval`.
    pub fn filename(&self) -> String {
        format!("{}.eval", self.label())
    }
}

/// Results of evaluating every system.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Evaluation {
    /// Cutoffs the values were computed with.
    pub cutoffs: Cutoffs,
    /// One report per system, ascending by system ID.
    pub systems: Vec<SystemReport>,
}

impl Evaluation {
    /// Report for a single system.
    pub fn system(&self, system: SystemId) -> Option<&SystemReport> {
        self.systems.iter().find(|r| r.system == system)
    }

    fn header(&self) -> String {
        let mut header = String::new();
        for name in self.cutoffs.column_names() {
            header.push('\t');
            header.push_str(&name);
        }
        header.push('\n');
        header
    }

    /// Per-query table for one system, ending with a `mean` row.
    pub fn render_system_table(&self, report: &SystemReport) -> String {
        let mut out = self.header();
        for row in &report.rows {
            let values: Vec<f64> = row.values().iter().map(|v| v.value).collect();
            push_row(&mut out, &row.query.to_string(), &values);
        }
        push_row(&mut out, "mean", &report.means());
        out
    }

    /// One row of means per system.
    pub fn render_summary_table(&self) -> String {
        let mut out = self.header();
        for report in &self.systems {
            push_row(&mut out, &report.label(), &report.means());
        }
        out
    }

    /// Summary table of defined-only means, `-` where a column had no
    /// defined value.
    pub fn render_defined_summary_table(&self) -> String {
        let mut out = self.header();
        for report in &self.systems {
            out.push_str(&report.label());
            for summary in &report.summary {
                // Writing to a String cannot fail.
                let _ = match summary.defined_mean {
                    Some(mean) => write!(out, "\t{mean:.3}"),
                    None => write!(out, "\t-"),
                };
            }
            out.push('\n');
        }
        out
    }

    /// Write `S{id}.eval` for every system and `All.eval` into `dir`.
    ///
    /// Every table is rendered and written to a `.tmp` sibling first. If any
    /// of those writes fails, the temporaries are removed and the existing
    /// reports in `dir` are left untouched. The temporaries are then renamed
    /// into place with the summary last, so a failed rename can leave some
    /// system files updated but never a fresh `All.eval` next to stale
    /// system files.
    ///
    /// Returns the written paths, summary last.
    pub fn write_reports(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|e| EvalError::io(dir, e))?;

        let mut files: Vec<(PathBuf, String)> = self
            .systems
            .iter()
            .map(|report| (dir.join(report.filename()), self.render_system_table(report)))
            .collect();
        files.push((dir.join(SUMMARY_FILENAME), self.render_summary_table()));

        let mut staged = Vec::with_capacity(files.len());
        for (path, content) in &files {
            let tmp = tmp_path(path);
            if let Err(e) = fs::write(&tmp, content) {
                for (_, written) in &staged {
                    let _ = fs::remove_file(written);
                }
                return Err(EvalError::io(&tmp, e));
            }
            staged.push((path.clone(), tmp));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (path, tmp) in staged {
            fs::rename(&tmp, &path).map_err(|e| EvalError::io(&path, e))?;
            written.push(path);
        }

        info!(dir = %dir.display(), files = written.len(), "wrote evaluation reports");
        Ok(written)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn push_row(out: &mut String, label: &str, values: &[f64]) {
    out.push_str(label);
    for value in values {
        // Writing to a String cannot fail.
        let _ = write!(out, "\t{value:.3}");
    }
    out.push('\n');
}

/// Every judged query must have a run in every system, and every query a
/// system answered must be judged.
fn check_coverage(store: &RelevanceStore, runs: &RankedRuns) -> Result<()> {
    for (system, run) in runs.iter() {
        for query in store.query_ids() {
            if run.results_for(query).is_none() {
                return Err(EvalError::MissingRun { system, query });
            }
        }
        if let Some(query) = run.query_ids().find(|q| !store.contains_query(*q)) {
            return Err(EvalError::MissingQuery(query));
        }
    }
    Ok(())
}

/// Evaluate one system on every judged query.
pub fn evaluate_system(
    store: &RelevanceStore,
    runs: &RankedRuns,
    system: SystemId,
    cutoffs: &Cutoffs,
) -> Result<SystemReport> {
    let rows = store
        .query_ids()
        .map(|query| {
            let results = runs.results_for(system, query)?;
            QueryMetrics::compute(store, query, results, cutoffs)
        })
        .collect::<Result<Vec<_>>>()?;

    let columns = cutoffs.column_names().len();
    Ok(SystemReport::from_rows(system, rows, columns))
}

/// Evaluate every system.
///
/// Coverage is checked up front, so either every report is produced or
/// none is.
pub fn evaluate(store: &RelevanceStore, runs: &RankedRuns, cutoffs: &Cutoffs) -> Result<Evaluation> {
    cutoffs.validate()?;
    check_coverage(store, runs)?;

    for query in store.query_ids() {
        if store.num_relevant(query)? == 0 {
            warn!(query, "query has no relevant documents, its ratio metrics are reported as 0.0");
        }
    }

    let systems = runs
        .system_ids()
        .map(|system| evaluate_system(store, runs, system, cutoffs))
        .collect::<Result<Vec<_>>>()?;

    info!(
        systems = systems.len(),
        queries = store.len(),
        "evaluation complete"
    );

    Ok(Evaluation {
        cutoffs: cutoffs.clone(),
        systems,
    })
}
