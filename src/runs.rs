//! Ranked result lists per system and query.
//!
//! Each system's results come from one file. The order of rows in that
//! file is the system's ranking; the rank and score columns are carried
//! along but never used to re-sort.

use crate::error::{EvalError, Result};
use crate::judgments::{DocumentId, QueryId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// System identifier, taken from the results file name.
pub type SystemId = u32;

/// One row of a system's ranking for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievedDocument {
    /// Retrieved document.
    pub document: DocumentId,
    /// Rank as written by the system.
    pub rank: u32,
    /// Retrieval score as written by the system.
    pub score: f64,
}

impl RetrievedDocument {
    /// Create a new retrieved document row.
    pub fn new(document: DocumentId, rank: u32, score: f64) -> Self {
        Self {
            document,
            rank,
            score,
        }
    }
}

/// All ranked lists produced by one system, keyed by query.
#[derive(Debug, Clone, Default)]
pub struct SystemRun {
    queries: BTreeMap<QueryId, Vec<RetrievedDocument>>,
}

impl SystemRun {
    /// Create an empty run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to the end of a query's ranking.
    pub fn push(&mut self, query: QueryId, row: RetrievedDocument) {
        self.queries.entry(query).or_default().push(row);
    }

    /// Register a query with an empty ranking.
    pub fn add_query(&mut self, query: QueryId) {
        self.queries.entry(query).or_default();
    }

    /// Ranking for a query, if the system produced one.
    pub fn results_for(&self, query: QueryId) -> Option<&[RetrievedDocument]> {
        self.queries.get(&query).map(Vec::as_slice)
    }

    /// Queries this system answered, ascending.
    pub fn query_ids(&self) -> impl Iterator<Item = QueryId> + '_ {
        self.queries.keys().copied()
    }

    /// Number of queries answered.
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// Total number of result rows across all queries.
    pub fn row_count(&self) -> usize {
        self.queries.values().map(Vec::len).sum()
    }
}

/// Runs for every system under evaluation.
#[derive(Debug, Clone, Default)]
pub struct RankedRuns {
    systems: BTreeMap<SystemId, SystemRun>,
}

impl RankedRuns {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system's run. Returns the run it replaced, if any.
    pub fn insert(&mut self, system: SystemId, run: SystemRun) -> Option<SystemRun> {
        self.systems.insert(system, run)
    }

    /// Ranking of one system for one query.
    ///
    /// An empty ranking is returned as an empty slice; a system that never
    /// mentioned the query is an error.
    pub fn results_for(&self, system: SystemId, query: QueryId) -> Result<&[RetrievedDocument]> {
        self.systems
            .get(&system)
            .and_then(|run| run.results_for(query))
            .ok_or(EvalError::MissingRun { system, query })
    }

    /// A system's full run.
    pub fn system(&self, system: SystemId) -> Option<&SystemRun> {
        self.systems.get(&system)
    }

    /// System IDs, ascending.
    pub fn system_ids(&self) -> impl Iterator<Item = SystemId> + '_ {
        self.systems.keys().copied()
    }

    /// Systems and their runs, ascending by ID.
    pub fn iter(&self) -> impl Iterator<Item = (SystemId, &SystemRun)> {
        self.systems.iter().map(|(id, run)| (*id, run))
    }

    /// Number of systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Check if no system was loaded.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

/// Derive the system ID from the trailing digits of a file stem,
/// e.g. `S3.results` is system 3.
pub fn system_id_from_path(path: &Path) -> Result<SystemId> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| EvalError::InvalidSystemName(path.to_path_buf()))?;

    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(stem.len(), |(i, _)| i);

    stem[digits_start..]
        .parse()
        .map_err(|_| EvalError::InvalidSystemName(path.to_path_buf()))
}

/// Parse one system's results.
///
/// Each line is `queryID <ignored> documentID rank score`, optionally
/// followed by a run tag. Rows are grouped by query in file order.
/// `origin` is only used to label errors.
pub fn parse_results(content: &str, origin: &Path) -> Result<SystemRun> {
    let mut run = SystemRun::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 5 && fields.len() != 6 {
            return Err(EvalError::malformed(
                origin,
                line_no,
                format!("expected 5 or 6 fields, found {}", fields.len()),
            ));
        }

        let query: QueryId = parse_field(fields[0], "query ID", origin, line_no)?;
        let document: DocumentId = parse_field(fields[2], "document ID", origin, line_no)?;
        let rank: u32 = parse_field(fields[3], "rank", origin, line_no)?;
        let score: f64 = parse_field(fields[4], "score", origin, line_no)?;

        run.push(query, RetrievedDocument::new(document, rank, score));
    }

    Ok(run)
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    name: &str,
    origin: &Path,
    line_no: usize,
) -> Result<T> {
    raw.parse()
        .map_err(|_| EvalError::malformed(origin, line_no, format!("invalid {name} '{raw}'")))
}

/// Load a single results file, returning its system ID and run.
pub fn load_results_file(path: &Path) -> Result<(SystemId, SystemRun)> {
    let system = system_id_from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    let run = parse_results(&content, path)?;

    debug!(
        path = %path.display(),
        system,
        queries = run.query_count(),
        rows = run.row_count(),
        "loaded results file"
    );
    Ok((system, run))
}

/// Load every `*.{extension}` file directly inside `dir`.
///
/// Files are read in name order. Any malformed file aborts the load.
pub fn load_results_dir(dir: &Path, extension: &str) -> Result<RankedRuns> {
    if !dir.is_dir() {
        return Err(EvalError::ResultsDirNotFound(dir.to_path_buf()));
    }

    let mut runs = RankedRuns::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| EvalError::io(dir, e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(extension)
        {
            continue;
        }

        let (system, run) = load_results_file(path)?;
        if runs.insert(system, run).is_some() {
            return Err(EvalError::Config(format!(
                "more than one results file maps to system S{system} (last: '{}')",
                path.display()
            )));
        }
    }

    if runs.is_empty() {
        return Err(EvalError::NoResultsFiles(dir.to_path_buf()));
    }

    info!(dir = %dir.display(), systems = runs.len(), "loaded system runs");
    Ok(runs)
}
