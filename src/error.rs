//! Error types for the evaluator.

use crate::judgments::QueryId;
use crate::runs::SystemId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while loading inputs or evaluating runs.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A results or judgments line does not have the expected shape.
    #[error("Malformed line {line} in '{path}': {reason}")]
    MalformedLine {
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        reason: String,
    },

    /// A query has a run but was never judged.
    #[error("Query {0} has no relevance judgments")]
    MissingQuery(QueryId),

    /// A judged query has no results from a system.
    #[error("System S{system} produced no results for query {query}")]
    MissingRun { system: SystemId, query: QueryId },

    /// Cutoff-based metrics need k >= 1.
    #[error("Invalid cutoff k={0}: cutoffs must be at least 1")]
    InvalidCutoff(usize),

    /// The results file name does not end in a numeric system ID.
    #[error("Cannot derive a system ID from results file '{0}'")]
    InvalidSystemName(PathBuf),

    /// The results directory does not exist or is not a directory.
    #[error("Results path '{0}' does not exist or is not a directory")]
    ResultsDirNotFound(PathBuf),

    /// No results files found in the results directory.
    #[error("No results files found in '{0}'")]
    NoResultsFiles(PathBuf),

    /// The judgments file does not exist.
    #[error("Judgments file not found at '{0}'")]
    JudgmentsNotFound(PathBuf),

    /// The saved report does not exist.
    #[error("Report file not found at '{0}'")]
    ReportNotFound(PathBuf),

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed-line error. `line` is 1-based.
    pub fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}
