//! Persistence layer for saving/loading evaluation results.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.
//! Saved results keep the per-query undefined flags, so later analysis can
//! drop queries without relevant documents.

use crate::error::{EvalError, Result};
use crate::report::Evaluation;
use std::fs;
use std::path::Path;

/// Save format for evaluation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json, // Default to JSON
        }
    }
}

/// Save an evaluation to a file.
pub fn save_evaluation(evaluation: &Evaluation, path: &Path) -> Result<()> {
    let format = SaveFormat::from_path(path);
    save_evaluation_with_format(evaluation, path, format)
}

/// Save an evaluation with specific format.
pub fn save_evaluation_with_format(
    evaluation: &Evaluation,
    path: &Path,
    format: SaveFormat,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
        }
    }

    let data = match format {
        SaveFormat::Json => serde_json::to_string_pretty(evaluation)?.into_bytes(),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::encode_to_vec(evaluation, config)
                .map_err(|e| EvalError::Serialization(e.to_string()))?
        }
    };

    fs::write(path, &data).map_err(|e| EvalError::io(path, e))?;

    Ok(())
}

/// Load an evaluation from a file.
pub fn load_evaluation(path: &Path) -> Result<Evaluation> {
    if !path.is_file() {
        return Err(EvalError::ReportNotFound(path.to_path_buf()));
    }

    let format = SaveFormat::from_path(path);
    load_evaluation_with_format(path, format)
}

/// Load an evaluation with specific format.
pub fn load_evaluation_with_format(path: &Path, format: SaveFormat) -> Result<Evaluation> {
    let data = fs::read(path).map_err(|e| EvalError::io(path, e))?;

    let evaluation = match format {
        SaveFormat::Json => serde_json::from_slice(&data)?,
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (evaluation, _): (Evaluation, usize) = bincode::decode_from_slice(&data, config)
                .map_err(|e| EvalError::Serialization(e.to_string()))?;
            evaluation
        }
    };

    Ok(evaluation)
}
