//! Configuration for the evaluator.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{EvalError, Result};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Metric cutoffs used for every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Cutoffs {
    /// k for Precision@k.
    #[serde(default = "default_precision_k")]
    pub precision: usize,

    /// k for Recall@k.
    #[serde(default = "default_recall_k")]
    pub recall: usize,

    /// One nDCG@k column per entry, in this order.
    #[serde(default = "default_ndcg_k")]
    pub ndcg: Vec<usize>,
}

fn default_precision_k() -> usize {
    10
}

fn default_recall_k() -> usize {
    50
}

fn default_ndcg_k() -> Vec<usize> {
    vec![10, 20]
}

impl Default for Cutoffs {
    fn default() -> Self {
        Self {
            precision: default_precision_k(),
            recall: default_recall_k(),
            ndcg: default_ndcg_k(),
        }
    }
}

impl Cutoffs {
    /// Report column names, e.g. `P@10`, `R@50`, `r-Precision`, `AP`, `nDCG@10`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![
            format!("P@{}", self.precision),
            format!("R@{}", self.recall),
            "r-Precision".to_string(),
            "AP".to_string(),
        ];
        names.extend(self.ndcg.iter().map(|k| format!("nDCG@{k}")));
        names
    }

    /// Reject zero cutoffs and an empty nDCG list.
    pub fn validate(&self) -> Result<()> {
        if self.precision == 0 || self.recall == 0 || self.ndcg.contains(&0) {
            return Err(EvalError::Config(
                "Metric cutoffs must be at least 1.".to_string(),
            ));
        }

        if self.ndcg.is_empty() {
            return Err(EvalError::Config(
                "At least one nDCG cutoff is required. Set IR_EVAL_NDCG_K or add cutoffs.ndcg to config file.".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a comma-separated cutoff list such as `10,20`.
pub fn parse_cutoff_list(raw: &str) -> Option<Vec<usize>> {
    raw.split(',')
        .map(|part| part.trim().parse().ok())
        .collect()
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding one results file per system.
    pub results_dir: PathBuf,

    /// Extension (without dot) identifying results files.
    pub results_extension: String,

    /// Judgments file.
    pub qrels: PathBuf,

    /// Directory receiving the `.eval` reports.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("systems"),
            results_extension: "results".to_string(),
            qrels: PathBuf::from("systems/qrels.txt"),
            output_dir: PathBuf::from("eval_out"),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvalConfig {
    /// Metric cutoffs
    pub cutoffs: Cutoffs,
    /// File locations
    pub paths: PathsConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    cutoffs: Option<CutoffsFileSection>,
    paths: Option<PathsFileSection>,
}

#[derive(Debug, Deserialize)]
struct CutoffsFileSection {
    precision: Option<usize>,
    recall: Option<usize>,
    ndcg: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct PathsFileSection {
    results_dir: Option<PathBuf>,
    results_extension: Option<String>,
    qrels: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

impl EvalConfig {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (IR_EVAL_RESULTS_DIR, IR_EVAL_QRELS, IR_EVAL_PRECISION_K, ...)
    /// 2. Config file (~/.config/ir-evaluator/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = EvalConfig::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("IR_EVAL_RESULTS_DIR") {
            self.paths.results_dir = PathBuf::from(dir);
        }

        if let Ok(qrels) = env::var("IR_EVAL_QRELS") {
            self.paths.qrels = PathBuf::from(qrels);
        }

        if let Ok(dir) = env::var("IR_EVAL_OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(dir);
        }

        if let Ok(k) = env::var("IR_EVAL_PRECISION_K") {
            if let Ok(k) = k.parse() {
                self.cutoffs.precision = k;
            }
        }

        if let Ok(k) = env::var("IR_EVAL_RECALL_K") {
            if let Ok(k) = k.parse() {
                self.cutoffs.recall = k;
            }
        }

        if let Ok(list) = env::var("IR_EVAL_NDCG_K") {
            if let Some(ks) = parse_cutoff_list(&list) {
                self.cutoffs.ndcg = ks;
            }
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Build a configuration from YAML text, filling gaps with defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = EvalConfig::default();

        if let Some(cutoffs) = file_config.cutoffs {
            if let Some(k) = cutoffs.precision {
                config.cutoffs.precision = k;
            }
            if let Some(k) = cutoffs.recall {
                config.cutoffs.recall = k;
            }
            if let Some(ks) = cutoffs.ndcg {
                config.cutoffs.ndcg = ks;
            }
        }

        if let Some(paths) = file_config.paths {
            if let Some(dir) = paths.results_dir {
                config.paths.results_dir = dir;
            }
            if let Some(ext) = paths.results_extension {
                config.paths.results_extension = ext;
            }
            if let Some(qrels) = paths.qrels {
                config.paths.qrels = qrels;
            }
            if let Some(dir) = paths.output_dir {
                config.paths.output_dir = dir;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ir-evaluator")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate cutoffs and paths.
    pub fn validate(&self) -> Result<()> {
        self.cutoffs.validate()?;

        if self.paths.results_dir.as_os_str().is_empty() {
            return Err(EvalError::Config(
                "Results directory is required. Set IR_EVAL_RESULTS_DIR environment variable or add to config file.".to_string()
            ));
        }

        if self.paths.qrels.as_os_str().is_empty() {
            return Err(EvalError::Config(
                "Judgments file is required. Set IR_EVAL_QRELS environment variable or add to config file.".to_string()
            ));
        }

        if self.paths.output_dir.as_os_str().is_empty() {
            return Err(EvalError::Config(
                "Output directory is required. Set IR_EVAL_OUTPUT_DIR environment variable or add to config file.".to_string()
            ));
        }

        if self.paths.results_extension.is_empty() {
            return Err(EvalError::Config(
                "Results file extension must not be empty.".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.cutoffs.precision, 10);
        assert_eq!(config.cutoffs.recall, 50);
        assert_eq!(config.cutoffs.ndcg, vec![10, 20]);
        assert_eq!(config.paths.results_dir, PathBuf::from("systems"));
        assert_eq!(config.paths.output_dir, PathBuf::from("eval_out"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_column_names() {
        let names = Cutoffs::default().column_names();
        assert_eq!(
            names,
            vec!["P@10", "R@50", "r-Precision", "AP", "nDCG@10", "nDCG@20"]
        );
    }

    #[test]
    fn test_validate_rejects_zero_cutoff() {
        let mut config = EvalConfig::default();
        config.cutoffs.recall = 0;
        assert!(config.validate().is_err());

        let mut config = EvalConfig::default();
        config.cutoffs.ndcg = vec![10, 0];
        assert!(config.validate().is_err());

        let mut config = EvalConfig::default();
        config.cutoffs.ndcg.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let mut config = EvalConfig::default();
        config.paths.output_dir = PathBuf::new();
        assert!(matches!(config.validate(), Err(EvalError::Config(_))));

        let mut config = EvalConfig::default();
        config.paths.qrels = PathBuf::new();
        assert!(config.validate().is_err());

        let mut config = EvalConfig::default();
        config.paths.results_extension.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EvalConfig::from_yaml("cutoffs:\n  precision: 5\n  ndcg: [5]\n").unwrap();
        assert_eq!(config.cutoffs.precision, 5);
        assert_eq!(config.cutoffs.recall, 50);
        assert_eq!(config.cutoffs.ndcg, vec![5]);
        assert_eq!(config.paths.qrels, PathBuf::from("systems/qrels.txt"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "paths:\n  results_dir: runs\n  results_extension: txt\n  output_dir: out\n",
        )
        .unwrap();

        let config = EvalConfig::load_from_file(&path).unwrap();
        assert_eq!(config.paths.results_dir, PathBuf::from("runs"));
        assert_eq!(config.paths.results_extension, "txt");
        assert_eq!(config.paths.output_dir, PathBuf::from("out"));
        assert_eq!(config.cutoffs, Cutoffs::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            EvalConfig::from_yaml("cutoffs: [not, a, map]"),
            Err(EvalError::Config(_))
        ));
    }

    #[test]
    fn test_parse_cutoff_list() {
        assert_eq!(parse_cutoff_list("10,20"), Some(vec![10, 20]));
        assert_eq!(parse_cutoff_list(" 5 , 15 "), Some(vec![5, 15]));
        assert_eq!(parse_cutoff_list("10,x"), None);
    }
}
