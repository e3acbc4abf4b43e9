use std::path::PathBuf;

use config::Config;
use serde::Deserialize;

/// Runtime knobs, overridable through `SYSLOG_*` environment variables
/// (e.g. `SYSLOG_KEYWORD=RT_SCREEN`, `SYSLOG_SEVERITY=WARNING`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Substring the keyword filter looks for in `Message`.
    pub keyword: String,
    /// Severity value the final filter keeps.
    pub severity: String,
    /// Maximum rows per shard after merging. Kept well below the
    /// spreadsheet per-sheet ceiling (1,048,576) to leave headroom.
    pub row_budget: usize,
    /// Merge the final filter's output into a single shard, or keep one
    /// output shard per input shard.
    pub merge_output: bool,
    /// Columns retained by the early projection stage.
    pub keep_columns: Vec<String>,
    /// Delete source tables once they have been filtered, like the
    /// original appliance workflow. Off by default.
    pub retire_sources: bool,
    pub source_dir: PathBuf,
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            keyword: "RT_IDP_ATTACK".to_string(),
            severity: "CRITICAL".to_string(),
            row_budget: 800_000,
            merge_output: true,
            keep_columns: ["Timestamp", "Hostname", "AppName", "Message"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            retire_sources: false,
            source_dir: PathBuf::from("source_logs"),
            work_dir: PathBuf::from("work"),
            output_dir: PathBuf::from("final_output"),
        }
    }
}

pub fn load() -> Settings {
    Config::builder()
        .add_source(config::Environment::with_prefix("SYSLOG"))
        .build()
        .and_then(Config::try_deserialize)
        .unwrap_or_default()
}
