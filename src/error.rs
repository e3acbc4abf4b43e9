use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pipeline stages and the shard store.
///
/// Missing-column conditions are fatal and name the offending stage and
/// column. A shard that cannot be decoded is reported as `Encoding`; the
/// stages recover from it by skipping the shard, everything else aborts
/// the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage}: required column `{column}` not found")]
    Schema { stage: &'static str, column: String },

    #[error("{stage}: column `{column}` is not part of the input table")]
    ColumnRange { stage: &'static str, column: String },

    #[error("{path}: record {record} has {found} cells, header has {expected}")]
    MalformedTable {
        path: PathBuf,
        record: usize,
        found: usize,
        expected: usize,
    },

    #[error("{path}: not valid UTF-8")]
    Encoding { path: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
