//! Ordered column schema with named insert/project operations.
//!
//! Every stage validates its expected input columns by name and derives
//! its output schema through anchored insertions, so column positions are
//! never hand-counted anywhere in the pipeline.

use crate::error::{PipelineError, Result};

/// Where a derived column lands relative to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Before(&'static str),
    After(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSchema {
            columns: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a column a stage cannot work without.
    pub fn require(&self, stage: &'static str, name: &str) -> Result<usize> {
        self.position(name).ok_or_else(|| PipelineError::Schema {
            stage,
            column: name.to_string(),
        })
    }

    /// Insert a new column relative to an anchor column. Returns the index
    /// the column (and every row cell) was inserted at.
    pub fn insert(&mut self, stage: &'static str, anchor: Anchor, name: &str) -> Result<usize> {
        let index = match anchor {
            Anchor::Before(target) => self.require(stage, target)?,
            Anchor::After(target) => self.require(stage, target)? + 1,
        };
        self.columns.insert(index, name.to_string());
        Ok(index)
    }

    /// Schema restricted to `keep`, in `keep` order, together with the
    /// source index of every retained column.
    pub fn project(&self, stage: &'static str, keep: &[String]) -> Result<(ColumnSchema, Vec<usize>)> {
        let mut indices = Vec::with_capacity(keep.len());
        for name in keep {
            let index = self.position(name).ok_or_else(|| PipelineError::ColumnRange {
                stage,
                column: name.clone(),
            })?;
            indices.push(index);
        }
        Ok((ColumnSchema::new(keep.iter().cloned()), indices))
    }
}
