//! The row-set-to-row-set operators, one module per stage.

pub mod classify;
pub mod extract;
pub mod keyword;
pub mod merge;
pub mod project;
pub mod severity;
pub mod split;

use crate::error::Result;
use crate::store::Shard;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Transform shards independently, in input order. Stages that emit no
/// output for a shard return `None` for it. Shard work is independent and
/// every worker writes to its own output file, so this is safe to fan out.
#[cfg(feature = "rayon")]
pub(crate) fn map_shards<F>(shards: &[Shard], f: F) -> Result<Vec<Shard>>
where
    F: Fn(&Shard) -> Result<Option<Shard>> + Sync,
{
    let out: Vec<Option<Shard>> = shards.par_iter().map(&f).collect::<Result<_>>()?;
    Ok(out.into_iter().flatten().collect())
}

#[cfg(not(feature = "rayon"))]
pub(crate) fn map_shards<F>(shards: &[Shard], f: F) -> Result<Vec<Shard>>
where
    F: Fn(&Shard) -> Result<Option<Shard>>,
{
    let mut out = Vec::new();
    for shard in shards {
        if let Some(produced) = f(shard)? {
            out.push(produced);
        }
    }
    Ok(out)
}
