//! RFC 1918 address classification for the source and destination columns.

use crate::error::Result;
use crate::schema::Anchor;
use crate::stages::map_shards;
use crate::store::{Shard, ShardStore};

const STAGE: &str = "classify_ip";
const OUT_DIR: &str = "classified_logs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    Private,
    Global,
    Empty,
}

impl AddressClass {
    pub fn label(self) -> &'static str {
        match self {
            AddressClass::Private => "private",
            AddressClass::Global => "global",
            AddressClass::Empty => "",
        }
    }
}

/// Classify a dotted-quad address. Extraction upstream guarantees either a
/// well-formed address or emptiness; anything malformed that still reaches
/// this point is deliberately labelled `global`, the conservative reading
/// for a perimeter log (an address we cannot place inside the private
/// ranges is treated as outside).
pub fn classify_address(ip: &str) -> AddressClass {
    if ip.trim().is_empty() {
        return AddressClass::Empty;
    }
    if is_private(ip) {
        AddressClass::Private
    } else {
        AddressClass::Global
    }
}

/// 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16.
fn is_private(ip: &str) -> bool {
    let mut octets = [0u8; 4];
    let mut parts = ip.split('.');
    for slot in &mut octets {
        match parts.next().and_then(|p| p.parse::<u8>().ok()) {
            Some(v) => *slot = v,
            None => return false,
        }
    }
    if parts.next().is_some() {
        return false;
    }
    match octets {
        [10, ..] => true,
        [172, b, ..] => (16..=31).contains(&b),
        [192, 168, ..] => true,
        _ => false,
    }
}

/// Add `srcIP_type` and `dstIP_type`, each inserted immediately after its
/// own address column so the pair reads `srcIP, srcIP_type, dstIP,
/// dstIP_type` in the output.
pub fn classify_ips(store: &ShardStore, shards: &[Shard]) -> Result<Vec<Shard>> {
    map_shards(shards, |shard| {
        let Some(mut table) = store.try_read(shard)? else {
            return Ok(None);
        };
        table.schema.require(STAGE, "srcIP")?;
        table.schema.require(STAGE, "dstIP")?;
        let src_type_at = table.schema.insert(STAGE, Anchor::After("srcIP"), "srcIP_type")?;
        let dst_type_at = table.schema.insert(STAGE, Anchor::After("dstIP"), "dstIP_type")?;
        let src_at = src_type_at - 1;
        // dstIP sits one past srcIP_type once that is in place.
        let dst_at = dst_type_at - 1;
        for row in &mut table.rows {
            let src_class = classify_address(&row[src_at]);
            row.insert(src_type_at, src_class.label().to_string());
            let dst_class = classify_address(&row[dst_at]);
            row.insert(dst_type_at, dst_class.label().to_string());
        }
        store.write(OUT_DIR, shard.name(), &table).map(Some)
    })
}
