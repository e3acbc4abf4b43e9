//! Parameterized field extraction.
//!
//! One operator covers the four derivation stages (routing pair, protocol,
//! severity level, severity): each instance differs only in pattern,
//! destination column and insertion anchor. Extraction is total: a row
//! that does not match contributes the empty string and is never dropped,
//! so row counts are identical on both sides of every instance.

use std::sync::atomic::{AtomicUsize, Ordering};

use regex::Regex;

use crate::error::Result;
use crate::schema::Anchor;
use crate::stages::map_shards;
use crate::store::{Shard, ShardStore};

/// How the capture groups become the destination value.
#[derive(Debug, Clone, Copy)]
enum CaptureShape {
    /// First capture group, verbatim.
    Single,
    /// Two groups joined with a separator; the pattern requires both, so
    /// a half-present pair never yields a partial value.
    PairJoined(&'static str),
}

#[derive(Debug)]
pub struct FieldExtractor {
    stage: &'static str,
    out_dir: &'static str,
    pattern: Regex,
    source: &'static str,
    destination: &'static str,
    anchor: Anchor,
    shape: CaptureShape,
}

impl FieldExtractor {
    /// `"srcIP/port > dstIP/port"` inside `Message`, ports discarded,
    /// stored as `"srcIP > dstIP"` in a `routing` column before `Message`.
    pub fn routing() -> Self {
        FieldExtractor {
            stage: "extract_routing",
            out_dir: "routed_logs",
            pattern: Regex::new(
                r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})/\d+ > (\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})/\d+",
            )
            .unwrap(),
            source: "Message",
            destination: "routing",
            anchor: Anchor::Before("Message"),
            shape: CaptureShape::PairJoined(" > "),
        }
    }

    pub fn protocol() -> Self {
        FieldExtractor {
            stage: "extract_protocol",
            out_dir: "protocol_extracted",
            pattern: Regex::new(r"protocol=(\w+)").unwrap(),
            source: "Message",
            destination: "protocol",
            anchor: Anchor::Before("Message"),
            shape: CaptureShape::Single,
        }
    }

    pub fn severity_level() -> Self {
        FieldExtractor {
            stage: "extract_severity_level",
            out_dir: "severity_level_extracted",
            pattern: Regex::new(r"SeverityLevel=(\d+)").unwrap(),
            source: "Message",
            destination: "SeverityLevel",
            anchor: Anchor::Before("Message"),
            shape: CaptureShape::Single,
        }
    }

    pub fn severity() -> Self {
        FieldExtractor {
            stage: "extract_severity",
            out_dir: "severity_extracted",
            pattern: Regex::new(r"Severity=(\w+)").unwrap(),
            source: "Message",
            destination: "Severity",
            anchor: Anchor::Before("Message"),
            shape: CaptureShape::Single,
        }
    }

    /// Derived value for one source cell; empty string when the pattern
    /// does not match.
    fn value(&self, text: &str) -> String {
        let Some(caps) = self.pattern.captures(text) else {
            return String::new();
        };
        match self.shape {
            CaptureShape::Single => caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            CaptureShape::PairJoined(sep) => match (caps.get(1), caps.get(2)) {
                (Some(a), Some(b)) => format!("{}{}{}", a.as_str(), sep, b.as_str()),
                _ => String::new(),
            },
        }
    }

    /// Run the extraction over an artifact set. Output shards keep their
    /// input names; row counts are preserved per shard.
    pub fn apply(&self, store: &ShardStore, shards: &[Shard]) -> Result<Vec<Shard>> {
        let hits = AtomicUsize::new(0);
        let out = map_shards(shards, |shard| {
            let Some(mut table) = store.try_read(shard)? else {
                return Ok(None);
            };
            let source = table.schema.require(self.stage, self.source)?;
            let insert_at = table.schema.insert(self.stage, self.anchor, self.destination)?;
            for row in &mut table.rows {
                let value = self.value(&row[source]);
                if !value.is_empty() {
                    hits.fetch_add(1, Ordering::Relaxed);
                }
                row.insert(insert_at, value);
            }
            store.write(self.out_dir, shard.name(), &table).map(Some)
        })?;
        let total: usize = out.iter().map(Shard::rows).sum();
        println!(
            "  {}: {} of {} rows matched",
            self.stage,
            hits.into_inner(),
            total
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::schema::ColumnSchema;
    use crate::table::Table;

    fn store() -> (tempfile::TempDir, ShardStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ShardStore::open(dir.path().join("work")).unwrap();
        (dir, store)
    }

    fn message_table(messages: &[&str]) -> Table {
        Table::with_rows(
            ColumnSchema::new(["Timestamp", "Hostname", "AppName", "Message"]),
            messages
                .iter()
                .map(|m| {
                    vec![
                        "2024-05-01T00:00:00".to_string(),
                        "fw1".to_string(),
                        "RT_IDP".to_string(),
                        m.to_string(),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn routing_joins_both_addresses() {
        let e = FieldExtractor::routing();
        assert_eq!(
            e.value("IDP: 10.0.0.5/1111 > 8.8.8.8/53 inline tcp"),
            "10.0.0.5 > 8.8.8.8"
        );
    }

    #[test]
    fn routing_half_pair_is_empty() {
        let e = FieldExtractor::routing();
        assert_eq!(e.value("only a source 10.0.0.5/1111 and no arrow"), "");
        assert_eq!(e.value("10.0.0.5/1111 > garbage"), "");
    }

    #[test]
    fn protocol_severity_and_level_values() {
        assert_eq!(FieldExtractor::protocol().value("x protocol=udp y"), "udp");
        assert_eq!(
            FieldExtractor::severity_level().value("SeverityLevel=3 rest"),
            "3"
        );
        assert_eq!(
            FieldExtractor::severity().value("Severity=WARNING rest"),
            "WARNING"
        );
    }

    #[test]
    fn inserts_before_message_and_preserves_rows() {
        let (_dir, store) = store();
        let table = message_table(&["protocol=tcp attack", "no protocol here"]);
        let input = vec![store.write("in", "merged_000", &table).unwrap()];

        let out = FieldExtractor::protocol().apply(&store, &input).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rows(), 2);

        let result = store.read(&out[0]).unwrap();
        assert_eq!(
            result.schema.columns(),
            ["Timestamp", "Hostname", "AppName", "protocol", "Message"]
        );
        assert_eq!(result.rows[0][3], "tcp");
        // Non-match stays as a row, with the canonical empty value.
        assert_eq!(result.rows[1][3], "");
        assert_eq!(result.rows[1][4], "no protocol here");
    }

    #[test]
    fn missing_source_column_is_schema_error() {
        let (_dir, store) = store();
        let table = Table::with_rows(ColumnSchema::new(["Timestamp"]), vec![vec!["t".into()]]);
        let input = vec![store.write("in", "merged_000", &table).unwrap()];
        let err = FieldExtractor::routing().apply(&store, &input).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }

    #[test]
    fn first_match_wins() {
        let e = FieldExtractor::protocol();
        assert_eq!(e.value("protocol=tcp then protocol=udp"), "tcp");
    }
}
