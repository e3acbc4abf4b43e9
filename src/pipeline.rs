//! Sequential stage orchestration.
//!
//! Fixed order: keyword filter, row-budget merge, column projection, the
//! four extraction stages with the routing split and address
//! classification in between, the final severity filter, then export.
//! Each stage fully materializes its output before the next one starts;
//! the consumed artifact set is retired only after that, so an interrupted
//! run always leaves the last completed stage's output on disk.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::export::{verify_final_schema, WorkbookWriter};
use crate::ingest;
use crate::metrics::StageTracker;
use crate::stages::classify::classify_ips;
use crate::stages::extract::FieldExtractor;
use crate::stages::keyword::filter_keyword;
use crate::stages::merge::merge_shards;
use crate::stages::project::reduce_columns;
use crate::stages::severity::{filter_severity, FilterOutcome};
use crate::stages::split::split_routing;
use crate::store::{Shard, ShardStore};

#[derive(Debug)]
pub enum RunOutcome {
    Exported { files: Vec<PathBuf>, rows: usize },
    NoMatches,
}

pub struct Pipeline {
    settings: Settings,
    store: ShardStore,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        let store = ShardStore::open(&settings.work_dir)?;
        store.reset()?;
        Ok(Pipeline { settings, store })
    }

    pub fn run(&self, writer: &dyn WorkbookWriter) -> Result<RunOutcome> {
        let settings = &self.settings;
        let mut tracker = StageTracker::new();

        let sources = ingest::collect_tables(&self.store, &settings.source_dir)?;
        println!("Source tables: {}\n", sources.len());

        println!("Stage 1: filter `{}`", settings.keyword);
        let t0 = Instant::now();
        let (current, retained) =
            filter_keyword(&self.store, &sources, "Message", &settings.keyword)?;
        tracker.record("filter_keyword", &current, t0);
        info!(retained, "keyword filter done");
        if settings.retire_sources {
            self.store.retire(&sources)?;
        }

        println!("Stage 2: merge at {} rows", settings.row_budget);
        let current = self.advance(&mut tracker, "merge_files", current, |shards| {
            merge_shards(&self.store, shards, settings.row_budget)
        })?;

        println!("Stage 3: reduce columns");
        let current = self.advance(&mut tracker, "reduce_columns", current, |shards| {
            reduce_columns(&self.store, shards, &settings.keep_columns)
        })?;

        println!("Stage 4: extract routing");
        let current = self.advance(&mut tracker, "extract_routing", current, |shards| {
            FieldExtractor::routing().apply(&self.store, shards)
        })?;

        println!("Stage 5: split routing pair");
        let current = self.advance(&mut tracker, "split_ip", current, |shards| {
            split_routing(&self.store, shards)
        })?;

        println!("Stage 6: classify addresses");
        let current = self.advance(&mut tracker, "classify_ip", current, |shards| {
            classify_ips(&self.store, shards)
        })?;

        println!("Stage 7: extract protocol");
        let current = self.advance(&mut tracker, "extract_protocol", current, |shards| {
            FieldExtractor::protocol().apply(&self.store, shards)
        })?;

        println!("Stage 8: extract severity level");
        let current = self.advance(&mut tracker, "extract_severity_level", current, |shards| {
            FieldExtractor::severity_level().apply(&self.store, shards)
        })?;

        println!("Stage 9: extract severity");
        let current = self.advance(&mut tracker, "extract_severity", current, |shards| {
            FieldExtractor::severity().apply(&self.store, shards)
        })?;

        println!("Stage 10: filter severity `{}`", settings.severity);
        let t0 = Instant::now();
        let outcome = filter_severity(
            &self.store,
            &current,
            &settings.severity,
            settings.merge_output,
        )?;
        let final_set = match outcome {
            FilterOutcome::Matched(shards) => {
                tracker.record("filter_critical", &shards, t0);
                self.store.retire(&current)?;
                shards
            }
            FilterOutcome::NoMatches => {
                self.store.retire(&current)?;
                tracker.print_summary();
                return Ok(RunOutcome::NoMatches);
            }
        };

        println!("Stage 11: export");
        let mut files = Vec::new();
        let mut rows = 0;
        for shard in &final_set {
            let table = self.store.read(shard)?;
            verify_final_schema(&table)?;
            rows += table.len();
            files.push(writer.write(shard.name(), &table)?);
        }

        tracker.print_summary();
        Ok(RunOutcome::Exported { files, rows })
    }

    /// Run one shard-set stage, record it, and retire the consumed set
    /// once the new one is fully on disk.
    fn advance<F>(
        &self,
        tracker: &mut StageTracker,
        name: &'static str,
        input: Vec<Shard>,
        stage: F,
    ) -> Result<Vec<Shard>>
    where
        F: FnOnce(&[Shard]) -> Result<Vec<Shard>>,
    {
        let t0 = Instant::now();
        let output = stage(&input)?;
        tracker.record(name, &output, t0);
        self.store.retire(&input)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::DelimitedWriter;

    const HEADER: &str = "Timestamp,Hostname,AppName,SeverityLevel,Severity,LogType,Message";

    fn settings(root: &std::path::Path) -> Settings {
        Settings {
            source_dir: root.join("source_logs"),
            work_dir: root.join("work"),
            output_dir: root.join("final_output"),
            row_budget: 2,
            ..Settings::default()
        }
    }

    fn write_source(dir: &std::path::Path, name: &str, rows: &[&str]) {
        std::fs::create_dir_all(dir).unwrap();
        let mut text = format!("{HEADER}\n");
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn end_to_end_derives_all_columns() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        write_source(
            &settings.source_dir,
            "hour_00.csv",
            &[
                // The one row that should survive to the workbook.
                "2024-05-01T10:00:00,fw1,RT_IDP,3,WARNING,idp,\"RT_IDP_ATTACK: sig 10.0.0.5/1111 > 8.8.8.8/53 protocol=udp SeverityLevel=3 Severity=CRITICAL\"",
                // Keyword match but not CRITICAL.
                "2024-05-01T10:00:01,fw1,RT_IDP,3,WARNING,idp,\"RT_IDP_ATTACK: sig 10.0.0.6/2222 > 9.9.9.9/53 protocol=tcp SeverityLevel=4 Severity=WARNING\"",
                // No keyword match at all.
                "2024-05-01T10:00:02,fw1,RT_IDP,6,INFO,idp,heartbeat ok",
            ],
        );

        let output_dir = settings.output_dir.clone();
        let pipeline = Pipeline::new(settings).unwrap();
        let writer = DelimitedWriter::new(&output_dir);
        let RunOutcome::Exported { files, rows } = pipeline.run(&writer).unwrap() else {
            panic!("expected exported rows");
        };
        assert_eq!(rows, 1);
        assert_eq!(files.len(), 1);

        let text = std::fs::read_to_string(&files[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Timestamp,Hostname,AppName,routing,srcIP,srcIP_type,dstIP,dstIP_type,protocol,SeverityLevel,Severity,Message"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2024-05-01T10:00:00,fw1,RT_IDP,10.0.0.5 > 8.8.8.8,"));
        assert!(row.contains("10.0.0.5 > 8.8.8.8,10.0.0.5,private,8.8.8.8,global,udp,3,CRITICAL,"));
    }

    #[test]
    fn quiet_day_yields_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        write_source(
            &settings.source_dir,
            "hour_00.csv",
            &["2024-05-01T10:00:00,fw1,RT_IDP,3,WARNING,idp,RT_IDP_ATTACK Severity=WARNING"],
        );
        let output_dir = settings.output_dir.clone();
        let pipeline = Pipeline::new(settings).unwrap();
        let writer = DelimitedWriter::new(&output_dir);
        assert!(matches!(
            pipeline.run(&writer).unwrap(),
            RunOutcome::NoMatches
        ));
    }

    #[test]
    fn sources_survive_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        write_source(
            &settings.source_dir,
            "hour_00.csv",
            &["2024-05-01T10:00:00,fw1,RT_IDP,3,WARNING,idp,nothing relevant"],
        );
        let source = settings.source_dir.join("hour_00.csv");
        let output_dir = settings.output_dir.clone();
        let pipeline = Pipeline::new(settings).unwrap();
        let writer = DelimitedWriter::new(&output_dir);
        pipeline.run(&writer).unwrap();
        assert!(source.exists());
    }
}
