use std::time::{Duration, Instant};

use crate::store::Shard;

/// Wall-clock and row accounting per stage. Observational only; the
/// pipeline result does not depend on anything recorded here.
pub struct StageTracker {
    started: Instant,
    stages: Vec<StageMetric>,
}

struct StageMetric {
    name: &'static str,
    shards: usize,
    rows: usize,
    elapsed: Duration,
}

impl StageTracker {
    pub fn new() -> Self {
        StageTracker {
            started: Instant::now(),
            stages: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &'static str, output: &[Shard], stage_start: Instant) {
        let rows: usize = output.iter().map(Shard::rows).sum();
        let elapsed = stage_start.elapsed();
        println!(
            "  rows after {}: {} ({} shards, {:.2}s)",
            name,
            rows,
            output.len(),
            elapsed.as_secs_f64()
        );
        self.stages.push(StageMetric {
            name,
            shards: output.len(),
            rows,
            elapsed,
        });
    }

    pub fn print_summary(&self) {
        println!("\nStage summary");
        println!("-------------");
        for stage in &self.stages {
            println!(
                "  {:<24} {:>12} rows {:>5} shards {:>8.2}s",
                stage.name,
                stage.rows,
                stage.shards,
                stage.elapsed.as_secs_f64()
            );
        }
        println!("  total elapsed: {:.2}s", self.started.elapsed().as_secs_f64());
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        StageTracker::new()
    }
}
