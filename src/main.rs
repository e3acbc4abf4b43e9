//! Juniper syslog threat-event refinery.
//!
//! Reduces a day of hourly firewall log exports to curated workbooks of
//! high-severity threat events:
//!   1. keyword filter (RT_IDP_ATTACK)
//!   2. merge and re-shard at the row budget
//!   3. drop unused columns
//!   4. extract routing pair, split it, classify both addresses
//!   5. extract protocol, severity level, severity
//!   6. keep CRITICAL rows and export

mod config;
mod error;
mod export;
mod ingest;
mod metrics;
mod pipeline;
mod schema;
mod stages;
mod store;
mod table;

use anyhow::Result;
use tracing::info;

use export::DelimitedWriter;
use pipeline::{Pipeline, RunOutcome};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let settings = config::load();
    info!(?settings, msg = "starting syslog filter");

    println!("Juniper Syslog Filter");
    println!("=====================\n");
    println!("Keyword:  {}", settings.keyword);
    println!("Severity: {}", settings.severity);
    println!("Budget:   {} rows/shard\n", settings.row_budget);

    let writer = DelimitedWriter::new(&settings.output_dir);
    let output_dir = settings.output_dir.clone();
    let pipeline = Pipeline::new(settings)?;

    match pipeline.run(&writer)? {
        RunOutcome::Exported { files, rows } => {
            println!("\nExported {} rows across {} file(s):", rows, files.len());
            for file in files {
                println!("  {}", file.display());
            }
        }
        RunOutcome::NoMatches => {
            println!(
                "\nNo matching rows today; nothing written to {}.",
                output_dir.display()
            );
        }
    }

    println!("\nDone.");
    Ok(())
}
