//! Stats command for displaying store statistics and metrics

use anyhow::Result;
use std::path::Path;

use super::{load_config, open_store};
use crate::metrics::{gather_metrics, MetricSnapshot};

/// Print store statistics, or every metric in Prometheus text format.
pub async fn run(root: &Path, prometheus: bool) -> Result<()> {
    let config = load_config(root)?;
    let store = open_store(&config, root).await?;

    // Refreshes the store gauges as a side effect
    let counts = store.counts().await?;

    if prometheus {
        print!("{}", gather_metrics());
        return Ok(());
    }

    let snapshot = MetricSnapshot::capture();

    println!("Heritage Lens Statistics");
    println!("========================\n");

    println!("Artifacts:");
    println!("  Stored:   {}", counts.artifacts);
    println!("  Embedded: {}", counts.embedded);
    if counts.artifacts > counts.embedded {
        println!(
            "  {} artifacts are only visible to keyword search",
            counts.artifacts - counts.embedded
        );
    }
    println!();

    println!("Search Metrics (this process):");
    println!("  Total requests:   {:.0}", snapshot.search_requests_total);
    println!("  Failed requests:  {:.0}", snapshot.search_failures_total);
    if snapshot.search_requests_total > 0.0 {
        println!("  Average latency:  {:.3}s", snapshot.search_latency_avg);
        println!("  Average results:  {:.1}", snapshot.search_results_avg);
    }
    println!();

    println!("Storage:");
    println!("  Vector table:  {}", config.db_path(root).display());
    println!("  Keyword index: {}", config.keyword_index_path(root).display());

    Ok(())
}
