/// Implementation of `dedupe stress`.
///
/// Releases all callers at once behind a barrier, waits for every task,
/// then checks the at-most-once guarantee against the store.
///
/// # Example output
///
/// ```text
/// $ dedupe stress --callers 50 --distinct 5 --latency-ms 20
/// Callers:    50 (5 distinct contents)
/// Saved:      5
/// Duplicates: 45
/// Failed:     0
/// Records:    5
/// Elapsed:    83 ms
/// ```
///
/// With store latency set, elapsed time stays close to one contended
/// chain per content rather than growing with the number of distinct
/// contents, since distinct contents never wait on each other.
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use dedupe_writer::DedupWriter;
use serde::Serialize;
use tokio::sync::Barrier;
use tracing::info;

use crate::StressArgs;
use crate::slow_store::SlowStore;

#[derive(Serialize)]
struct StressSummary {
    callers: usize,
    distinct: usize,
    saved: u64,
    duplicates: u64,
    failed: u64,
    records: usize,
    elapsed_ms: u128,
}

/// Run the `dedupe stress` command.
///
/// # Errors
///
/// Returns an error if the arguments are degenerate, a task panics, the
/// store cannot be listed, or the store ends up with a record count other
/// than one per attempted distinct content.
pub async fn run(args: &StressArgs) -> Result<()> {
    if args.callers == 0 {
        bail!("--callers must be at least 1");
    }
    if args.distinct == 0 {
        bail!("--distinct must be at least 1");
    }

    let writer = Arc::new(DedupWriter::new(SlowStore::new(args.latency_ms)));
    let barrier = Arc::new(Barrier::new(args.callers));

    let started = Instant::now();
    let handles: Vec<_> = (0..args.callers)
        .map(|i| {
            let writer = Arc::clone(&writer);
            let barrier = Arc::clone(&barrier);
            let content = format!("{}{}", args.prefix, i % args.distinct);
            tokio::spawn(async move {
                barrier.wait().await;
                writer.save(content).await
            })
        })
        .collect();

    for handle in handles {
        // Store failures are already counted in the writer's stats.
        let _ = handle.await.context("stress task panicked")?;
    }
    let elapsed = started.elapsed();

    let records = writer.list_all().await.context("failed to list items")?.len();
    let stats = writer.stats();
    let expected = args.distinct.min(args.callers);

    info!(
        callers = args.callers,
        records,
        elapsed_ms = elapsed.as_millis(),
        "stress run finished"
    );

    let summary = StressSummary {
        callers: args.callers,
        distinct: expected,
        saved: stats.saved,
        duplicates: stats.duplicates,
        failed: stats.failed,
        records,
        elapsed_ms: elapsed.as_millis(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Callers:    {} ({} distinct contents)",
            summary.callers, summary.distinct
        );
        println!("Saved:      {}", summary.saved);
        println!("Duplicates: {}", summary.duplicates);
        println!("Failed:     {}", summary.failed);
        println!("Records:    {}", summary.records);
        println!("Elapsed:    {} ms", summary.elapsed_ms);
    }

    if stats.failed > 0 {
        bail!("{} saves failed in the store", stats.failed);
    }
    if records != expected {
        bail!("expected {expected} records, store holds {records}");
    }
    Ok(())
}
