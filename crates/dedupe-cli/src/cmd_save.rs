/// Implementation of `dedupe save`.
///
/// Saves every content argument from its own task, then prints the
/// outcome of each call (in argument order) followed by the stored items.
///
/// # Example output
///
/// ```text
/// $ dedupe save apple pear apple
/// saved      Item with content apple saved with id 1
/// saved      Item with content pear saved with id 2
/// duplicate  Duplicate item received with content apple.
///
/// Items (2):
///   #1  apple
///   #2  pear
/// ```
///
/// Which of the two `apple` calls wins is decided by the race; the
/// output always shows exactly one `saved` line per distinct content.
use std::sync::Arc;

use anyhow::{Context, Result};
use dedupe_types::{Item, SaveResult};
use dedupe_writer::DedupWriter;
use serde::Serialize;
use tracing::info;

use crate::SaveArgs;
use crate::slow_store::SlowStore;

#[derive(Serialize)]
struct SaveReport {
    results: Vec<ResultJson>,
    items: Vec<ItemJson>,
}

#[derive(Serialize)]
struct ResultJson {
    content: String,
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct ItemJson {
    id: u64,
    content: String,
}

impl From<&Item> for ItemJson {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.get(),
            content: item.content.to_string(),
        }
    }
}

/// Run the `dedupe save` command.
///
/// # Errors
///
/// Returns an error if any save fails in the store, if a save task
/// panics, or if the final listing fails.
pub async fn run(args: &SaveArgs) -> Result<()> {
    let writer = Arc::new(DedupWriter::new(SlowStore::new(args.latency_ms)));

    let handles: Vec<_> = args
        .contents
        .iter()
        .map(|content| {
            let writer = Arc::clone(&writer);
            let content = content.clone();
            tokio::spawn(async move { writer.save(content).await })
        })
        .collect();

    let mut results: Vec<(String, SaveResult)> = Vec::with_capacity(handles.len());
    for (content, handle) in args.contents.iter().zip(handles) {
        let result = handle
            .await
            .context("save task panicked")?
            .with_context(|| format!("failed to save {content:?}"))?;
        results.push((content.clone(), result));
    }

    let items = writer.list_all().await.context("failed to list items")?;
    let stats = writer.stats();
    info!(
        saved = stats.saved,
        duplicates = stats.duplicates,
        "save command finished"
    );

    if args.json {
        let report = SaveReport {
            results: results
                .into_iter()
                .map(|(content, result)| ResultJson {
                    content,
                    success: result.success,
                    message: result.message,
                })
                .collect(),
            items: items.iter().map(ItemJson::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (_, result) in &results {
        let label = if result.success { "saved" } else { "duplicate" };
        println!("{label:<10} {}", result.message);
    }
    println!();
    println!("Items ({}):", items.len());
    for item in &items {
        println!("  #{:<3} {}", item.id, item.content);
    }

    Ok(())
}
