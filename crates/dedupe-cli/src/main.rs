/// `dedupe` command-line tool: drive a deduplicating writer against an
/// in-memory content store.
///
/// The store lives for one process run, so every invocation starts empty.
/// The tool is meant for demonstrating and load-checking the at-most-once
/// guarantee, not for keeping data.
///
/// # Command overview
///
/// ```text
/// dedupe <COMMAND> [OPTIONS]
///
/// Commands:
///   save     Save each argument concurrently and print the outcomes
///   stress   Hammer the writer with many concurrent callers
///   help     Print help information
///
/// Global options:
///   -v, --verbose    Log at debug level (RUST_LOG overrides)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                              |
/// |------|------------------------------------------------------|
/// | 0    | Success                                              |
/// | 1    | Error (store failure, at-most-once violation, etc.)  |
///
/// Logs and error details are written to stderr so stdout can be piped
/// cleanly.
use std::process;

use clap::{Parser, Subcommand};

mod cmd_save;
mod cmd_stress;
mod logging;
mod slow_store;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Deduplicating writer CLI.
///
/// Save contents through a per-content lock table and report which calls
/// persisted and which were duplicates.
#[derive(Parser)]
#[command(name = "dedupe", version, about = "Deduplicating writer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Save each argument concurrently and print the outcomes.
    Save(SaveArgs),
    /// Hammer the writer with many concurrent callers.
    Stress(StressArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `dedupe save`.
///
/// Every content argument is saved from its own task, all at once.
/// Repeated arguments therefore race each other, and exactly one of them
/// is reported as saved.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────────┐
/// │ Flag         │ Effect                                               │
/// ├──────────────┼──────────────────────────────────────────────────────┤
/// │ --json       │ Print results and stored items as a JSON document    │
/// │ --latency-ms │ Simulated store latency per operation (default 0)    │
/// └──────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct SaveArgs {
    /// Contents to save. Repeat a value to see it deduplicated.
    #[arg(required = true)]
    pub contents: Vec<String>,

    /// Print results and stored items as JSON.
    #[arg(long)]
    pub json: bool,

    /// Simulated store latency in milliseconds, applied to every store call.
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,
}

/// Arguments for `dedupe stress`.
///
/// Spawns `callers` tasks. Caller `i` saves `{prefix}{i % distinct}`, so
/// each distinct content is contended by roughly `callers / distinct`
/// tasks. After all tasks finish, the store must hold exactly one record
/// per distinct content that was attempted; otherwise the command fails.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────────┐
/// │ Flag         │ Values / default                                     │
/// ├──────────────┼──────────────────────────────────────────────────────┤
/// │ --callers    │ number of concurrent tasks (default 50)              │
/// │ --distinct   │ number of distinct contents (default 1)              │
/// │ --prefix     │ content prefix (default "item-")                     │
/// │ --latency-ms │ simulated store latency per operation (default 0)    │
/// │ --json       │ print the summary as JSON                            │
/// └──────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct StressArgs {
    /// Number of concurrent callers.
    #[arg(long, default_value_t = 50)]
    pub callers: usize,

    /// Number of distinct contents the callers cycle through.
    #[arg(long, default_value_t = 1)]
    pub distinct: usize,

    /// Prefix for generated contents.
    #[arg(long, default_value = "item-")]
    pub prefix: String,

    /// Simulated store latency in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Save(args) => cmd_save::run(&args).await,
            Commands::Stress(args) => cmd_stress::run(&args).await,
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
