use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise the writer crates log at `info`,
/// or at `debug` with `--verbose`.
pub fn init(verbose: bool) {
    let default = if verbose {
        "dedupe=debug,dedupe_writer=debug,dedupe_lock=debug,warn"
    } else {
        "dedupe=info,dedupe_writer=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Keep an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
