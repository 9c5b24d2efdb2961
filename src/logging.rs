use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins when set; otherwise this crate
/// logs at `warn` (or `debug` when `verbose`) and sqlx is kept at `warn`.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}={},sqlx=warn", env!("CARGO_CRATE_NAME"), level))
    });

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
