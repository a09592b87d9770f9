use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set. Events go to stderr so that stdout
/// stays free for the run summary; `json` switches to one JSON object per line.
pub fn init_logging(level: &str, json: bool) -> Result<(), String> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .flatten_event(true);
        registry.with(layer).try_init().map_err(|e| e.to_string())
    } else {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
        registry.with(layer).try_init().map_err(|e| e.to_string())
    }
}
