use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs JSON logging for the Lambda runtime.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies. The
/// Lambda log stream adds its own timestamps, so none are written here.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| env_filter(log_level));

    let layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(false)
        .without_time()
        .with_ansi(false);

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}
