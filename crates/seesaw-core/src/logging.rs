//! Process-wide `tracing` setup.
//!
//! Human-readable output goes to the console. With a log directory, every
//! event is also written as one JSON object per line to a daily-rotating
//! file, so order and fill history can be replayed after a session.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. Files are named
/// `<module_name>.<date>` inside `log_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive until
/// the process exits. It is `None` when no directory was given.
pub fn init_logging(
    log_level: &str,
    log_dir: Option<&str>,
    module_name: &str,
) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(dir, module_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Some(guard)
}
