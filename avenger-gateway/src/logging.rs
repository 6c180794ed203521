use avenger_core::config::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of the daily-rolling log file.
pub const LOG_FILE_NAME: &str = "event-avenger.log";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Console output is always on;
/// with `file_enabled` a second, ANSI-free layer writes to a daily-rolling
/// file. The returned guard flushes that file on drop and must be held for
/// the life of the process.
pub fn init_tracing(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let (file_layer, guard) = if settings.file_enabled {
        let appender = tracing_appender::rolling::daily(&settings.file_dir, LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}
