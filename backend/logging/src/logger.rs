//! Structured Logger
//!
//! Console output on stderr (plain or JSON) and, when a directory is given,
//! a daily-rolling NDJSON file. `RUST_LOG` overrides the configured level.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "docsight.log";

/// Initialize the global logger. Returns `false` if one was already set.
pub fn init_logger<P: AsRef<Path>>(level: &str, log_dir: Option<P>, json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Writes `docsight.log.YYYY-MM-DD` under the log directory.
    let file_layer = log_dir.map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir.as_ref(), LOG_FILE_PREFIX);
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    let json_console = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let plain_console = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_console)
        .with(plain_console)
        .with(file_layer)
        .try_init()
        .is_ok()
}
