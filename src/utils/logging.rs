use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const LOG_PREFIX: &str = "dayplan";

const MAX_LOG_FILES: usize = 5;
const DEFAULT_LEVEL: &str = "debug";

/// Directive limiting output to this crate. An explicit level wins over `env_level`
/// (the value of `RUST_LOG`), which wins over `debug`.
fn filter_directive(log_level: Option<LevelFilter>, env_level: Option<String>) -> String {
    let level = log_level
        .map(|v| v.to_string())
        .or(env_level)
        .unwrap_or_else(|| DEFAULT_LEVEL.into());
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Installs the global subscriber. Logs always go into daily files under `logs_dir`, a pretty
/// copy is printed to stdout only when `show_std` is set.
pub fn enable_logging(
    logs_dir: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_PREFIX)
        .build(logs_dir)?;

    let filter = EnvFilter::new(filter_directive(
        log_level,
        std::env::var("RUST_LOG").ok(),
    ));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(appender);
    let stdout_layer = show_std.then(|| {
        fmt::layer()
            .pretty()
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stdout)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::registry()
        .with(LevelFilter::TRACE)
        .with(fmt::layer().pretty().with_test_writer())
        .try_init();
});
