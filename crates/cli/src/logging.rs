//! Diagnostic logging for filesync
//!
//! Console diagnostics go to stderr so stdout carries only status lines.
//! With `--log-file`, a detailed trace log is written alongside.

use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr as _, eyre};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::Layer as _;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Keeps the non-blocking file writer alive until dropped
pub struct LogGuard {
    _guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Default file filter when `RUST_LOG` is unset
const FILE_FILTER: &str = "warn,filesync=trace,filesync_core=trace";

/// Initialize console logging and, optionally, a trace log file.
///
/// The returned guard must be kept alive for the duration of the program.
///
/// # Errors
/// Returns an error if `log_file` has no file name component, or if its
/// directory cannot be created or the file cannot be opened
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<LogGuard> {
    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| eyre!("log file path '{}' has no file name", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name.to_string_lossy())
                .build(dir)
                .wrap_err_with(|| format!("cannot open log file '{}'", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let file_filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(FILE_FILTER));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
                .with_filter(file_filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(LogGuard { _guard: guard })
}
