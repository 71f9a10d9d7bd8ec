//! filesync: one-way synchronization of a directory's top-level files
//!
//! Copies files that are missing or stale in the destination, skips files
//! that are identical or newer there, and never deletes anything.

mod logging;
mod progress;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, ValueEnum, builder::Styles};
use color_eyre::Result;
use color_eyre::eyre::WrapErr as _;
use tracing::{debug, warn};

use filesync_core::{DEFAULT_MAX_FILES, SyncOptions, SyncReport, Syncer};

use crate::progress::{StdoutReporter, SyncProgress};

/// Wrong or missing arguments
const EXIT_USAGE: u8 = 1;
/// The run completed but some files failed
const EXIT_PARTIAL: u8 = 2;
/// The run was interrupted with Ctrl-C
const EXIT_CANCELLED: u8 = 130;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::Red.on_default());

#[derive(Parser, Debug)]
#[command(name = "filesync")]
#[command(version)]
#[command(styles = STYLES)]
#[command(about = "Synchronize the top-level files of one directory into another")]
#[command(long_about = r#"
filesync brings the regular files directly under a destination directory in
line with a source directory.

  • New files       - copied when missing from the destination
  • Stale files     - copied when content differs and the source is newer
  • Identical files - skipped, whatever their timestamps
  • Newer in dest   - kept, never overwritten
  • Extra files     - destination-only files are never deleted

Exit status: 0 on success, 1 on invalid arguments or unusable directories,
2 if any file failed, 130 if interrupted.

Examples:
  filesync ./photos /mnt/backup/photos       One-shot sync
  filesync -j 4 --max-files 0 ./data ./copy  Four workers, no file cap
"#)]
struct Cli {
    /// Directory to copy files from
    #[arg(value_name = "SOURCE_DIRECTORY")]
    source: PathBuf,

    /// Directory to copy files into (created if missing)
    #[arg(value_name = "DESTINATION_DIRECTORY")]
    destination: PathBuf,

    /// Maximum number of files tracked per run (0 for no limit)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_FILES)]
    max_files: usize,

    /// Number of files processed concurrently
    #[arg(short, long, value_name = "N", default_value = "1")]
    jobs: NonZeroUsize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Also write a detailed trace log to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Format of the end-of-run summary printed to stderr
    #[arg(long, value_enum, default_value_t = SummaryFormat::Summary)]
    format: SummaryFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    /// One cargo-style line
    Summary,
    /// The full run report as JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return Ok(ExitCode::from(EXIT_USAGE));
        }
        // --help and --version
        Err(e) => e.exit(),
    };

    let _log = logging::init(cli.verbose, cli.log_file.as_deref())?;
    debug!(?cli, "starting");

    let cancel = Arc::new(AtomicBool::new(false));
    tokio::spawn(cancel_on_ctrl_c(Arc::clone(&cancel)));

    let options = SyncOptions::default()
        .max_files(cli.max_files)
        .jobs(cli.jobs)
        .cancel_flag(cancel);

    let progress = SyncProgress::new();
    let report = sync_command(cli.source, cli.destination, options).await?;

    match cli.format {
        SummaryFormat::Summary => progress.finish(&report),
        SummaryFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            eprintln!("{json}");
        }
    }

    Ok(ExitCode::from(exit_status(&report)))
}

async fn sync_command(
    source: PathBuf,
    destination: PathBuf,
    options: SyncOptions,
) -> Result<SyncReport> {
    let report = tokio::task::spawn_blocking(move || {
        let mut reporter = StdoutReporter::new();
        Syncer::new(options).run(&source, &destination, &mut reporter)
    })
    .await
    .wrap_err("sync worker failed")??;

    Ok(report)
}

async fn cancel_on_ctrl_c(flag: Arc<AtomicBool>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("interrupt received, stopping after the files in progress");
            flag.store(true, Ordering::Relaxed);
        }
        Err(e) => debug!("cannot listen for Ctrl-C: {e}"),
    }
}

fn exit_status(report: &SyncReport) -> u8 {
    if report.cancelled {
        EXIT_CANCELLED
    } else if !report.is_success() {
        EXIT_PARTIAL
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use filesync_core::FileFailure;

    #[test]
    fn test_two_positionals() {
        let cli = Cli::try_parse_from(["filesync", "src", "dst"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("src"));
        assert_eq!(cli.destination, PathBuf::from("dst"));
        assert_eq!(cli.max_files, 100);
        assert_eq!(cli.jobs.get(), 1);
        assert_eq!(cli.format, SummaryFormat::Summary);
    }

    #[test]
    fn test_wrong_arity_is_a_usage_error() {
        for args in [
            &["filesync"][..],
            &["filesync", "only_source"][..],
            &["filesync", "a", "b", "c"][..],
        ] {
            let err = Cli::try_parse_from(args).unwrap_err();
            assert!(err.use_stderr(), "{args:?} should be rejected");
        }
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let err = Cli::try_parse_from(["filesync", "-j", "0", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_options_parse() {
        let cli = Cli::try_parse_from([
            "filesync",
            "--max-files",
            "0",
            "--jobs",
            "4",
            "--format",
            "json",
            "--log-file",
            "/tmp/filesync.log",
            "a",
            "b",
        ])
        .unwrap();
        assert_eq!(cli.max_files, 0);
        assert_eq!(cli.jobs.get(), 4);
        assert_eq!(cli.format, SummaryFormat::Json);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/filesync.log")));
    }

    #[test]
    fn test_help_is_not_an_error() {
        let err = Cli::try_parse_from(["filesync", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_exit_codes() {
        let ok = SyncReport::default();
        assert_eq!(exit_status(&ok), 0);

        let partial = SyncReport {
            failures: vec![FileFailure {
                name: "a.txt".into(),
                reason: "permission denied".into(),
            }],
            ..SyncReport::default()
        };
        assert_eq!(exit_status(&partial), EXIT_PARTIAL);

        let cancelled = SyncReport {
            cancelled: true,
            ..partial
        };
        assert_eq!(exit_status(&cancelled), EXIT_CANCELLED);

        let interrupted = SyncReport {
            cancelled: true,
            ..SyncReport::default()
        };
        assert!(!interrupted.is_success());
        assert_eq!(exit_status(&interrupted), EXIT_CANCELLED);
    }
}
