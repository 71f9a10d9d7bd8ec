//! Console output for filesync
//!
//! Status lines go to stdout, one per event. The end-of-run summary is
//! printed to stderr in the familiar cargo format:
//! ```text
//!      Synced 3 copied (1.20 KiB), 12 up to date in 14ms
//!    Finished 2 copied, 1 failed in 9ms
//! ```

use std::io::Write as _;
use std::time::Instant;

use filesync_core::{Reporter, SyncEvent, SyncReport};
use tracing::debug;

/// Status verbs for cargo-style output (right-aligned to 12 chars)
struct Status;

impl Status {
    const SYNCED: &str = "Synced";
    const FINISHED: &str = "Finished";
    const CANCELLED: &str = "Cancelled";
}

/// Print a cargo-style status line
fn print_status(status: &str, style: &console::Style, message: &str) {
    let mut term = console::Term::stderr();
    let _ = writeln!(term, "{:>12} {}", style.apply_to(status), message);
}

/// Writes every status event as a line on stdout
pub struct StdoutReporter {
    term: console::Term,
}

impl StdoutReporter {
    pub fn new() -> Self {
        Self {
            term: console::Term::stdout(),
        }
    }
}

impl Default for StdoutReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for StdoutReporter {
    fn report(&mut self, event: &SyncEvent) {
        if let Err(e) = self.term.write_line(&event.to_string()) {
            debug!("failed to write status line: {e}");
        }
    }
}

/// Tracks elapsed time and prints the final summary
pub struct SyncProgress {
    start: Instant,
}

impl SyncProgress {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Show final summary
    pub fn finish(&self, report: &SyncReport) {
        let elapsed = self.start.elapsed();
        let elapsed_str = if elapsed.as_secs() >= 1 {
            format!("{:.2}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        };

        let yellow = console::Style::new().yellow().bold();
        if report.cancelled {
            print_status(
                Status::CANCELLED,
                &yellow,
                &format!(
                    "after {} files ({} copied) in {elapsed_str}",
                    report.classified(),
                    report.copied
                ),
            );
        } else if report.failures.is_empty() {
            let size = humansize::format_size(report.bytes_copied, humansize::BINARY);
            print_status(
                Status::SYNCED,
                &console::Style::new().green().bold(),
                &format!(
                    "{} copied ({size}), {} up to date in {elapsed_str}",
                    report.copied,
                    report.identical + report.destination_newer
                ),
            );
        } else {
            print_status(
                Status::FINISHED,
                &yellow,
                &format!(
                    "{} copied, {} failed in {elapsed_str}",
                    report.copied,
                    report.failures.len()
                ),
            );
        }
    }
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self::new()
    }
}
