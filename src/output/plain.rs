//! Plain text output formatting.
//!
//! Reply lines go to stdout untouched so they can be piped; everything else
//! goes to stderr with colors.

use crate::scanner::{Reply, ReplySink, SweepSummary};
use console::style;
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes `Reply from <host>: time=<N>ms` lines.
pub struct PlainSink<W: Write + Send> {
    out: Mutex<W>,
}

impl PlainSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> PlainSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> ReplySink for PlainSink<W> {
    fn emit(&self, reply: &Reply) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // A closed stdout must not abort the sweep.
        let _ = writeln!(out, "{}", reply).and_then(|_| out.flush());
    }
}

/// Print the end-of-sweep totals to stderr.
pub fn print_summary(summary: &SweepSummary) {
    eprintln!();
    eprintln!(
        "{} {} hosts swept in {:.2}s",
        style("Statistics:").bold(),
        summary.hosts,
        summary.duration_ms as f64 / 1000.0
    );
    eprintln!(
        "            {} alive, {} unreachable, {} errors ({} escalated)",
        style(summary.alive).green().bold(),
        style(summary.unreachable).yellow(),
        style(summary.errors).red(),
        style(summary.escalated).dim()
    );
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
