//! CLI output: writes rendered results and maps errors to the CLI surface.

use crate::dispatch::Report;
use crate::error::RackError;
use owo_colors::OwoColorize;
use std::io::{self, Write};

const ERROR_PREFIX: &str = "error:";

/// One-line CLI message for an error that ended the invocation.
pub fn map_error(err: &RackError) -> String {
    format!("{} {}", ERROR_PREFIX, err)
}

/// Results to `stdout`, one error line per failed item to `stderr`.
pub fn write_report(
    report: &Report,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    color: bool,
) -> io::Result<()> {
    stdout.write_all(report.rendered.stdout.as_bytes())?;
    stdout.flush()?;
    for line in &report.rendered.stderr {
        write_error_line(stderr, line, color)?;
    }
    stderr.flush()
}

pub(crate) fn write_error_line(stderr: &mut dyn Write, line: &str, color: bool) -> io::Result<()> {
    match line.strip_prefix(ERROR_PREFIX) {
        Some(rest) if color => writeln!(stderr, "{}{}", ERROR_PREFIX.red().bold(), rest),
        _ => writeln!(stderr, "{}", line),
    }
}
