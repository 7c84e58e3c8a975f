//! Report rendering.
//!
//! Text lines follow the classic fetchall layout: seconds with two
//! decimals, right-aligned byte count, then the target. JSON emits one
//! object per line.

use crate::report::{FetchResult, Report};
use serde::Deserialize;
use serde_json::json;
use std::io::{self, Write};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render one result as a single line (no trailing newline).
pub fn format_result(result: &FetchResult, format: OutputFormat) -> String {
    match (format, result) {
        (
            OutputFormat::Text,
            FetchResult::Success {
                target,
                elapsed,
                bytes,
                ..
            },
        ) => format!("{:.2}s  {:>7}  {}", elapsed.as_secs_f64(), bytes, target),
        (OutputFormat::Text, FetchResult::Failure { target, error, .. }) => {
            format!("error: {error}  {target}")
        }
        (
            OutputFormat::Json,
            FetchResult::Success {
                target,
                elapsed,
                bytes,
                status,
            },
        ) => json!({
            "target": target.as_str(),
            "status": "ok",
            "elapsed_secs": round2(elapsed.as_secs_f64()),
            "bytes": bytes,
            "http_status": status,
        })
        .to_string(),
        (
            OutputFormat::Json,
            FetchResult::Failure {
                target,
                elapsed,
                error,
            },
        ) => json!({
            "target": target.as_str(),
            "status": "error",
            "elapsed_secs": elapsed.map(|e| round2(e.as_secs_f64())),
            "error": error.to_string(),
            "kind": error.kind(),
        })
        .to_string(),
    }
}

/// Render the trailing batch line.
pub fn format_summary(report: &Report, format: OutputFormat) -> String {
    let secs = report.elapsed().as_secs_f64();
    match format {
        OutputFormat::Text => format!("{secs:.2}s elapsed"),
        OutputFormat::Json => json!({
            "elapsed_secs": round2(secs),
            "started_at": report.started_at().to_rfc3339(),
            "results": report.len(),
            "failures": report.failures().count(),
            "bytes": report.total_bytes(),
        })
        .to_string(),
    }
}

/// Streams result lines as they arrive, then the summary.
///
/// The first write error is kept; later lines are skipped and `finish`
/// returns it instead of writing the summary.
pub struct ResultPrinter<W: Write> {
    out: W,
    format: OutputFormat,
    error: Option<io::Error>,
}

impl<W: Write> ResultPrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        ResultPrinter {
            out,
            format,
            error: None,
        }
    }

    /// Print one result line. Returns `false` once output has failed.
    pub fn print(&mut self, result: &FetchResult) -> bool {
        if self.error.is_some() {
            return false;
        }
        if let Err(e) = writeln!(self.out, "{}", format_result(result, self.format)) {
            self.error = Some(e);
            return false;
        }
        true
    }

    pub fn finish(mut self, report: &Report) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        writeln!(self.out, "{}", format_summary(report, self.format))?;
        self.out.flush()
    }
}

fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
