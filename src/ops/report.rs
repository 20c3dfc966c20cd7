//! Render a status report for output

use std::fmt::Write as _;

use crate::common::{format_bytes, Result};
use crate::ops::collect::StatusReport;
use crate::status::{RwStatus, StoreStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// IP-keyed store map
    Json,
    /// Stores plus diagnostics
    Full,
    /// One line per store
    Text,
}

pub fn render(report: &StatusReport, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report.stores)?,
        OutputFormat::Full => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => render_text(report),
    };
    Ok(out)
}

fn render_text(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<5} {:<10} {:<8} {:>24} {:>12} {:>10}",
        "IP", "STATE", "RW", "GROUP", "USED / TOTAL", "DELAY", "NEEDLES"
    );
    for store in report.stores.values() {
        let state = match store.status {
            StoreStatus::Up => "up",
            StoreStatus::Down => "down",
        };
        let rw = match store.rw_status {
            RwStatus::ReadOnly => "read",
            RwStatus::ReadWrite => "readwrite",
            RwStatus::Other => "-",
        };
        let (capacity, delay, needles) = match &store.metrics {
            Some(m) => (
                format!("{} / {}", format_bytes(m.used_bytes), format_bytes(m.total_bytes)),
                m.average_delay_ms
                    .map(|d| format!("{}ms", d))
                    .unwrap_or_else(|| "-".into()),
                m.needle_count.to_string(),
            ),
            None => ("-".into(), "-".into(), "-".into()),
        };
        let _ = writeln!(
            out,
            "{:<16} {:<5} {:<10} {:<8} {:>24} {:>12} {:>10}",
            store.ip,
            state,
            rw,
            store.group.as_deref().unwrap_or("-"),
            capacity,
            delay,
            needles
        );
    }

    if !report.diagnostics.is_empty() {
        let _ = writeln!(out, "\n{} diagnostics:", report.diagnostics.len());
        for diag in &report.diagnostics {
            let _ = writeln!(out, "  {}", diag);
        }
    }
    out
}
