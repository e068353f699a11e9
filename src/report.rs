use crate::types::{ScanOutcome, ScanReport, ScanStatus};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Placeholder written in structured output when no banner was captured.
pub const NO_BANNER: &str = "No banner";

const BANNER_COLUMN_MAX: usize = 60;

/// One element of the JSON array.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct OutcomeRecord<'a> {
    pub target: &'a str,
    pub port: u16,
    pub status: ScanStatus,
    pub banner: &'a str,
}

impl<'a> From<&'a ScanOutcome> for OutcomeRecord<'a> {
    fn from(o: &'a ScanOutcome) -> Self {
        Self {
            target: &o.task.host,
            port: o.task.port,
            status: o.status,
            banner: o.banner.as_deref().unwrap_or(NO_BANNER),
        }
    }
}

fn records(outcomes: &[ScanOutcome]) -> Vec<OutcomeRecord<'_>> {
    outcomes.iter().map(OutcomeRecord::from).collect()
}

/// Pretty JSON array, one record per outcome. Empty input renders as `[]`.
pub fn render_json(outcomes: &[ScanOutcome]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&records(outcomes))
}

pub fn write_json(path: &Path, outcomes: &[ScanOutcome]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records(outcomes))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Human-readable table followed by the summary block.
///
/// Closed ports are listed only when `show_closed` is set.
pub fn render_text(report: &ScanReport, show_closed: bool) -> String {
    let rows: Vec<&ScanOutcome> = report
        .outcomes
        .iter()
        .filter(|o| show_closed || o.is_open())
        .collect();

    let mut out = String::new();

    if !rows.is_empty() {
        let mut host_w = "target".len();
        let mut banner_w = "banner".len();
        for o in &rows {
            host_w = host_w.max(o.task.host.len());
            if let Some(b) = &o.banner {
                banner_w = banner_w.max(b.chars().count().min(BANNER_COLUMN_MAX));
            }
        }
        let port_w = 5;
        let status_w = "status".len();
        let tries_w = "attempts".len();

        let _ = writeln!(
            out,
            "{:<host_w$}  {:>port_w$}  {:<status_w$}  {:>tries_w$}  {:<banner_w$}",
            "target", "port", "status", "attempts", "banner"
        );
        let _ = writeln!(
            out,
            "{:-<host_w$}  {:-<port_w$}  {:-<status_w$}  {:-<tries_w$}  {:-<banner_w$}",
            "", "", "", "", ""
        );
        for o in rows {
            let banner = o.banner.as_deref().map(snippet).unwrap_or_default();
            let _ = writeln!(
                out,
                "{:<host_w$}  {:>port_w$}  {:<status_w$}  {:>tries_w$}  {}",
                o.task.host,
                o.task.port,
                o.status.to_string(),
                o.attempts,
                banner
            );
        }
    } else {
        out.push_str("No open ports found.\n");
    }

    let s = &report.summary;
    let _ = writeln!(out, "\n--- Scan Summary ---");
    let _ = writeln!(out, "Started at: {}", report.started_at);
    let _ = writeln!(out, "Targets scanned: {}", s.targets_scanned);
    let _ = writeln!(out, "Total ports scanned: {}", s.ports_scanned);
    let _ = writeln!(out, "Number of open ports: {}", s.open_count);
    let _ = writeln!(out, "Time taken: {:.2?}", s.duration);
    if s.cancelled {
        let _ = writeln!(out, "Scan was cancelled before all ports were probed.");
    }
    out
}

/// Single-line banner clipped to the table column width.
fn snippet(banner: &str) -> String {
    let flat = banner.replace('\n', "\\n").replace('\r', "\\r");
    flat.chars().take(BANNER_COLUMN_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScanSummary, ScanTask};
    use std::time::Duration;

    fn outcome(host: &str, port: u16, status: ScanStatus, banner: Option<&str>) -> ScanOutcome {
        ScanOutcome {
            task: ScanTask::new(host, port),
            status,
            banner: banner.map(String::from),
            attempts: 1,
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn empty_set_renders_empty_array() {
        assert_eq!(render_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn json_schema_and_banner_placeholder() {
        let outcomes = vec![
            outcome("10.0.0.1", 22, ScanStatus::Open, Some("SSH-2.0-OpenSSH_9.6")),
            outcome("10.0.0.1", 23, ScanStatus::Closed, None),
        ];
        let v: serde_json::Value = serde_json::from_str(&render_json(&outcomes).unwrap()).unwrap();
        assert_eq!(
            v,
            serde_json::json!([
                {"target": "10.0.0.1", "port": 22, "status": "open", "banner": "SSH-2.0-OpenSSH_9.6"},
                {"target": "10.0.0.1", "port": 23, "status": "closed", "banner": "No banner"}
            ])
        );
    }

    #[test]
    fn text_lists_open_ports_and_summary() {
        let report = ScanReport {
            summary: ScanSummary {
                targets_scanned: 1,
                ports_scanned: 2,
                open_count: 1,
                duration: Duration::from_millis(1500),
                cancelled: false,
            },
            outcomes: vec![
                outcome("host-a", 80, ScanStatus::Open, Some("HTTP/1.0 200 OK\r\nServer: x")),
                outcome("host-a", 81, ScanStatus::Closed, None),
            ],
            started_at: "2026-01-01T00:00:00Z".into(),
        };

        let text = render_text(&report, false);
        assert!(text.contains("host-a"));
        assert!(text.contains("HTTP/1.0 200 OK\\r\\nServer: x"));
        assert!(!text.contains(" 81 "));
        assert!(text.contains("Number of open ports: 1"));
        assert!(text.contains("Total ports scanned: 2"));

        let all = render_text(&report, true);
        assert!(all.contains("closed"));
    }
}
