use chrono::{DateTime, Utc};
use owo_colors::{OwoColorize, Stream, Style};
use serde::Serialize;

use crate::report::Report;
use crate::types::RunRecord;

/// How long ago the report was last written. Sweeps run for hours, so the
/// hour form keeps its minutes; anything past a day is counted in days.
pub fn format_report_age(age: chrono::Duration) -> String {
    let mins = age.num_minutes();
    if mins < 1 {
        // Also covers an mtime slightly in the future.
        return "just now".to_string();
    }
    match (age.num_days(), age.num_hours()) {
        (0, 0) => format!("{}m ago", mins),
        (0, hours) => format!("{}h{:02}m ago", hours, mins % 60),
        (days, _) => format!("{}d ago", days),
    }
}

/// Seconds with two decimals, e.g. "61.52s".
pub fn format_seconds(secs: f64) -> String {
    format!("{:.2}s", secs)
}

// Style constants
fn style_threshold() -> Style {
    Style::new().cyan().bold()
}

fn style_failed(failed: u64) -> Style {
    if failed > 0 {
        Style::new().red().bold()
    } else {
        Style::new().dimmed()
    }
}

struct Row {
    threshold: String,
    time: String,
    passed: String,
    failed: String,
    ignored: String,
}

fn rows(report: &Report) -> Vec<(&RunRecord, Row)> {
    report
        .iter()
        .map(|(threshold, record)| {
            let row = Row {
                threshold: threshold.to_string(),
                time: format_seconds(record.time),
                passed: record.passed.to_string(),
                failed: record.failed.to_string(),
                ignored: record.ignored.to_string(),
            };
            (record, row)
        })
        .collect()
}

fn width(rows: &[(&RunRecord, Row)], header: &str, field: impl Fn(&Row) -> usize) -> usize {
    rows.iter()
        .map(|(_, r)| field(r))
        .max()
        .unwrap_or(0)
        .max(header.len())
}

/// Default format: header with report age, aligned columns, footer.
pub fn format_default(
    report: &Report,
    updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    let header = match updated {
        Some(at) => format!(
            "Inline threshold comparison (updated {}):",
            format_report_age(now - at)
        ),
        None => "Inline threshold comparison:".to_string(),
    };
    out.push_str(
        &header
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    );
    out.push_str("\n\n");

    if report.is_empty() {
        out.push_str(
            &"  (no thresholds recorded)"
                .if_supports_color(Stream::Stdout, |s| s.dimmed())
                .to_string(),
        );
        out.push('\n');
        return out;
    }

    let rows = rows(report);
    let w_threshold = width(&rows, "threshold", |r| r.threshold.len());
    let w_time = width(&rows, "time", |r| r.time.len());
    let w_passed = width(&rows, "passed", |r| r.passed.len());
    let w_failed = width(&rows, "failed", |r| r.failed.len());
    let w_ignored = width(&rows, "ignored", |r| r.ignored.len());

    let columns = format!(
        "  {:>w_threshold$}  {:>w_time$}  {:>w_passed$}  {:>w_failed$}  {:>w_ignored$}",
        "threshold", "time", "passed", "failed", "ignored",
    );
    out.push_str(
        &columns
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    );
    out.push('\n');

    let threshold_style = style_threshold();
    let mut total_failed = 0;

    for (record, row) in &rows {
        total_failed += record.failed;
        let failed_style = style_failed(record.failed);

        let threshold = format!("{:>w_threshold$}", row.threshold);
        let time = format!("{:>w_time$}", row.time);
        let passed = format!("{:>w_passed$}", row.passed);
        let failed = format!("{:>w_failed$}", row.failed);
        let ignored = format!("{:>w_ignored$}", row.ignored);

        out.push_str(&format!(
            "  {}  {}  {}  {}  {}\n",
            threshold.if_supports_color(Stream::Stdout, |s| s.style(threshold_style)),
            time.if_supports_color(Stream::Stdout, |s| s.yellow()),
            passed.if_supports_color(Stream::Stdout, |s| s.green()),
            failed.if_supports_color(Stream::Stdout, |s| s.style(failed_style)),
            ignored.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        ));
    }

    out.push('\n');

    let with_failures = rows.iter().filter(|(r, _)| r.failed > 0).count();
    let footer = format!(
        "{} thresholds, {} with failures ({} failing tests in total)",
        rows.len(),
        with_failures,
        total_failed
    );
    out.push_str(
        &footer
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    );
    out.push('\n');

    out
}

/// Short format: one compact line per threshold, no header/footer.
pub fn format_short(report: &Report) -> String {
    let rows = rows(report);
    let w_threshold = rows.iter().map(|(_, r)| r.threshold.len()).max().unwrap_or(0);
    let threshold_style = style_threshold();

    let mut out = String::new();
    for (record, row) in &rows {
        let threshold = format!("{:>w_threshold$}", row.threshold);
        let counts = format!("{}/{}/{}", record.passed, record.failed, record.ignored);
        let failed_style = style_failed(record.failed);
        out.push_str(&format!(
            "{} {:>9}  {}\n",
            threshold.if_supports_color(Stream::Stdout, |s| s.style(threshold_style)),
            row.time,
            counts.if_supports_color(Stream::Stdout, |s| s.style(failed_style)),
        ));
    }
    out
}

/// JSON output format.
#[derive(Serialize)]
struct JsonRecord {
    threshold: u64,
    time: f64,
    passed: u64,
    failed: u64,
    ignored: u64,
    total: u64,
}

pub fn format_json(report: &Report) -> String {
    let records: Vec<JsonRecord> = report
        .iter()
        .map(|(threshold, record)| JsonRecord {
            threshold,
            time: record.time,
            passed: record.passed,
            failed: record.failed,
            ignored: record.ignored,
            total: record.total(),
        })
        .collect();

    serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
}
