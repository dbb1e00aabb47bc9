use chrono::{DateTime, TimeDelta, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use inline_sweep::display;
use inline_sweep::report::Report;
use inline_sweep::summary;
use inline_sweep::types::RunRecord;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Synthetic libtest output with `tests` per-test lines followed by a summary.
fn make_harness_output(tests: usize) -> String {
    let mut out = format!("\nrunning {} tests\n", tests);
    for i in 0..tests {
        let verdict = if i % 17 == 0 { "FAILED" } else { "ok" };
        out.push_str(&format!("test tests/ui/case_{:04}/case_{:04}.rs ... {}\n", i, i, verdict));
    }
    let failed = tests.div_ceil(17);
    out.push_str(&format!(
        "\ntest result: FAIL. {} failed; {} passed; 0 ignored; 0 measured; 0 filtered out; finished in 61.52s\n\n",
        failed,
        tests - failed
    ));
    out
}

/// Build a report with `size` thresholds spaced 10 apart.
fn make_report(size: u64) -> Report {
    let mut report = Report::new();
    for i in 0..size {
        report.insert(
            i * 10,
            RunRecord {
                time: 60.0 + i as f64 * 0.37,
                passed: 400 - i % 7,
                failed: i % 7,
                ignored: 12,
            },
        );
    }
    report
}

// ---------------------------------------------------------------------------
// Benchmarks: summary
// ---------------------------------------------------------------------------

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("summary_extract");

    for &size in &[10, 100, 1000, 5000] {
        let output = make_harness_output(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &output, |b, s| {
            b.iter(|| summary::extract(s).unwrap());
        });
    }

    group.finish();
}

fn bench_extract_errors(c: &mut Criterion) {
    let missing = make_harness_output(1000).replace("test result:", "summary:");
    let malformed = make_harness_output(1000).replace("; 0 ignored;", " 0 ignored");

    let mut group = c.benchmark_group("summary_extract_errors");
    group.bench_function("missing_marker", |b| {
        b.iter(|| summary::extract(&missing).unwrap_err());
    });
    group.bench_function("malformed_line", |b| {
        b.iter(|| summary::extract(&malformed).unwrap_err());
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmarks: report
// ---------------------------------------------------------------------------

fn bench_report_yaml(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_yaml");
    for &size in &[14, 100] {
        let report = make_report(size);
        group.bench_with_input(BenchmarkId::new("to_yaml", size), &report, |b, r| {
            b.iter(|| r.to_yaml().unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmarks: display
// ---------------------------------------------------------------------------

fn bench_display(c: &mut Criterion) {
    let now: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-02-18T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let updated = Some(now - TimeDelta::seconds(420));
    let report = make_report(14);

    let mut group = c.benchmark_group("display");
    group.bench_function("format_default_14", |b| {
        b.iter(|| display::format_default(&report, updated, now));
    });
    group.bench_function("format_short_14", |b| {
        b.iter(|| display::format_short(&report));
    });
    group.bench_function("format_json_14", |b| {
        b.iter(|| display::format_json(&report));
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_extract,
    bench_extract_errors,
    bench_report_yaml,
    bench_display,
);
criterion_main!(benches);
