use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::SweepConfig;
use crate::errors::SweepError;
use crate::harness::Harness;
use crate::report::Report;
use crate::summary;
use crate::types::{HarnessOutput, RunRecord};

/// Run every configured threshold in order and return the merged report.
///
/// The prior report at `config.report` is loaded first; each threshold that
/// completes overwrites its own entry. The merged report is saved when the
/// sweep finishes, and also when it stops early, so completed thresholds
/// survive a timeout or a bad summary further down the list.
pub fn run<H: Harness>(config: &SweepConfig, harness: &mut H) -> Result<Report, SweepError> {
    config.validate()?;
    let mut report = Report::load_or_default(&config.report)?;

    if config.warmup {
        info!("warming up");
        harness.warm_up()?;
    }
    prepare_workspace(config)?;

    match sweep_thresholds(config, harness, &mut report) {
        Ok(()) => {
            report.save(&config.report)?;
            info!(
                path = %config.report.display(),
                thresholds = config.thresholds.len(),
                "sweep complete"
            );
            Ok(report)
        }
        Err(err) => {
            warn!(error = %err, "sweep aborted, saving completed thresholds");
            if let Err(save_err) = report.save(&config.report) {
                warn!(error = %save_err, "could not save partial report");
            }
            Err(err)
        }
    }
}

fn sweep_thresholds<H: Harness>(
    config: &SweepConfig,
    harness: &mut H,
    report: &mut Report,
) -> Result<(), SweepError> {
    for &threshold in &config.thresholds {
        let record = run_threshold(harness, threshold, &config.out_dir)?;
        report.insert(threshold, record);
    }
    Ok(())
}

/// Invoke the harness once, keep its raw output and turn the summary into a record.
pub fn run_threshold<H: Harness>(
    harness: &mut H,
    threshold: u64,
    out_dir: &Path,
) -> Result<RunRecord, SweepError> {
    info!(threshold, "running with -Z inline-mir-threshold={}", threshold);
    let output = harness.invoke(threshold)?;
    info!(
        threshold,
        "done with {} in {:.2}s ({})",
        threshold,
        output.elapsed.as_secs_f64(),
        output.status_display()
    );

    // Logs go to disk before parsing so a bad summary can still be inspected.
    write_logs(out_dir, threshold, &output)?;

    let counts = summary::extract(&output.stdout)?;
    summary::check_consistency(threshold, &output, &counts)?;
    info!(
        threshold,
        passed = counts.passed,
        failed = counts.failed,
        ignored = counts.ignored,
        "parsed test summary"
    );
    Ok(RunRecord::new(counts, output.elapsed))
}

/// Remove scratch directories left by earlier runs and recreate the log directory.
pub fn prepare_workspace(config: &SweepConfig) -> Result<(), SweepError> {
    for dir in &config.scratch_dirs {
        remove_dir_if_present(dir)?;
    }
    remove_dir_if_present(&config.out_dir)?;
    fs::create_dir_all(&config.out_dir).map_err(|source| SweepError::OutputDir {
        path: config.out_dir.clone(),
        source,
    })
}

fn remove_dir_if_present(dir: &Path) -> Result<(), SweepError> {
    if !dir.exists() {
        return Ok(());
    }
    fs::remove_dir_all(dir).map_err(|source| SweepError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// `(stdout, stderr)` log paths for a threshold.
pub fn log_paths(out_dir: &Path, threshold: u64) -> (PathBuf, PathBuf) {
    (
        out_dir.join(format!("compare-{}.txt", threshold)),
        out_dir.join(format!("compare-{}-err.txt", threshold)),
    )
}

fn write_logs(out_dir: &Path, threshold: u64, output: &HarnessOutput) -> Result<(), SweepError> {
    let (stdout_path, stderr_path) = log_paths(out_dir, threshold);
    for (path, contents) in [(stdout_path, &output.stdout), (stderr_path, &output.stderr)] {
        fs::write(&path, contents).map_err(|source| SweepError::LogWrite { path, source })?;
    }
    Ok(())
}
