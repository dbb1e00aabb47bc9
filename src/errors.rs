use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("Harness run for threshold {threshold} timed out after {timeout_secs}s")]
    Timeout { threshold: u64, timeout_secs: u64 },

    #[error("No \"test result:\" summary in harness output. Did the test suite crash before running?")]
    MissingSummary,

    #[error("Unrecognized test summary line: {line:?}")]
    Parse { line: String },

    #[error(
        "Harness exit status ({status}) disagrees with the summary ({failed} failed) for threshold {threshold}"
    )]
    Consistency {
        threshold: u64,
        status: String,
        failed: u64,
    },

    #[error("Failed to launch harness `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed waiting for harness: {source}")]
    Wait { source: std::io::Error },

    #[error("Failed to write log file {path}: {source}")]
    LogWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to prepare directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No report found at {path}. Run a sweep first.")]
    ReportNotFound { path: PathBuf },

    #[error("Failed to read report {path}: {source}")]
    ReportRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse report {path}: {detail}")]
    ReportParse { path: PathBuf, detail: String },

    #[error("Failed to write report {path}: {detail}")]
    ReportWrite { path: PathBuf, detail: String },

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    #[error("Threshold {threshold} appears more than once in the sweep list")]
    DuplicateThreshold { threshold: u64 },

    #[error("Invalid sweep configuration: {detail}")]
    InvalidConfig { detail: String },
}
