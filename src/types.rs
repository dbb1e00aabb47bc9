use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Counts parsed from a single `test result:` summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCounts {
    pub passed: u64,
    pub failed: u64,
    pub ignored: u64,
}

/// One persisted report entry, keyed by threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Wall-clock seconds spent in the harness.
    pub time: f64,
    pub passed: u64,
    pub failed: u64,
    pub ignored: u64,
}

impl RunRecord {
    pub fn new(counts: TestCounts, elapsed: Duration) -> Self {
        RunRecord {
            time: elapsed.as_secs_f64(),
            passed: counts.passed,
            failed: counts.failed,
            ignored: counts.ignored,
        }
    }

    pub fn total(&self) -> u64 {
        self.passed
            .saturating_add(self.failed)
            .saturating_add(self.ignored)
    }
}

/// Everything captured from one harness invocation.
#[derive(Debug, Clone)]
pub struct HarnessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl HarnessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_display(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Default,
    Short,
}
