use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::SweepError;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "inline-sweep.toml";

pub const DEFAULT_THRESHOLDS: &[u64] = &[0, 10, 20, 30, 40, 50, 60, 80, 100, 150, 200, 300, 400, 500];

/// UI tests whose inlining decisions are inspected by hand; they are noisy
/// across thresholds and kept out of the pass/fail counts.
pub const DEFAULT_SKIPS: &[&str] = &[
    "tests/ui/cve_2020_35862/cve_2020_35862_manually_inlined.rs",
    "tests/ui/cve_2020_35862/cve_2020_35862.rs",
    "tests/ui/cve_2021_38190/cve_2021_38190.rs",
];

/// Threshold knobs read by the UI test harness. All four get the same value.
pub const DEFAULT_ENV_VARS: &[&str] = &[
    "RPL_TEST_INLINE_MIR_THRESHOLD",
    "RPL_TEST_INLINE_MIR_FORWARDER_THRESHOLD",
    "RPL_TEST_INLINE_MIR_HINT_THRESHOLD",
    "RPL_TEST_CROSS_CRATE_INLINE_THRESHOLD",
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Program and leading arguments, e.g. `["cargo", "uitest"]`.
    pub harness: Vec<String>,
    pub thresholds: Vec<u64>,
    pub skip: Vec<String>,
    pub timeout_secs: u64,
    pub out_dir: PathBuf,
    pub report: PathBuf,
    pub scratch_dirs: Vec<PathBuf>,
    pub env_vars: Vec<String>,
    pub warmup: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            harness: vec!["cargo".to_string(), "uitest".to_string()],
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            skip: DEFAULT_SKIPS.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            out_dir: PathBuf::from("docs/compare"),
            report: PathBuf::from("docs/compare.yaml"),
            scratch_dirs: vec![PathBuf::from("mir_dump")],
            env_vars: DEFAULT_ENV_VARS.iter().map(|s| s.to_string()).collect(),
            warmup: true,
        }
    }
}

impl SweepConfig {
    /// Load the config from an explicit path, or from `inline-sweep.toml` in
    /// the working directory if present, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<SweepConfig, SweepError> {
        match explicit {
            Some(path) => SweepConfig::from_file(path),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    SweepConfig::from_file(implicit)
                } else {
                    Ok(SweepConfig::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<SweepConfig, SweepError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SweepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = SweepConfig::from_toml(&contents).map_err(|detail| SweepError::ConfigParse {
            path: path.to_path_buf(),
            detail,
        })?;
        debug!(path = %path.display(), "loaded sweep config");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<SweepConfig, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        if self.harness.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(SweepError::InvalidConfig {
                detail: "harness command is empty".to_string(),
            });
        }
        if self.thresholds.is_empty() {
            return Err(SweepError::InvalidConfig {
                detail: "no thresholds to sweep".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(SweepError::InvalidConfig {
                detail: "timeout must be at least one second".to_string(),
            });
        }
        let mut seen = BTreeSet::new();
        for &threshold in &self.thresholds {
            if !seen.insert(threshold) {
                return Err(SweepError::DuplicateThreshold { threshold });
            }
        }
        Ok(())
    }

    /// Arguments passed after the harness entry: `--release -- --skip a --skip b ...`.
    pub fn harness_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.harness.get(1..).unwrap_or(&[]).to_vec();
        args.push("--release".to_string());
        args.push("--".to_string());
        for name in &self.skip {
            args.push("--skip".to_string());
            args.push(name.clone());
        }
        args
    }
}

/// Parse a comma-separated threshold list such as `0,10,20`.
pub fn parse_threshold_list(s: &str) -> Result<Vec<u64>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| format!("invalid threshold '{}'", part))
        })
        .collect()
}
