use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SweepError;
use crate::types::RunRecord;

/// Threshold -> run record, persisted as YAML with keys in ascending order.
///
/// Loading and saving go through the whole mapping: a sweep loads the prior
/// report, overwrites the thresholds it re-ran and saves everything back, so
/// thresholds that were not re-run keep their old records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: BTreeMap<u64, RunRecord>,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    /// Load the report at `path`, or an empty one if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Report, SweepError> {
        if !path.exists() {
            debug!(path = %path.display(), "no prior report, starting empty");
            return Ok(Report::new());
        }
        Report::open(path)
    }

    /// Load an existing report; a missing file is an error.
    pub fn open(path: &Path) -> Result<Report, SweepError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SweepError::ReportNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SweepError::ReportRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Report::from_yaml(&contents).map_err(|detail| SweepError::ReportParse {
            path: path.to_path_buf(),
            detail,
        })
    }

    fn from_yaml(contents: &str) -> Result<Report, String> {
        // An empty document (e.g. a truncated write) reads as an empty report.
        if contents.trim().is_empty() {
            return Ok(Report::new());
        }
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Write the full report to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), SweepError> {
        let write_err = |detail: String| SweepError::ReportWrite {
            path: path.to_path_buf(),
            detail,
        };

        let yaml = self.to_yaml().map_err(|e| write_err(e.to_string()))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("report");
        let tmp = path.with_file_name(format!(
            ".{}.tmp.{}.{}",
            name,
            std::process::id(),
            Utc::now().timestamp_micros()
        ));

        let mut file = fs::File::create(&tmp).map_err(|e| write_err(e.to_string()))?;
        file.write_all(yaml.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| write_err(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| write_err(e.to_string()))?;

        debug!(path = %path.display(), entries = self.len(), "report saved");
        Ok(())
    }

    /// Insert or overwrite the record for `threshold`.
    pub fn insert(&mut self, threshold: u64, record: RunRecord) -> Option<RunRecord> {
        self.entries.insert(threshold, record)
    }

    pub fn get(&self, threshold: u64) -> Option<&RunRecord> {
        self.entries.get(&threshold)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &RunRecord)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Last-modified time of the report file, if it can be determined.
pub fn last_modified(path: &Path) -> Option<DateTime<Utc>> {
    let mtime = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(mtime))
}
