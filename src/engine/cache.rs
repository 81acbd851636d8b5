// Probe outcomes memoized by resolved executable path

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::Unavailability;

/// Outcome of a functional probe: a version string on success
pub type ProbeVerdict = Result<Option<String>, Unavailability>;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub executable: PathBuf,
    pub verdict: ProbeVerdict,
    pub probed_at: DateTime<Local>,
}

impl ProbeRecord {
    pub fn new(executable: PathBuf, verdict: ProbeVerdict) -> Self {
        Self {
            executable,
            verdict,
            probed_at: Local::now(),
        }
    }

    pub fn pass(&self) -> bool {
        self.verdict.is_ok()
    }

    /// Version on success, failure reason otherwise
    pub fn diagnostic(&self) -> Option<String> {
        match &self.verdict {
            Ok(version) => version.clone(),
            Err(reason) => Some(reason.to_string()),
        }
    }
}

/// At most one record per executable path, kept for the process lifetime.
///
/// Not synchronized on its own: the registry only touches it while holding
/// its write lock.
#[derive(Debug, Default)]
pub struct ProbeCache {
    records: HashMap<PathBuf, ProbeRecord>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, executable: &Path) -> Option<&ProbeRecord> {
        self.records.get(executable)
    }

    /// Store a record unless the path already has one
    pub fn insert(&mut self, record: ProbeRecord) -> &ProbeRecord {
        self.records
            .entry(record.executable.clone())
            .or_insert(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of all records ordered by path
    pub fn records(&self) -> Vec<ProbeRecord> {
        let mut records: Vec<ProbeRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.executable.cmp(&b.executable));
        records
    }
}
