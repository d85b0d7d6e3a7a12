// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage and retrieval of the analytics snapshot.
//!
//! The snapshot holds the suite-wide [`Metrics`] and the records of flaky
//! tests. Full records of non-flaky tests are not persisted, which keeps the
//! file bounded: only their latest status is kept, so that a status flip can
//! still be detected by a later process. Run summaries (runs without their
//! individual results), per-file tallies and the failure patterns of every
//! failing test are kept alongside.
//!
//! The file is written in place: a crash mid-write can leave it corrupt, in
//! which case the next load reports an error and analytics start from
//! scratch.

use crate::{
    errors::{ClearError, LoadError, SaveError},
    metrics::Metrics,
    record::{FileStats, TestFailures, TestRecord},
    run::{TestId, TestRun, TestStatus},
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, VecDeque},
    fs, io,
};
use tracing::debug;

/// The name of the snapshot file within the state directory.
pub const SNAPSHOT_FILE_NAME: &str = "test-analytics.json";

/// Data about analytics state, serialized to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalyticsSnapshot {
    /// Version of the snapshot format.
    pub version: u32,

    /// Suite-wide metrics.
    pub metrics: Metrics,

    /// Records of tests flagged flaky.
    pub tests: BTreeMap<TestId, TestRecord>,

    /// When this snapshot was created.
    pub timestamp: DateTime<Utc>,

    /// Summaries of the runs in history, oldest first.
    #[serde(default)]
    pub runs: VecDeque<TestRun>,

    /// Per-file tallies.
    #[serde(default)]
    pub files: BTreeMap<Utf8PathBuf, FileStats>,

    /// Latest status of every test not in `tests`.
    #[serde(default)]
    pub last_statuses: BTreeMap<TestId, TestStatus>,

    /// Failure patterns of every test that has failed.
    #[serde(default)]
    pub failures: BTreeMap<TestId, TestFailures>,
}

impl AnalyticsSnapshot {
    /// Creates a snapshot at the current schema version, with no run
    /// summaries, file tallies, statuses or failure patterns.
    pub fn new(
        metrics: Metrics,
        tests: BTreeMap<TestId, TestRecord>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            version: HistoryStore::CURRENT_VERSION,
            metrics,
            tests,
            timestamp,
            runs: VecDeque::new(),
            files: BTreeMap::new(),
            last_statuses: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }
}

/// Reads just the version out of a snapshot, so that a newer or older schema
/// is reported as a version mismatch rather than as a parse error.
#[derive(Deserialize)]
struct SnapshotVersion {
    #[serde(default)]
    version: u32,
}

/// Manages persistence of the analytics snapshot.
#[derive(Clone, Debug)]
pub struct HistoryStore {
    /// Path to the snapshot file.
    path: Utf8PathBuf,
}

impl HistoryStore {
    /// Current version of the snapshot format.
    ///
    /// Snapshots without a version field are read as version 0.
    pub const CURRENT_VERSION: u32 = 1;

    /// Creates a new store backed by a file in `state_dir`.
    pub fn new(state_dir: &Utf8Path) -> Self {
        Self {
            path: state_dir.join(SNAPSHOT_FILE_NAME),
        }
    }

    /// Returns the path to the snapshot file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads the snapshot from disk.
    ///
    /// Returns `Ok(None)` if there is no snapshot.
    pub fn load(&self) -> Result<Option<AnalyticsSnapshot>, LoadError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no analytics snapshot at {}", self.path);
                return Ok(None);
            }
            Err(error) => {
                return Err(LoadError::Read {
                    path: self.path.clone(),
                    error,
                });
            }
        };

        let SnapshotVersion { version } =
            serde_json::from_str(&contents).map_err(|error| LoadError::Deserialize {
                path: self.path.clone(),
                error,
            })?;
        if version != Self::CURRENT_VERSION {
            return Err(LoadError::VersionMismatch {
                path: self.path.clone(),
                expected: Self::CURRENT_VERSION,
                actual: version,
            });
        }

        let snapshot: AnalyticsSnapshot =
            serde_json::from_str(&contents).map_err(|error| LoadError::Deserialize {
                path: self.path.clone(),
                error,
            })?;

        debug!(
            "loaded analytics snapshot from {} ({} flaky tests)",
            self.path,
            snapshot.tests.len(),
        );
        Ok(Some(snapshot))
    }

    /// Saves the snapshot to disk, creating the state directory if needed.
    pub fn save(&self, snapshot: &AnalyticsSnapshot) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| SaveError::CreateDir {
                path: parent.to_owned(),
                error,
            })?;
        }

        let contents = serde_json::to_string_pretty(snapshot)
            .map_err(|error| SaveError::Serialize { error })?;

        fs::write(&self.path, contents).map_err(|error| SaveError::Write {
            path: self.path.clone(),
            error,
        })?;

        debug!("saved analytics snapshot to {}", self.path);
        Ok(())
    }

    /// Removes the snapshot file. A missing file is not an error.
    pub fn clear(&self) -> Result<(), ClearError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ClearError::Remove {
                path: self.path.clone(),
                error,
            }),
        }
    }
}
