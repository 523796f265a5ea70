//! Run directories and the manifest persisted in each one
//!
//! Every invocation that mutates the host gets a fresh, timestamped
//! directory under the backup root. The manifest written there is the only
//! input a later revert needs.

use crate::error::{Error, Result};
use crate::planner::Plan;
use crate::types::{ActionOutcome, Feature, OutcomeSummary, Profile};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory name format for runs, sortable as plain text
pub const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Current manifest layout version
pub const SCHEMA_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const RESULTS_FILE: &str = "results.json";
pub const REVERT_RESULTS_FILE: &str = "revert-results.json";
pub const TRANSCRIPT_FILE: &str = "transcript.log";

// ============================================================================
// Persisted documents
// ============================================================================

/// Durable record of one run's plan and the context it was built in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub host: String,
    pub user: String,
    pub profile: Profile,
    pub features: Vec<Feature>,
    pub tool_version: String,
    pub actions: Plan,
}

/// Outcomes of one apply or revert pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassResults {
    pub run_id: String,
    pub completed_at: DateTime<Utc>,
    pub summary: OutcomeSummary,
    pub outcomes: Vec<ActionOutcome>,
}

impl PassResults {
    pub fn new(run_id: &str, outcomes: Vec<ActionOutcome>) -> Self {
        Self {
            run_id: run_id.to_string(),
            completed_at: Utc::now(),
            summary: OutcomeSummary::from_outcomes(&outcomes),
            outcomes,
        }
    }
}

// ============================================================================
// ManifestStore
// ============================================================================

/// Backup root holding one directory per run
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh run directory named after `now`.
    ///
    /// Fails if a directory with that name already exists; run directories
    /// are never reused.
    pub fn create_run(&self, now: DateTime<Local>) -> Result<RunDir> {
        fs::create_dir_all(&self.root)?;
        let id = now.format(RUN_ID_FORMAT).to_string();
        let path = self.root.join(&id);
        fs::create_dir(&path)?;
        log::debug!("Created run directory {}", path.display());
        Ok(RunDir { path, id })
    }

    /// Every run directory under the root, oldest first
    pub fn list_runs(&self) -> Result<Vec<RunDir>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_run_id(&name) {
                runs.push(RunDir {
                    path: entry.path(),
                    id: name,
                });
            }
        }
        runs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(runs)
    }

    /// Most recent run, by directory name
    pub fn latest_run(&self) -> Result<Option<RunDir>> {
        Ok(self.list_runs()?.pop())
    }

    /// Open an explicit run directory, which need not live under the root
    pub fn open_run(&self, path: &Path) -> RunDir {
        RunDir::open(path)
    }
}

fn is_run_id(name: &str) -> bool {
    NaiveDateTime::parse_from_str(name, RUN_ID_FORMAT).is_ok()
}

// ============================================================================
// RunDir
// ============================================================================

/// One run's directory and the files inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    path: PathBuf,
    id: String,
}

impl RunDir {
    pub fn open(path: &Path) -> Self {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path of a named file inside the run directory
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn has_manifest(&self) -> bool {
        self.artifact_path(MANIFEST_FILE).exists()
    }

    /// Persist the manifest durably: temp file, fsync, rename
    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<PathBuf> {
        let target = self.artifact_path(MANIFEST_FILE);
        let tmp = self.artifact_path(&format!("{MANIFEST_FILE}.tmp"));

        let mut file = File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, manifest)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &target)?;
        log::debug!("Wrote manifest {}", target.display());
        Ok(target)
    }

    pub fn load_manifest(&self) -> Result<RunManifest> {
        let path = self.artifact_path(MANIFEST_FILE);
        if !path.exists() {
            return Err(Error::ManifestMissing(path));
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| Error::ManifestCorrupt {
            path,
            reason: e.to_string(),
        })
    }

    pub fn write_results(&self, results: &PassResults) -> Result<PathBuf> {
        self.write_json(RESULTS_FILE, results)
    }

    pub fn write_revert_results(&self, results: &PassResults) -> Result<PathBuf> {
        self.write_json(REVERT_RESULTS_FILE, results)
    }

    /// Apply results, if this run got that far
    pub fn load_results(&self) -> Result<Option<PassResults>> {
        self.read_json(RESULTS_FILE)
    }

    pub fn load_revert_results(&self) -> Result<Option<PassResults>> {
        self.read_json(REVERT_RESULTS_FILE)
    }

    /// Write any serializable value as pretty JSON inside the run directory
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.artifact_path(name);
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');
        fs::write(&path, content)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.artifact_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Open the run's append-only transcript
    pub fn transcript(&self) -> Result<Transcript> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.artifact_path(TRANSCRIPT_FILE))?;
        Ok(Transcript { file })
    }
}

/// Plain-text, timestamped log of one run
#[derive(Debug)]
pub struct Transcript {
    file: File,
}

impl Transcript {
    pub fn line(&mut self, message: &str) -> Result<()> {
        writeln!(
            self.file,
            "{} {message}",
            Local::now().format("%Y-%m-%dT%H:%M:%S%:z")
        )?;
        Ok(())
    }
}
