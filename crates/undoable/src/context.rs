//! Collaborator traits threaded into the executor and reverter
//!
//! These keep the engine free of terminal, file-layout and report-format
//! concerns: the caller decides how progress is shown and where artifacts go.

use crate::action::Action;
use crate::error::{Error, Result};
use crate::snapshot::HostSnapshot;
use crate::types::{ActionOutcome, ReportKind};
use std::path::PathBuf;

/// Which direction a pass runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Apply,
    Revert,
}

/// Progress callback for apply and revert passes
pub trait ProgressCallback {
    /// Called once before the first action
    fn on_pass_start(&mut self, pass: Pass, count: usize);

    /// Called before each action is attempted
    fn on_action_start(&mut self, index: usize, action: &Action);

    /// Called after each action with its recorded outcome
    fn on_action_complete(&mut self, index: usize, outcome: &ActionOutcome);

    /// Called once after the last action
    fn on_pass_complete(&mut self, outcomes: &[ActionOutcome]);
}

/// Destination for the non-mutating artifacts produced by Report and
/// Snapshot actions
pub trait ArtifactSink {
    /// Persist a captured snapshot, returning where it was written
    fn write_snapshot(&mut self, snapshot: &HostSnapshot) -> Result<PathBuf>;

    /// Produce a point-in-time report, returning where it was written
    fn write_report(&mut self, kind: ReportKind) -> Result<PathBuf>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_pass_start(&mut self, _pass: Pass, _count: usize) {}
    fn on_action_start(&mut self, _index: usize, _action: &Action) {}
    fn on_action_complete(&mut self, _index: usize, _outcome: &ActionOutcome) {}
    fn on_pass_complete(&mut self, _outcomes: &[ActionOutcome]) {}
}

/// Artifact sink with nowhere to write; used for dry runs, which never
/// produce artifacts
pub struct NoArtifacts;

impl ArtifactSink for NoArtifacts {
    fn write_snapshot(&mut self, snapshot: &HostSnapshot) -> Result<PathBuf> {
        Err(Error::CapabilityUnavailable(format!(
            "no destination for {}",
            snapshot.stage.file_name()
        )))
    }

    fn write_report(&mut self, kind: ReportKind) -> Result<PathBuf> {
        Err(Error::CapabilityUnavailable(format!(
            "no destination for {}",
            kind.file_name()
        )))
    }
}
