pub mod apply;
pub mod features;
pub mod revert;
pub mod runs;
pub mod show;

use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;
use undoable::{ManifestStore, RunDir};

use crate::cli::RootArgs;
use crate::config::HostTuneConfig;
use crate::paths;

/// Open the backup root from flag, environment or config
pub(crate) fn open_store(root: &RootArgs, config: &HostTuneConfig) -> Result<ManifestStore> {
    let dir = paths::backup_root(root.backup_root.as_deref(), config.backup_root.as_deref())?;
    log::debug!("Backup root: {}", dir.display());
    Ok(ManifestStore::new(dir))
}

/// The run named by `--run`, else the latest run under the backup root
pub(crate) fn resolve_run(store: &ManifestStore, run: Option<&Path>) -> Result<RunDir> {
    if let Some(path) = run {
        return Ok(store.open_run(path));
    }

    store
        .latest_run()
        .with_context(|| format!("Failed to list runs in {}", store.root().display()))?
        .with_context(|| format!("No runs found in {}", store.root().display()))
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .context("Failed to read confirmation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    #[test]
    fn test_resolve_run_prefers_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let store = ManifestStore::new(tmp.path().join("runs"));
        let explicit = tmp.path().join("elsewhere").join("2026-01-02_030405");

        let run = resolve_run(&store, Some(&explicit)).unwrap();
        assert_eq!(run.path(), explicit);
        assert_eq!(run.id(), "2026-01-02_030405");
    }

    #[test]
    fn test_resolve_run_latest() {
        let tmp = TempDir::new().unwrap();
        let store = ManifestStore::new(tmp.path());
        let older = Local.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let newer = Local.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        store.create_run(newer).unwrap();
        store.create_run(older).unwrap();

        let run = resolve_run(&store, None).unwrap();
        assert_eq!(run.id(), "2026-03-02_090000");
    }

    #[test]
    fn test_resolve_run_without_runs() {
        let tmp = TempDir::new().unwrap();
        let store = ManifestStore::new(tmp.path().join("empty"));
        let err = resolve_run(&store, None).unwrap_err();
        assert!(err.to_string().contains("No runs found"));
    }
}
