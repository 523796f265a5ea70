//! Whole-run orchestration: persist, execute, record
//!
//! These functions fix the ordering guarantees of a run. The manifest is on
//! disk before the first mutation, and a results file is written for every
//! pass that started.

use crate::accessor::StateAccessor;
use crate::context::{ArtifactSink, Pass, ProgressCallback};
use crate::error::Result;
use crate::executor::{ExecuteOptions, execute};
use crate::manifest::{PassResults, RunDir, RunManifest};
use crate::reverter::revert;
use crate::types::{ActionOutcome, ActionStatus};

/// Persist `manifest` into `run`, then apply its plan and record results.
///
/// The executed plan (with resolved power scheme ids) is returned inside
/// the manifest; the on-disk manifest keeps the plan as it was built.
pub fn apply_run<A, S, P>(
    run: &RunDir,
    mut manifest: RunManifest,
    accessor: &A,
    artifacts: &mut S,
    progress: &mut P,
) -> Result<(RunManifest, PassResults)>
where
    A: StateAccessor + ?Sized,
    S: ArtifactSink + ?Sized,
    P: ProgressCallback + ?Sized,
{
    run.write_manifest(&manifest)?;
    log::info!(
        "Run {} persisted with {} action(s)",
        run.id(),
        manifest.actions.len()
    );

    let outcomes = execute(
        &mut manifest.actions,
        accessor,
        artifacts,
        &ExecuteOptions::default(),
        progress,
    );

    let results = PassResults::new(run.id(), outcomes);
    run.write_results(&results)?;
    Ok((manifest, results))
}

/// Load the manifest in `run` and restore every captured previous state.
///
/// A missing or corrupt manifest is returned as an error before anything is
/// touched and no results file is written.
pub fn revert_run<A, P>(
    run: &RunDir,
    accessor: &A,
    progress: &mut P,
) -> Result<(RunManifest, PassResults)>
where
    A: StateAccessor + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let manifest = run.load_manifest()?;
    log::info!(
        "Reverting run {} ({} action(s), profile {})",
        manifest.run_id,
        manifest.actions.len(),
        manifest.profile
    );

    let outcomes = revert(&manifest.actions, accessor, progress);

    let results = PassResults::new(run.id(), outcomes);
    run.write_revert_results(&results)?;
    Ok((manifest, results))
}

/// What `revert_run` would do, without touching the host or the run
pub fn preview_revert<P: ProgressCallback + ?Sized>(
    run: &RunDir,
    progress: &mut P,
) -> Result<(RunManifest, Vec<ActionOutcome>)> {
    let manifest = run.load_manifest()?;
    let plan = &manifest.actions;

    progress.on_pass_start(Pass::Revert, plan.len());
    let outcomes: Vec<_> = plan
        .actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            progress.on_action_start(index, action);
            let outcome = action
                .outcome(ActionStatus::Skipped)
                .with_detail(format!("dry run: {}", action.describe_revert()));
            progress.on_action_complete(index, &outcome);
            outcome
        })
        .collect();
    progress.on_pass_complete(&outcomes);

    Ok((manifest, outcomes))
}
