//! Execution engine - applies a plan in order with per-action failure isolation

use crate::accessor::StateAccessor;
use crate::action::Action;
use crate::context::{ArtifactSink, Pass, ProgressCallback};
use crate::error::{Error, Result};
use crate::planner::Plan;
use crate::snapshot::HostSnapshot;
use crate::types::{ActionOutcome, ActionStatus, PowerTier};

/// Options for an apply pass
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Visit every action and report the intended operation without writing
    pub dry_run: bool,
}

/// What a single successful apply did
enum Applied {
    Changed(Option<String>),
    NothingToDo(String),
}

/// Apply every action of `plan` in order.
///
/// Each action maps to one accessor write (or one artifact write for
/// Report/Snapshot). A failing action is recorded `FAILED` and the pass
/// continues; the returned outcomes always have one entry per action.
///
/// `PowerPlan` actions get their `resolved_id` filled in here.
pub fn execute<A, S, P>(
    plan: &mut Plan,
    accessor: &A,
    artifacts: &mut S,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Vec<ActionOutcome>
where
    A: StateAccessor + ?Sized,
    S: ArtifactSink + ?Sized,
    P: ProgressCallback + ?Sized,
{
    progress.on_pass_start(Pass::Apply, plan.len());
    let mut outcomes = Vec::with_capacity(plan.len());

    for (index, action) in plan.actions.iter_mut().enumerate() {
        progress.on_action_start(index, action);

        let outcome = if opts.dry_run {
            action
                .outcome(ActionStatus::Skipped)
                .with_detail(format!("dry run: {}", action.describe()))
        } else {
            apply_action(action, accessor, artifacts)
        };

        progress.on_action_complete(index, &outcome);
        outcomes.push(outcome);
    }

    progress.on_pass_complete(&outcomes);
    outcomes
}

fn apply_action<A, S>(action: &mut Action, accessor: &A, artifacts: &mut S) -> ActionOutcome
where
    A: StateAccessor + ?Sized,
    S: ArtifactSink + ?Sized,
{
    match apply_one(action, accessor, artifacts) {
        Ok(Applied::Changed(detail)) => {
            log::info!("{} [{}]: {}", action.feature(), action.kind_name(), action.describe());
            let outcome = action.outcome(ActionStatus::Ok);
            match detail {
                Some(detail) => outcome.with_detail(detail),
                None => outcome,
            }
        }
        Ok(Applied::NothingToDo(reason)) => {
            log::info!("{} [{}]: {reason}", action.feature(), action.kind_name());
            action.outcome(ActionStatus::Skipped).with_detail(reason)
        }
        Err(e) => {
            log::error!(
                "{} [{}] on {} failed ({}): {e}",
                action.feature(),
                action.kind_name(),
                action.target(),
                e.kind()
            );
            action.outcome(ActionStatus::Failed).with_error(e.to_string())
        }
    }
}

fn apply_one<A, S>(action: &mut Action, accessor: &A, artifacts: &mut S) -> Result<Applied>
where
    A: StateAccessor + ?Sized,
    S: ArtifactSink + ?Sized,
{
    match action {
        Action::RegistryValue {
            path,
            name,
            desired,
            ..
        } => {
            accessor.write_config_value(path, name, desired)?;
            Ok(Applied::Changed(None))
        }
        Action::ServiceState {
            name,
            desired_start_mode,
            desired_run_state,
            ..
        } => {
            accessor.set_service_state(name, *desired_start_mode, *desired_run_state)?;
            Ok(Applied::Changed(None))
        }
        Action::ServiceMissing { name, .. } => Ok(Applied::NothingToDo(format!(
            "service {name} is not installed"
        ))),
        Action::PowerPlan {
            desired_tier,
            resolved_id,
            ..
        } => {
            let (tier, id) = resolve_power_scheme(*desired_tier, accessor)?;
            accessor.set_active_power_scheme_id(&id)?;
            *resolved_id = Some(id.clone());
            Ok(Applied::Changed(Some(format!("activated {tier} scheme {id}"))))
        }
        Action::Report { report, .. } => {
            let path = artifacts.write_report(*report)?;
            Ok(Applied::Changed(Some(format!("wrote {}", path.display()))))
        }
        Action::Snapshot { stage, .. } => {
            let snapshot = HostSnapshot::capture(*stage, accessor);
            let path = artifacts.write_snapshot(&snapshot)?;
            Ok(Applied::Changed(Some(format!("wrote {}", path.display()))))
        }
    }
}

/// Pick the concrete scheme for a tier.
///
/// Tiers backed by a template are instantiated first; if that fails the
/// lesser built-in tier is used instead.
fn resolve_power_scheme<A: StateAccessor + ?Sized>(
    tier: PowerTier,
    accessor: &A,
) -> Result<(PowerTier, String)> {
    if let Some(id) = tier.builtin_scheme() {
        return Ok((tier, id.to_string()));
    }

    let Some(template) = tier.template() else {
        return Err(Error::ApplyFailure(format!("no scheme available for {tier}")));
    };

    match accessor.create_scheme_from_template(template) {
        Ok(id) => Ok((tier, id)),
        Err(e) => {
            let fallback = tier.fallback();
            log::warn!("Could not create {tier} scheme ({e}), falling back to {fallback}");
            fallback
                .builtin_scheme()
                .map(|id| (fallback, id.to_string()))
                .ok_or_else(|| Error::ApplyFailure(format!("no fallback scheme for {tier}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::memory::MemoryAccessor;
    use crate::planner::{PlanContext, build_plan};
    use crate::types::{
        Feature, HIGH_PERFORMANCE_SCHEME, Profile, RegistryData, ReportKind, RunState,
        SnapshotStage, StartMode, ULTIMATE_TEMPLATE,
    };
    use std::path::PathBuf;

    const ADVANCED: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced";

    /// Records artifact writes instead of touching the filesystem
    #[derive(Default)]
    struct RecordingArtifacts {
        snapshots: Vec<SnapshotStage>,
        reports: Vec<ReportKind>,
        fail_reports: bool,
    }

    impl ArtifactSink for RecordingArtifacts {
        fn write_snapshot(&mut self, snapshot: &HostSnapshot) -> Result<PathBuf> {
            self.snapshots.push(snapshot.stage);
            Ok(PathBuf::from(snapshot.stage.file_name()))
        }

        fn write_report(&mut self, kind: ReportKind) -> Result<PathBuf> {
            if self.fail_reports {
                return Err(Error::CapabilityUnavailable("startup listing".into()));
            }
            self.reports.push(kind);
            Ok(PathBuf::from(kind.file_name()))
        }
    }

    fn run(plan: &mut Plan, host: &MemoryAccessor, dry_run: bool) -> Vec<ActionOutcome> {
        execute(
            plan,
            host,
            &mut RecordingArtifacts::default(),
            &ExecuteOptions { dry_run },
            &mut NoProgress,
        )
    }

    fn statuses(outcomes: &[ActionOutcome]) -> Vec<ActionStatus> {
        outcomes.iter().map(|o| o.status).collect()
    }

    #[test]
    fn test_partial_failure_is_isolated() {
        let host = MemoryAccessor::new();
        let mut plan = build_plan(
            &PlanContext::new(
                Profile::Office,
                &[Feature::Widgets, Feature::TaskView, Feature::FileExtensions],
            ),
            &host,
        );
        host.fail_writes_to(&format!("{ADVANCED}\\ShowTaskViewButton"));

        let outcomes = run(&mut plan, &host, false);

        assert_eq!(
            statuses(&outcomes),
            vec![ActionStatus::Ok, ActionStatus::Failed, ActionStatus::Ok]
        );
        assert!(outcomes[1].error.as_deref().unwrap().contains("ShowTaskViewButton"));
        assert_eq!(host.value(ADVANCED, "HideFileExt"), Some(RegistryData::Int(0)));
        assert_eq!(host.value(ADVANCED, "ShowTaskViewButton"), None);
    }

    #[test]
    fn test_every_action_failing_still_yields_outcomes() {
        let host = MemoryAccessor::new();
        let mut plan = build_plan(
            &PlanContext::new(Profile::Office, &[Feature::Widgets, Feature::TaskView]),
            &host,
        );
        host.deny_writes_to(&format!("{ADVANCED}\\TaskbarDa"));
        host.deny_writes_to(&format!("{ADVANCED}\\ShowTaskViewButton"));

        let outcomes = run(&mut plan, &host, false);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(ActionOutcome::is_failure));
        assert!(outcomes[0].error.as_deref().unwrap().starts_with("permission denied"));
    }

    #[test]
    fn test_dry_run_visits_same_actions_without_writing() {
        let host = MemoryAccessor::new()
            .with_service("WSearch", StartMode::Automatic, RunState::Running)
            .with_active_scheme(crate::types::BALANCED_SCHEME);
        let ctx = PlanContext::new(
            Profile::Gaming,
            &[
                Feature::Snapshot,
                Feature::Widgets,
                Feature::SearchIndexing,
                Feature::PowerPlan,
                Feature::StartupReport,
            ],
        );

        let mut preview_plan = build_plan(&ctx, &host);
        let mut artifacts = RecordingArtifacts::default();
        let preview = execute(
            &mut preview_plan,
            &host,
            &mut artifacts,
            &ExecuteOptions { dry_run: true },
            &mut NoProgress,
        );
        assert_eq!(host.write_count(), 0);
        assert!(artifacts.snapshots.is_empty());
        assert!(artifacts.reports.is_empty());
        assert!(preview.iter().all(|o| o.status == ActionStatus::Skipped));
        assert!(preview[1].detail.as_deref().unwrap().starts_with("dry run: Set"));

        let mut apply_plan = build_plan(&ctx, &host);
        let applied = run(&mut apply_plan, &host, false);

        let preview_ids: Vec<_> = preview.iter().map(|o| (&o.action_type, &o.target)).collect();
        let applied_ids: Vec<_> = applied.iter().map(|o| (&o.action_type, &o.target)).collect();
        assert_eq!(preview_ids, applied_ids);
    }

    #[test]
    fn test_ultimate_falls_back_to_high_performance() {
        let host = MemoryAccessor::new()
            .with_active_scheme("original-scheme")
            .fail_scheme_creation();
        let mut plan = build_plan(&PlanContext::new(Profile::Gaming, &[Feature::PowerPlan]), &host);

        let outcomes = run(&mut plan, &host, false);

        assert_eq!(outcomes[0].status, ActionStatus::Ok);
        assert_eq!(host.active_scheme().as_deref(), Some(HIGH_PERFORMANCE_SCHEME));
        match &plan.actions[0] {
            Action::PowerPlan {
                desired_tier,
                previous_active_id,
                resolved_id,
                ..
            } => {
                assert_eq!(*desired_tier, PowerTier::UltimatePerformance);
                assert_eq!(previous_active_id.as_deref(), Some("original-scheme"));
                assert_eq!(resolved_id.as_deref(), Some(HIGH_PERFORMANCE_SCHEME));
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert!(outcomes[0].detail.as_deref().unwrap().contains("HighPerformance"));
    }

    #[test]
    fn test_ultimate_created_from_template() {
        let host = MemoryAccessor::new().with_active_scheme("original-scheme");
        let mut plan = build_plan(&PlanContext::new(Profile::Gaming, &[Feature::PowerPlan]), &host);

        run(&mut plan, &host, false);

        let expected = format!("{ULTIMATE_TEMPLATE}-copy");
        assert_eq!(host.active_scheme(), Some(expected));
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let host = MemoryAccessor::new()
            .with_value(ADVANCED, "HideFileExt", RegistryData::Int(1))
            .with_service("WSearch", StartMode::Automatic, RunState::Running)
            .with_active_scheme(crate::types::BALANCED_SCHEME);
        let ctx = PlanContext::new(
            Profile::Gaming,
            &[
                Feature::FileExtensions,
                Feature::SearchIndexing,
                Feature::PowerPlan,
            ],
        );

        let mut plan = build_plan(&ctx, &host);
        run(&mut plan, &host, false);
        let once = (
            host.value(ADVANCED, "HideFileExt"),
            host.service("WSearch"),
            host.active_scheme(),
        );

        let mut plan = plan.clone();
        run(&mut plan, &host, false);
        let twice = (
            host.value(ADVANCED, "HideFileExt"),
            host.service("WSearch"),
            host.active_scheme(),
        );

        assert_eq!(once, twice);
    }

    #[test]
    fn test_service_missing_and_artifacts() {
        let host = MemoryAccessor::new();
        let mut plan = build_plan(
            &PlanContext::new(
                Profile::Workstation,
                &[Feature::Telemetry, Feature::StartupReport, Feature::Snapshot],
            ),
            &host,
        );
        let mut artifacts = RecordingArtifacts::default();
        let outcomes = execute(
            &mut plan,
            &host,
            &mut artifacts,
            &ExecuteOptions::default(),
            &mut NoProgress,
        );

        assert_eq!(
            statuses(&outcomes),
            vec![
                ActionStatus::Ok,
                ActionStatus::Skipped,
                ActionStatus::Ok,
                ActionStatus::Ok
            ]
        );
        assert_eq!(
            artifacts.snapshots,
            vec![SnapshotStage::Before, SnapshotStage::After]
        );
        assert_eq!(artifacts.reports, vec![ReportKind::StartupEntries]);
    }

    #[test]
    fn test_report_failure_does_not_stop_pass() {
        let host = MemoryAccessor::new();
        let mut plan = build_plan(
            &PlanContext::new(
                Profile::Workstation,
                &[Feature::StartupReport, Feature::Widgets],
            ),
            &host,
        );
        let mut artifacts = RecordingArtifacts {
            fail_reports: true,
            ..Default::default()
        };
        let outcomes = execute(
            &mut plan,
            &host,
            &mut artifacts,
            &ExecuteOptions::default(),
            &mut NoProgress,
        );
        assert_eq!(
            statuses(&outcomes),
            vec![ActionStatus::Failed, ActionStatus::Ok]
        );
    }
}
