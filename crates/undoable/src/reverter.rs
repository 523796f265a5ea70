//! Revert engine - restores captured prior state from a persisted plan

use crate::accessor::StateAccessor;
use crate::action::{Action, PreviousService};
use crate::context::{Pass, ProgressCallback};
use crate::error::{Error, Result};
use crate::planner::Plan;
use crate::types::{ActionOutcome, ActionStatus};

/// What a single revert did
enum Reverted {
    Restored,
    NothingToRestore(String),
}

/// Restore the previous state of every reversible action in `plan`.
///
/// Actions are visited in plan order. Each one is independent, so a failure
/// is recorded `FAILED` and the rest still run. Non-mutating actions and
/// actions without a captured previous state are reported `SKIPPED`.
pub fn revert<A, P>(plan: &Plan, accessor: &A, progress: &mut P) -> Vec<ActionOutcome>
where
    A: StateAccessor + ?Sized,
    P: ProgressCallback + ?Sized,
{
    progress.on_pass_start(Pass::Revert, plan.len());
    let mut outcomes = Vec::with_capacity(plan.len());

    for (index, action) in plan.actions.iter().enumerate() {
        progress.on_action_start(index, action);

        let outcome = match revert_one(action, accessor) {
            Ok(Reverted::Restored) => {
                log::info!(
                    "{} [{}]: {}",
                    action.feature(),
                    action.kind_name(),
                    action.describe_revert()
                );
                action.outcome(ActionStatus::Ok)
            }
            Ok(Reverted::NothingToRestore(reason)) => {
                log::debug!("{} [{}]: {reason}", action.feature(), action.kind_name());
                action.outcome(ActionStatus::Skipped).with_detail(reason)
            }
            Err(e) => {
                let e = into_revert_error(e);
                log::error!(
                    "Reverting {} [{}] on {} failed: {e}",
                    action.feature(),
                    action.kind_name(),
                    action.target()
                );
                action.outcome(ActionStatus::Failed).with_error(e.to_string())
            }
        };

        progress.on_action_complete(index, &outcome);
        outcomes.push(outcome);
    }

    progress.on_pass_complete(&outcomes);
    outcomes
}

fn revert_one<A: StateAccessor + ?Sized>(action: &Action, accessor: &A) -> Result<Reverted> {
    match action {
        Action::RegistryValue {
            path,
            name,
            previous,
            ..
        } => {
            match &previous.value {
                Some(value) if previous.exists => accessor.write_config_value(path, name, value)?,
                _ => accessor.remove_config_value(path, name)?,
            }
            Ok(Reverted::Restored)
        }
        Action::ServiceState { name, previous, .. } => match previous {
            PreviousService {
                exists: true,
                start_mode: Some(mode),
                run_state: Some(state),
            } => {
                accessor.set_service_state(name, *mode, *state)?;
                Ok(Reverted::Restored)
            }
            _ => Ok(Reverted::NothingToRestore(format!(
                "previous state of service {name} was not captured"
            ))),
        },
        Action::PowerPlan {
            previous_active_id, ..
        } => match previous_active_id {
            Some(id) => {
                accessor.set_active_power_scheme_id(id)?;
                Ok(Reverted::Restored)
            }
            None => {
                log::warn!("Previous power scheme is unknown, leaving the active scheme as is");
                Ok(Reverted::NothingToRestore(
                    "previous power scheme unknown".to_string(),
                ))
            }
        },
        Action::ServiceMissing { .. } | Action::Report { .. } | Action::Snapshot { .. } => {
            Ok(Reverted::NothingToRestore(action.describe_revert()))
        }
    }
}

fn into_revert_error(e: Error) -> Error {
    match e {
        Error::ApplyFailure(msg) => Error::RevertFailure(msg),
        other => other,
    }
}
