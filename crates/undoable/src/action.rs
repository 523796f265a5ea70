//! Action model - one typed unit of planned change paired with captured prior state
//!
//! Actions are a closed sum type. Apply, revert and describe are exhaustive
//! matches over it, so a new kind is added by extending the enum and those
//! three handlers together.

use crate::accessor::StateAccessor;
use crate::error::Result;
use crate::types::{
    ActionOutcome, ActionStatus, Feature, PowerTier, RegistryData, ReportKind, RunState,
    ServiceStatus, SnapshotStage, StartMode, ValueRead,
};
use serde::{Deserialize, Serialize};

/// Service state captured before mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousService {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_mode: Option<StartMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_state: Option<RunState>,
}

impl From<ServiceStatus> for PreviousService {
    fn from(status: ServiceStatus) -> Self {
        Self {
            exists: true,
            start_mode: Some(status.start_mode),
            run_state: Some(status.run_state),
        }
    }
}

/// One planned change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    RegistryValue {
        feature: Feature,
        path: String,
        name: String,
        desired: RegistryData,
        previous: ValueRead,
    },
    ServiceState {
        feature: Feature,
        name: String,
        desired_start_mode: StartMode,
        desired_run_state: RunState,
        previous: PreviousService,
    },
    ServiceMissing {
        feature: Feature,
        name: String,
    },
    PowerPlan {
        feature: Feature,
        desired_tier: PowerTier,
        previous_active_id: Option<String>,
        /// Filled in at apply time with the scheme actually activated
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved_id: Option<String>,
    },
    Report {
        feature: Feature,
        report: ReportKind,
    },
    Snapshot {
        feature: Feature,
        stage: SnapshotStage,
    },
}

impl Action {
    /// Plan a configuration value write, reading the current value first
    pub fn registry_value<A: StateAccessor + ?Sized>(
        accessor: &A,
        feature: Feature,
        path: &str,
        name: &str,
        desired: RegistryData,
    ) -> Result<Self> {
        let previous = accessor.read_config_value(path, name)?;
        Ok(Action::RegistryValue {
            feature,
            path: path.to_string(),
            name: name.to_string(),
            desired,
            previous,
        })
    }

    /// Plan a service state change; yields `ServiceMissing` if the service
    /// is not installed on this host
    pub fn service_state<A: StateAccessor + ?Sized>(
        accessor: &A,
        feature: Feature,
        name: &str,
        desired_start_mode: StartMode,
        desired_run_state: RunState,
    ) -> Result<Self> {
        match accessor.read_service_state(name)? {
            Some(status) => Ok(Action::ServiceState {
                feature,
                name: name.to_string(),
                desired_start_mode,
                desired_run_state,
                previous: status.into(),
            }),
            None => Ok(Action::ServiceMissing {
                feature,
                name: name.to_string(),
            }),
        }
    }

    /// Plan a power plan switch.
    ///
    /// A failed read of the active scheme is not fatal: the action is built
    /// without a previous id and its revert is skipped.
    pub fn power_plan<A: StateAccessor + ?Sized>(
        accessor: &A,
        feature: Feature,
        desired_tier: PowerTier,
    ) -> Self {
        let previous_active_id = match accessor.read_active_power_scheme_id() {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Could not read the active power scheme: {e}");
                None
            }
        };

        Action::PowerPlan {
            feature,
            desired_tier,
            previous_active_id,
            resolved_id: None,
        }
    }

    pub fn report(feature: Feature, report: ReportKind) -> Self {
        Action::Report { feature, report }
    }

    pub fn snapshot(stage: SnapshotStage) -> Self {
        Action::Snapshot {
            feature: Feature::Snapshot,
            stage,
        }
    }

    /// Feature this action was expanded from
    pub fn feature(&self) -> Feature {
        match self {
            Action::RegistryValue { feature, .. }
            | Action::ServiceState { feature, .. }
            | Action::ServiceMissing { feature, .. }
            | Action::PowerPlan { feature, .. }
            | Action::Report { feature, .. }
            | Action::Snapshot { feature, .. } => *feature,
        }
    }

    /// Action type label used in results files
    pub fn kind_name(&self) -> &'static str {
        match self {
            Action::RegistryValue { .. } => "RegistryValue",
            Action::ServiceState { .. } => "ServiceState",
            Action::ServiceMissing { .. } => "ServiceMissing",
            Action::PowerPlan { .. } => "PowerPlan",
            Action::Report { .. } => "Report",
            Action::Snapshot { .. } => "Snapshot",
        }
    }

    /// What the action touches
    pub fn target(&self) -> String {
        match self {
            Action::RegistryValue { path, name, .. } => format!("{path}\\{name}"),
            Action::ServiceState { name, .. } | Action::ServiceMissing { name, .. } => {
                name.clone()
            }
            Action::PowerPlan { .. } => "active power scheme".to_string(),
            Action::Report { report, .. } => report.file_name().to_string(),
            Action::Snapshot { stage, .. } => stage.file_name().to_string(),
        }
    }

    /// Intended apply operation, used for previews and logs
    pub fn describe(&self) -> String {
        match self {
            Action::RegistryValue {
                path,
                name,
                desired,
                previous,
                ..
            } => {
                let from = match &previous.value {
                    Some(value) if previous.exists => value.to_string(),
                    _ => "(absent)".to_string(),
                };
                format!("Set {path}\\{name} = {desired} (was {from})")
            }
            Action::ServiceState {
                name,
                desired_start_mode,
                desired_run_state,
                previous,
                ..
            } => format!(
                "Set service {name} to {desired_start_mode}/{desired_run_state} (was {})",
                describe_service(previous)
            ),
            Action::ServiceMissing { name, .. } => {
                format!("Service {name} is not installed, nothing to change")
            }
            Action::PowerPlan {
                desired_tier,
                previous_active_id,
                ..
            } => format!(
                "Activate {desired_tier} power plan (was {})",
                previous_active_id.as_deref().unwrap_or("unknown")
            ),
            Action::Report { report, .. } => format!("Write {}", report.file_name()),
            Action::Snapshot { stage, .. } => format!("Capture {}", stage.file_name()),
        }
    }

    /// Intended revert operation, used for previews and logs
    pub fn describe_revert(&self) -> String {
        match self {
            Action::RegistryValue {
                path,
                name,
                previous,
                ..
            } => match &previous.value {
                Some(value) if previous.exists => format!("Restore {path}\\{name} = {value}"),
                _ => format!("Remove {path}\\{name}"),
            },
            Action::ServiceState { name, previous, .. } => {
                format!("Restore service {name} to {}", describe_service(previous))
            }
            Action::PowerPlan {
                previous_active_id: Some(id),
                ..
            } => format!("Reactivate power scheme {id}"),
            Action::PowerPlan {
                previous_active_id: None,
                ..
            } => "Previous power scheme unknown, nothing to restore".to_string(),
            Action::ServiceMissing { .. } | Action::Report { .. } | Action::Snapshot { .. } => {
                format!("{} has nothing to restore", self.kind_name())
            }
        }
    }

    /// Bare outcome record for this action
    pub fn outcome(&self, status: ActionStatus) -> ActionOutcome {
        ActionOutcome {
            feature: self.feature(),
            action_type: self.kind_name().to_string(),
            target: self.target(),
            status,
            error: None,
            detail: None,
        }
    }

    /// Whether revert restores anything for this action
    pub fn is_reversible(&self) -> bool {
        match self {
            Action::RegistryValue { .. } | Action::ServiceState { .. } => true,
            Action::PowerPlan {
                previous_active_id, ..
            } => previous_active_id.is_some(),
            Action::ServiceMissing { .. } | Action::Report { .. } | Action::Snapshot { .. } => {
                false
            }
        }
    }
}

fn describe_service(previous: &PreviousService) -> String {
    match (previous.start_mode, previous.run_state) {
        (Some(mode), Some(state)) => format!("{mode}/{state}"),
        _ => "unknown".to_string(),
    }
}
