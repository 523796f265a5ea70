//! Broad point-in-time read of the host for before/after comparison

use crate::accessor::StateAccessor;
use crate::planner::catalog_targets;
use crate::types::{ServiceStatus, SnapshotStage, ValueRead};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configuration value as seen at capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<ValueRead>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One service as seen at capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything the feature catalog can touch, read at one moment.
///
/// Read failures are recorded per entry; a snapshot never fails as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub stage: SnapshotStage,
    pub taken_at: DateTime<Utc>,
    pub active_power_scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_error: Option<String>,
    pub values: Vec<ValueEntry>,
    pub services: Vec<ServiceEntry>,
}

impl HostSnapshot {
    pub fn capture<A: StateAccessor + ?Sized>(stage: SnapshotStage, accessor: &A) -> Self {
        let (value_targets, service_targets) = catalog_targets();

        let values = value_targets
            .into_iter()
            .map(|(path, name)| {
                let (read, error) = match accessor.read_config_value(path, name) {
                    Ok(read) => (Some(read), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                ValueEntry {
                    path: path.to_string(),
                    name: name.to_string(),
                    read,
                    error,
                }
            })
            .collect();

        let services = service_targets
            .into_iter()
            .map(|name| match accessor.read_service_state(name) {
                Ok(status) => ServiceEntry {
                    name: name.to_string(),
                    installed: status.is_some(),
                    status,
                    error: None,
                },
                Err(e) => ServiceEntry {
                    name: name.to_string(),
                    installed: false,
                    status: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        let (active_power_scheme, power_error) = match accessor.read_active_power_scheme_id() {
            Ok(id) => (id, None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            stage,
            taken_at: Utc::now(),
            active_power_scheme,
            power_error,
            values,
            services,
        }
    }
}
