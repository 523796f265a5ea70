//! State accessor capability interface
//!
//! The engine never touches the host directly. Every read and write of a
//! configuration value, service, or power scheme goes through this trait,
//! so the concrete implementation (command-line tools, native APIs, or the
//! in-memory [`crate::memory::MemoryAccessor`]) is swappable.

use crate::error::Result;
use crate::types::{RegistryData, RunState, ServiceStatus, StartMode, ValueRead};

/// Narrow capability interface the engine requires from its host collaborator.
///
/// All calls are blocking. Reads distinguish "absent" (`Ok` with
/// `exists == false` / `None`) from "cannot be read at all"
/// (`Err(Error::CapabilityUnavailable)`).
pub trait StateAccessor {
    /// Read a single configuration value
    fn read_config_value(&self, path: &str, name: &str) -> Result<ValueRead>;

    /// Create or overwrite a configuration value with the given typed data
    fn write_config_value(&self, path: &str, name: &str, value: &RegistryData) -> Result<()>;

    /// Remove a configuration value entirely
    fn remove_config_value(&self, path: &str, name: &str) -> Result<()>;

    /// Read a service's start mode and run state; `None` if the service does not exist
    fn read_service_state(&self, name: &str) -> Result<Option<ServiceStatus>>;

    /// Set start mode, then start or stop the service
    fn set_service_state(&self, name: &str, start_mode: StartMode, run_state: RunState)
    -> Result<()>;

    /// Identifier of the active power scheme, if one can be determined
    fn read_active_power_scheme_id(&self) -> Result<Option<String>>;

    /// Activate a power scheme by identifier
    fn set_active_power_scheme_id(&self, id: &str) -> Result<()>;

    /// Instantiate a scheme from a hidden template, returning the new identifier
    fn create_scheme_from_template(&self, template_id: &str) -> Result<String>;
}
