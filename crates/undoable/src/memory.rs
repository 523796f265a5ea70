//! In-memory state accessor with failure injection
//!
//! Backs the engine's tests and lets callers exercise a plan end to end
//! without touching a real host.

use crate::accessor::StateAccessor;
use crate::error::{Error, Result};
use crate::types::{
    BALANCED_SCHEME, HIGH_PERFORMANCE_SCHEME, RegistryData, RunState, ServiceStatus, StartMode,
    ValueRead,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Host state held in memory.
///
/// Targets for failure injection use the same identifiers as
/// [`crate::Action::target`]: `"<path>\\<name>"` for values, the service
/// name for services.
#[derive(Debug, Default)]
pub struct MemoryAccessor {
    values: RefCell<BTreeMap<(String, String), RegistryData>>,
    services: RefCell<BTreeMap<String, ServiceStatus>>,
    active_scheme: RefCell<Option<String>>,
    schemes: RefCell<BTreeSet<String>>,
    created_from_template: RefCell<BTreeMap<String, String>>,
    failing_reads: RefCell<HashSet<String>>,
    failing_writes: RefCell<HashSet<String>>,
    denied_writes: RefCell<HashSet<String>>,
    scheme_creation_fails: Cell<bool>,
    active_scheme_unreadable: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryAccessor {
    pub fn new() -> Self {
        let accessor = Self::default();
        accessor.schemes.borrow_mut().extend([
            BALANCED_SCHEME.to_string(),
            HIGH_PERFORMANCE_SCHEME.to_string(),
        ]);
        accessor
    }

    pub fn with_value(self, path: &str, name: &str, value: RegistryData) -> Self {
        self.values
            .borrow_mut()
            .insert((path.to_string(), name.to_string()), value);
        self
    }

    pub fn with_service(self, name: &str, start_mode: StartMode, run_state: RunState) -> Self {
        self.services.borrow_mut().insert(
            name.to_string(),
            ServiceStatus {
                start_mode,
                run_state,
            },
        );
        self
    }

    pub fn with_active_scheme(self, id: &str) -> Self {
        self.schemes.borrow_mut().insert(id.to_string());
        *self.active_scheme.borrow_mut() = Some(id.to_string());
        self
    }

    /// Reads of `target` report [`Error::CapabilityUnavailable`]
    pub fn fail_reads_of(self, target: &str) -> Self {
        self.failing_reads.borrow_mut().insert(target.to_string());
        self
    }

    /// Writes to `target` report [`Error::ApplyFailure`]
    pub fn fail_writes_to(&self, target: &str) {
        self.failing_writes.borrow_mut().insert(target.to_string());
    }

    /// Writes to `target` report [`Error::PermissionDenied`]
    pub fn deny_writes_to(&self, target: &str) {
        self.denied_writes.borrow_mut().insert(target.to_string());
    }

    /// Clear all injected write failures
    pub fn heal(&self) {
        self.failing_writes.borrow_mut().clear();
        self.denied_writes.borrow_mut().clear();
    }

    pub fn fail_scheme_creation(self) -> Self {
        self.scheme_creation_fails.set(true);
        self
    }

    pub fn unreadable_active_scheme(self) -> Self {
        self.active_scheme_unreadable.set(true);
        self
    }

    /// Current value, bypassing failure injection
    pub fn value(&self, path: &str, name: &str) -> Option<RegistryData> {
        self.values
            .borrow()
            .get(&(path.to_string(), name.to_string()))
            .cloned()
    }

    pub fn service(&self, name: &str) -> Option<ServiceStatus> {
        self.services.borrow().get(name).copied()
    }

    pub fn active_scheme(&self) -> Option<String> {
        self.active_scheme.borrow().clone()
    }

    /// Number of successful mutating calls so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn check_read(&self, target: &str) -> Result<()> {
        if self.failing_reads.borrow().contains(target) {
            return Err(Error::CapabilityUnavailable(format!("cannot read {target}")));
        }
        Ok(())
    }

    fn check_write(&self, target: &str) -> Result<()> {
        if self.denied_writes.borrow().contains(target) {
            return Err(Error::PermissionDenied(target.to_string()));
        }
        if self.failing_writes.borrow().contains(target) {
            return Err(Error::ApplyFailure(format!("injected failure writing {target}")));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.set(self.writes.get() + 1);
    }
}

fn value_target(path: &str, name: &str) -> String {
    format!("{path}\\{name}")
}

impl StateAccessor for MemoryAccessor {
    fn read_config_value(&self, path: &str, name: &str) -> Result<ValueRead> {
        self.check_read(&value_target(path, name))?;
        Ok(match self.value(path, name) {
            Some(value) => ValueRead::present(value),
            None => ValueRead::absent(),
        })
    }

    fn write_config_value(&self, path: &str, name: &str, value: &RegistryData) -> Result<()> {
        self.check_write(&value_target(path, name))?;
        self.values
            .borrow_mut()
            .insert((path.to_string(), name.to_string()), value.clone());
        self.record_write();
        Ok(())
    }

    fn remove_config_value(&self, path: &str, name: &str) -> Result<()> {
        self.check_write(&value_target(path, name))?;
        self.values
            .borrow_mut()
            .remove(&(path.to_string(), name.to_string()));
        self.record_write();
        Ok(())
    }

    fn read_service_state(&self, name: &str) -> Result<Option<ServiceStatus>> {
        self.check_read(name)?;
        Ok(self.service(name))
    }

    fn set_service_state(
        &self,
        name: &str,
        start_mode: StartMode,
        run_state: RunState,
    ) -> Result<()> {
        self.check_write(name)?;
        let mut services = self.services.borrow_mut();
        let Some(status) = services.get_mut(name) else {
            return Err(Error::ApplyFailure(format!("service {name} does not exist")));
        };
        status.start_mode = start_mode;
        status.run_state = run_state;
        self.record_write();
        Ok(())
    }

    fn read_active_power_scheme_id(&self) -> Result<Option<String>> {
        if self.active_scheme_unreadable.get() {
            return Err(Error::CapabilityUnavailable(
                "active power scheme cannot be queried".into(),
            ));
        }
        Ok(self.active_scheme())
    }

    fn set_active_power_scheme_id(&self, id: &str) -> Result<()> {
        self.check_write(id)?;
        if !self.schemes.borrow().contains(id) {
            return Err(Error::ApplyFailure(format!("no power scheme with id {id}")));
        }
        *self.active_scheme.borrow_mut() = Some(id.to_string());
        self.record_write();
        Ok(())
    }

    fn create_scheme_from_template(&self, template_id: &str) -> Result<String> {
        if self.scheme_creation_fails.get() {
            return Err(Error::ApplyFailure(format!(
                "cannot duplicate scheme template {template_id}"
            )));
        }
        if let Some(existing) = self.created_from_template.borrow().get(template_id) {
            return Ok(existing.clone());
        }
        let id = format!("{template_id}-copy");
        self.schemes.borrow_mut().insert(id.clone());
        self.created_from_template
            .borrow_mut()
            .insert(template_id.to_string(), id.clone());
        self.record_write();
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_absent_and_present() {
        let host = MemoryAccessor::new().with_value("HKCU\\A", "x", RegistryData::Int(1));
        assert_eq!(
            host.read_config_value("HKCU\\A", "x").unwrap(),
            ValueRead::present(RegistryData::Int(1))
        );
        assert!(!host.read_config_value("HKCU\\A", "y").unwrap().exists);
    }

    #[test]
    fn test_injected_failures() {
        let host = MemoryAccessor::new().fail_reads_of("HKCU\\A\\x");
        assert!(matches!(
            host.read_config_value("HKCU\\A", "x"),
            Err(Error::CapabilityUnavailable(_))
        ));

        host.deny_writes_to("HKCU\\A\\y");
        assert!(matches!(
            host.write_config_value("HKCU\\A", "y", &RegistryData::Int(0)),
            Err(Error::PermissionDenied(_))
        ));
        assert_eq!(host.write_count(), 0);

        host.heal();
        host.write_config_value("HKCU\\A", "y", &RegistryData::Int(0))
            .unwrap();
        assert_eq!(host.write_count(), 1);
    }

    #[test]
    fn test_scheme_creation_is_stable() {
        let host = MemoryAccessor::new();
        let first = host.create_scheme_from_template("tmpl").unwrap();
        let second = host.create_scheme_from_template("tmpl").unwrap();
        assert_eq!(first, second);
        host.set_active_power_scheme_id(&first).unwrap();
        assert_eq!(host.active_scheme(), Some(first));
    }
}
