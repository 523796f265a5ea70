//! Operating assumptions checked before any plan is built

use undoable::Error;

use crate::runner;

const REQUIRED_TOOLS: &[&str] = &["reg", "sc", "powercfg"];

/// Fail with `PreconditionFailed` unless this host can be tuned.
///
/// Dry runs only read, so they skip the elevation check.
pub fn check(dry_run: bool) -> Result<(), Error> {
    if !cfg!(windows) {
        return Err(Error::PreconditionFailed(format!(
            "hosttune only runs on Windows (this is {})",
            std::env::consts::OS
        )));
    }

    let missing: Vec<_> = REQUIRED_TOOLS
        .iter()
        .copied()
        .filter(|tool| !runner::command_exists(tool))
        .collect();
    if !missing.is_empty() {
        return Err(Error::PreconditionFailed(format!(
            "required system tools not found: {}",
            missing.join(", ")
        )));
    }

    if !dry_run && !is_elevated() {
        return Err(Error::PreconditionFailed(
            "run from an elevated (Administrator) prompt, or pass --dry-run".to_string(),
        ));
    }

    log::debug!("Preflight checks passed (dry_run={dry_run})");
    Ok(())
}

/// `net session` only succeeds with administrator rights
fn is_elevated() -> bool {
    runner::run_quiet("net", &["session"])
}
