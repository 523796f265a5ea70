//! System restore point via PowerShell `Checkpoint-Computer`

use anyhow::{Context, Result};

use crate::runner;

/// Ask Windows for a restore point labelled with `description`.
///
/// Windows rate-limits restore points (one per 24h by default) and reports
/// success without creating one; that is not treated as an error here.
pub fn create(description: &str) -> Result<()> {
    let script = format!(
        "Checkpoint-Computer -Description '{}' -RestorePointType MODIFY_SETTINGS -ErrorAction Stop",
        ps_quote(description)
    );

    runner::run_capture(
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", &script],
    )
    .context("Failed to create a system restore point")?;

    log::info!("Restore point requested: {description}");
    Ok(())
}

/// Escape for a single-quoted PowerShell string
fn ps_quote(value: &str) -> String {
    value.replace('\'', "''")
}
