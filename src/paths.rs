//! Centralized path resolution for hosttune
//!
//! # Environment Variables
//!
//! - `HOSTTUNE_CONFIG_DIR` - Override config directory
//! - `HOSTTUNE_STATE_DIR` - Override state directory
//! - `HOSTTUNE_BACKUP_ROOT` - Override where run directories are created
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `HOSTTUNE_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/hosttune` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\hosttune`
//!    - macOS/Linux: `~/.config/hosttune`
//!
//! For state_dir():
//! 1. `HOSTTUNE_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/hosttune` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\hosttune`
//!    - macOS/Linux: `~/.local/state/hosttune`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "hosttune";

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "HOSTTUNE_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "HOSTTUNE_STATE_DIR";

/// Environment variable for backup root override
pub const ENV_BACKUP_ROOT: &str = "HOSTTUNE_BACKUP_ROOT";

/// Get the hosttune config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join(APP_DIR);
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the hosttune state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            let path = local_app_data.join(APP_DIR);
            log::debug!("Using Windows state dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Resolve the backup root holding run directories.
///
/// Priority:
/// 1. `--backup-root` flag
/// 2. `HOSTTUNE_BACKUP_ROOT` env var
/// 3. `backup_root` in config.toml
/// 4. `<state_dir>/runs`
pub fn backup_root(flag: Option<&Path>, configured: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = flag {
        log::debug!("Using backup root from flag: {}", path.display());
        return Ok(path.to_path_buf());
    }

    if let Ok(dir) = std::env::var(ENV_BACKUP_ROOT) {
        let path = expand(&dir);
        log::debug!(
            "Using backup root from {}: {}",
            ENV_BACKUP_ROOT,
            path.display()
        );
        return Ok(path);
    }

    if let Some(dir) = configured {
        let path = expand(dir);
        log::debug!("Using backup root from config: {}", path.display());
        return Ok(path);
    }

    Ok(state_dir()?.join("runs"))
}

/// Expand ~ and environment variables in a path string
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to run a test with temporary env var
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    /// Helper to run a test with env var removed
    fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: Tests run in isolation
            unsafe { env::set_var(key, v) };
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/hosttune/config", || {
            let result = config_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/hosttune/config"));
        });
    }

    #[test]
    fn test_state_dir_env_override() {
        with_env_var(ENV_STATE_DIR, "/custom/hosttune/state", || {
            let result = state_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/hosttune/state"));
        });
    }

    #[test]
    fn test_backup_root_priority() {
        with_env_var(ENV_BACKUP_ROOT, "/from/env", || {
            let flagged = backup_root(Some(Path::new("/from/flag")), Some("/from/config")).unwrap();
            assert_eq!(flagged, PathBuf::from("/from/flag"));

            let from_env = backup_root(None, Some("/from/config")).unwrap();
            assert_eq!(from_env, PathBuf::from("/from/env"));
        });

        without_env_var(ENV_BACKUP_ROOT, || {
            let configured = backup_root(None, Some("/from/config")).unwrap();
            assert_eq!(configured, PathBuf::from("/from/config"));

            let fallback = backup_root(None, None).unwrap();
            assert!(fallback.ends_with("runs"));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_HOSTTUNE_VAR_12345/file");
        assert_eq!(
            result,
            PathBuf::from("/path/$NONEXISTENT_HOSTTUNE_VAR_12345/file")
        );
    }
}
