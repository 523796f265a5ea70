use anyhow::{Context, Result};
use std::io;
use std::process::{Command, Output, Stdio};

/// Captured result of a finished command, success or not
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Both streams joined, for matching error text that tools print to
    /// either one
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout.trim(), self.stderr.trim())
            .trim()
            .to_string()
    }
}

/// Run a command and capture its output without judging the exit status
pub fn output(cmd: &str, args: &[&str]) -> io::Result<CommandOutput> {
    log::trace!("exec: {} {}", cmd, args.join(" "));
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map(CommandOutput::from)
}

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = output(cmd, args)
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.success {
        Ok(output.stdout.trim().to_string())
    } else {
        match output.code {
            Some(code) => anyhow::bail!("Command exited with {code}: {}", output.combined()),
            None => anyhow::bail!("Command was terminated: {}", output.combined()),
        }
    }
}

/// Run a command silently, returning success/failure
pub fn run_quiet(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check if a command exists on PATH
pub fn command_exists(cmd: &str) -> bool {
    let locator = if cfg!(windows) { "where" } else { "which" };
    run_quiet(locator, &[cmd])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_trims_streams() {
        let out = CommandOutput {
            stdout: "  \n".into(),
            stderr: "ERROR: Access is denied.\r\n".into(),
            code: Some(1),
            success: false,
        };
        assert_eq!(out.combined(), "ERROR: Access is denied.");
    }

    #[test]
    fn test_missing_command_is_not_found() {
        assert!(!command_exists("hosttune-no-such-command-12345"));
        assert!(output("hosttune-no-such-command-12345", &[]).is_err());
    }
}
