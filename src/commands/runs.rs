//! `hosttune runs` - list run directories

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use undoable::{Error, RunDir};

use crate::Context;
use crate::cli::RootArgs;
use crate::config::HostTuneConfig;
use crate::ui;

/// Where a run stands, judged from the files in its directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunStatus {
    /// Manifest written, no apply results yet
    Incomplete,
    Applied { failed: usize },
    Reverted { failed: usize },
    Unreadable(String),
}

impl RunStatus {
    fn label(&self) -> String {
        match self {
            RunStatus::Incomplete => "incomplete".yellow().to_string(),
            RunStatus::Applied { failed: 0 } => "applied".green().to_string(),
            RunStatus::Applied { failed } => {
                format!("applied, {failed} failed").yellow().to_string()
            }
            RunStatus::Reverted { failed: 0 } => "reverted".cyan().to_string(),
            RunStatus::Reverted { failed } => {
                format!("reverted, {failed} failed").yellow().to_string()
            }
            RunStatus::Unreadable(reason) => format!("unreadable: {reason}").red().to_string(),
        }
    }
}

pub(crate) fn run_status(run: &RunDir) -> RunStatus {
    match (run.load_revert_results(), run.load_results()) {
        (Ok(Some(revert)), _) => RunStatus::Reverted {
            failed: revert.summary.failed,
        },
        (Ok(None), Ok(Some(apply))) => RunStatus::Applied {
            failed: apply.summary.failed,
        },
        (Ok(None), Ok(None)) => RunStatus::Incomplete,
        (Err(e), _) | (_, Err(e)) => RunStatus::Unreadable(e.to_string()),
    }
}

pub fn run(ctx: &Context, args: RootArgs) -> Result<()> {
    let config = HostTuneConfig::load()?;
    let store = super::open_store(&args, &config)?;
    let runs = store
        .list_runs()
        .with_context(|| format!("Failed to list runs in {}", store.root().display()))?;

    if runs.is_empty() {
        ui::info(&format!("No runs in {}", store.root().display()));
        return Ok(());
    }

    if !ctx.quiet {
        ui::header(&format!("Runs in {}", store.root().display()));
    }

    for run in runs.iter().rev() {
        for line in run_lines(run, ctx.verbose > 0) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Listing lines for one run; verbose adds the run directory
fn run_lines(run: &RunDir, verbose: bool) -> Vec<String> {
    let profile = match run.load_manifest() {
        Ok(manifest) => format!(
            "{:<12} {:>3} action(s)",
            manifest.profile.to_string(),
            manifest.actions.len()
        ),
        Err(Error::ManifestMissing(_)) => "(no manifest)".dimmed().to_string(),
        Err(e) => format!("({})", e.kind()).red().to_string(),
    };

    let mut lines = vec![format!(
        "  {}  {}  {}",
        run.id().bold(),
        profile,
        run_status(run).label()
    )];
    if verbose {
        lines.push(format!("    {}", run.path().display().to_string().dimmed()));
    }
    lines
}
