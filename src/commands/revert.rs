//! `hosttune revert` - restore what a previous run changed

use anyhow::{Context as AnyhowContext, Result};
use undoable::{OutcomeSummary, RunManifest, session};

use crate::Context;
use crate::cli::RevertArgs;
use crate::config::HostTuneConfig;
use crate::host::{WindowsAccessor, preflight};
use crate::progress::TerminalProgress;
use crate::ui;

pub fn run(ctx: &Context, args: RevertArgs) -> Result<()> {
    let config = HostTuneConfig::load()?;
    let store = super::open_store(&args.root, &config)?;
    let run = super::resolve_run(&store, args.run.as_deref())?;

    if args.dry_run {
        let mut progress = TerminalProgress::new(ctx.quiet);
        let (manifest, outcomes) = session::preview_revert(&run, &mut progress)?;
        if !ctx.quiet {
            print_header(&manifest);
        }
        ui::summary("Revert preview", &OutcomeSummary::from_outcomes(&outcomes));
        return Ok(());
    }

    // Surface a missing or unreadable manifest before any prompt
    let manifest = run.load_manifest()?;
    if !ctx.quiet {
        print_header(&manifest);
        for action in &manifest.actions.actions {
            println!("  • {}", action.describe_revert());
        }
        println!();
    }

    preflight::check(false)?;
    let accessor = WindowsAccessor::new().context("Failed to prepare output parsers")?;

    if !args.yes && !super::confirm(&format!("Revert run {}?", run.id()))? {
        ui::info("Aborted, nothing was changed");
        return Ok(());
    }

    let mut progress = TerminalProgress::new(ctx.quiet);
    match run.transcript() {
        Ok(transcript) => progress = progress.with_transcript(transcript),
        Err(e) => log::warn!("No transcript for run {}: {e}", run.id()),
    }

    let (_, results) = session::revert_run(&run, &accessor, &mut progress)
        .with_context(|| format!("Failed to revert run {}", run.id()))?;

    ui::summary("Revert", &results.summary);

    if !results.summary.is_success() {
        anyhow::bail!("{} action(s) failed to revert", results.summary.failed);
    }
    ui::success(&format!("Run {} reverted", run.id()));
    Ok(())
}

fn print_header(manifest: &RunManifest) {
    ui::header(&format!("Revert run {}", manifest.run_id));
    ui::kv("Profile", &manifest.profile.to_string());
    ui::kv("Host", &manifest.host);
    ui::kv(
        "Created",
        &manifest
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    );
    ui::kv(
        "Reversible",
        &format!(
            "{} of {} action(s)",
            manifest.actions.reversible_count(),
            manifest.actions.len()
        ),
    );
    println!();
}
