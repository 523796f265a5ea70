//! `hosttune apply` - plan, persist, then apply a profile's features

use anyhow::{Context as AnyhowContext, Result};
use chrono::{Local, Utc};
use colored::Colorize;
use undoable::{
    ExecuteOptions, NoArtifacts, OutcomeSummary, Plan, PlanContext, Profile, RunManifest,
    SCHEMA_VERSION, build_plan, execute, session,
};

use crate::Context;
use crate::artifacts::RunArtifacts;
use crate::cli::ApplyArgs;
use crate::config::HostTuneConfig;
use crate::host::{self, WindowsAccessor, preflight, restore_point};
use crate::progress::TerminalProgress;
use crate::ui;

/// Flag, then config, then Workstation
fn resolve_profile(flag: Option<Profile>, config: &HostTuneConfig) -> Result<Profile> {
    if let Some(profile) = flag {
        return Ok(profile);
    }
    Ok(config.default_profile()?.unwrap_or(Profile::Workstation))
}

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let config = HostTuneConfig::load()?;
    let profile = resolve_profile(args.profile, &config)?;
    if args.force {
        log::debug!("--force has no effect");
    }

    preflight::check(args.dry_run)?;
    let accessor = WindowsAccessor::new().context("Failed to prepare output parsers")?;

    let plan_ctx = PlanContext::new(profile, &args.features);
    let mut plan = build_plan(&plan_ctx, &accessor);

    if !ctx.quiet {
        print_plan(profile, &plan);
    }
    if plan.is_empty() {
        ui::info("Nothing to do");
        return Ok(());
    }

    if args.dry_run {
        let mut progress = TerminalProgress::new(ctx.quiet);
        let outcomes = execute(
            &mut plan,
            &accessor,
            &mut NoArtifacts,
            &ExecuteOptions { dry_run: true },
            &mut progress,
        );
        ui::summary("Dry run", &OutcomeSummary::from_outcomes(&outcomes));
        return Ok(());
    }

    if !args.yes && !super::confirm("Apply these changes?")? {
        ui::info("Aborted, nothing was changed");
        return Ok(());
    }

    let store = super::open_store(&args.root, &config)?;

    if args.restore_point || config.restore_point {
        ui::info("Creating system restore point...");
        if let Err(e) = restore_point::create(&format!("hosttune {profile} profile")) {
            ui::warn(&format!("{e:#}; continuing without one"));
        }
    }

    let run = store
        .create_run(Local::now())
        .with_context(|| format!("Failed to create run in {}", store.root().display()))?;
    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        run_id: run.id().to_string(),
        created_at: Utc::now(),
        host: host::host_name(),
        user: host::user_name(),
        profile,
        features: plan_ctx.features.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        actions: plan,
    };

    let mut progress = TerminalProgress::new(ctx.quiet);
    match run.transcript() {
        Ok(transcript) => progress = progress.with_transcript(transcript),
        Err(e) => log::warn!("No transcript for run {}: {e}", run.id()),
    }
    let mut artifacts = RunArtifacts::new(&run, accessor.parser());

    let (_, results) = session::apply_run(&run, manifest, &accessor, &mut artifacts, &mut progress)
        .with_context(|| format!("Run {} did not complete", run.id()))?;

    ui::summary("Apply", &results.summary);
    println!();
    ui::kv("Run", &run.path().display().to_string());
    ui::dim(&format!(
        "Undo with: hosttune revert --run \"{}\"",
        run.path().display()
    ));

    if !results.summary.is_success() {
        anyhow::bail!("{} action(s) failed to apply", results.summary.failed);
    }
    Ok(())
}

fn print_plan(profile: Profile, plan: &Plan) {
    ui::header(&format!("Plan for {profile} profile"));

    for (index, action) in plan.actions.iter().enumerate() {
        println!(
            "  {:>2}. {} {}",
            index + 1,
            action.feature().to_string().bold(),
            action.describe()
        );
    }

    if !plan.skipped.is_empty() {
        ui::section("Skipped features");
        for skipped in &plan.skipped {
            ui::kv(&skipped.feature.to_string(), &skipped.reason);
        }
    }

    println!();
    ui::dim(&format!(
        "{} action(s), {} reversible",
        plan.len(),
        plan.reversible_count()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_resolution_order() {
        let config = HostTuneConfig {
            profile: Some("office".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_profile(Some(Profile::Gaming), &config).unwrap(),
            Profile::Gaming
        );
        assert_eq!(resolve_profile(None, &config).unwrap(), Profile::Office);
        assert_eq!(
            resolve_profile(None, &HostTuneConfig::default()).unwrap(),
            Profile::Workstation
        );
    }

    #[test]
    fn test_bad_configured_profile() {
        let config = HostTuneConfig {
            profile: Some("turbo".into()),
            ..Default::default()
        };
        assert!(resolve_profile(None, &config).is_err());
    }
}
