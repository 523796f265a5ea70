//! `hosttune show` - print a run's manifest and results

use anyhow::Result;
use colored::Colorize;
use undoable::PassResults;

use crate::Context;
use crate::cli::ShowArgs;
use crate::config::HostTuneConfig;
use crate::ui;

pub fn run(_ctx: &Context, args: ShowArgs) -> Result<()> {
    let config = HostTuneConfig::load()?;
    let store = super::open_store(&args.root, &config)?;
    let run = super::resolve_run(&store, args.run.as_deref())?;
    let manifest = run.load_manifest()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    ui::header(&format!("Run {}", manifest.run_id));
    ui::kv("Directory", &run.path().display().to_string());
    ui::kv("Profile", &manifest.profile.to_string());
    ui::kv(
        "Features",
        &manifest
            .features
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    );
    ui::kv("Host", &format!("{} ({})", manifest.host, manifest.user));
    ui::kv(
        "Created",
        &manifest
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    );
    ui::kv("Tool version", &manifest.tool_version);

    ui::section("Actions");
    for (index, action) in manifest.actions.actions.iter().enumerate() {
        println!("  {:>2}. {}", index + 1, action.describe());
    }
    for skipped in &manifest.actions.skipped {
        println!(
            "      {} {} - {}",
            "○".dimmed(),
            skipped.feature,
            skipped.reason.dimmed()
        );
    }

    print_results("Apply results", run.load_results()?);
    print_results("Revert results", run.load_revert_results()?);
    Ok(())
}

fn print_results(title: &str, results: Option<PassResults>) {
    ui::section(title);
    let Some(results) = results else {
        ui::dim("none");
        return;
    };
    ui::outcomes(&results.outcomes);
    ui::summary(title, &results.summary);
}
