//! `hosttune features` - the feature catalog and profile defaults

use anyhow::Result;
use colored::Colorize;
use undoable::{Feature, Profile};

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    if !ctx.quiet {
        ui::header("Features");
    }
    for feature in Feature::ALL {
        println!(
            "  {:<22} {}  {}",
            feature.to_string().bold(),
            profile_marks(feature),
            feature.summary().dimmed()
        );
    }

    if !ctx.quiet {
        println!();
        ui::dim("Columns mark membership in the Gaming, Office and Workstation defaults");
        ui::section("Profiles");
        for profile in Profile::ALL {
            let features: Vec<_> = profile
                .default_features()
                .iter()
                .map(ToString::to_string)
                .collect();
            ui::kv(&profile.to_string(), &features.join(", "));
        }
    }
    Ok(())
}

/// One column per profile, `G`/`O`/`W` when the feature is a default
fn profile_marks(feature: Feature) -> String {
    Profile::ALL
        .into_iter()
        .map(|profile| {
            if profile.default_features().contains(&feature) {
                profile.to_string()[..1].to_string()
            } else {
                "·".to_string()
            }
        })
        .collect()
}
