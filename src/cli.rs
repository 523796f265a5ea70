use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use undoable::{Feature, Profile};

#[derive(Parser)]
#[command(name = "hosttune")]
#[command(version)]
#[command(about = "Apply curated host configuration profiles and undo exactly what a run changed", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan, persist and apply a set of features
    Apply(ApplyArgs),

    /// Undo the changes recorded by a previous run
    Revert(RevertArgs),

    /// List run directories under the backup root
    Runs(RootArgs),

    /// Print a run's manifest and results
    Show(ShowArgs),

    /// Print the feature catalog and profile defaults
    Features,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Args, Clone, Default)]
pub struct RootArgs {
    /// Directory holding run directories
    #[arg(long, value_name = "DIR")]
    pub backup_root: Option<PathBuf>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Device profile (default: from config.toml, else Workstation)
    #[arg(short, long)]
    pub profile: Option<Profile>,

    /// Feature to apply; repeatable, order is kept and duplicates dropped.
    /// Defaults to the profile's feature list.
    #[arg(short, long = "feature", value_name = "FEATURE")]
    pub features: Vec<Feature>,

    /// Show what would be done without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Accepted for compatibility; has no effect
    #[arg(long, hide = true)]
    pub force: bool,

    /// Create a system restore point before applying
    #[arg(long)]
    pub restore_point: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub root: RootArgs,
}

#[derive(Args)]
pub struct RevertArgs {
    /// Run directory to revert (default: the latest run)
    #[arg(long, value_name = "DIR")]
    pub run: Option<PathBuf>,

    /// Show what would be restored without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub root: RootArgs,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Run directory to show (default: the latest run)
    #[arg(long, value_name = "DIR")]
    pub run: Option<PathBuf>,

    /// Print the raw manifest JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub root: RootArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_features_keep_order() {
        let cli = Cli::parse_from([
            "hosttune",
            "apply",
            "--profile",
            "gaming",
            "--feature",
            "SearchIndexing",
            "--feature",
            "widgets",
            "--feature",
            "SearchIndexing",
            "--dry-run",
        ]);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.profile, Some(Profile::Gaming));
        assert_eq!(
            args.features,
            vec![Feature::SearchIndexing, Feature::Widgets, Feature::SearchIndexing]
        );
        assert!(args.dry_run);
        assert!(!args.force);
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let result = Cli::try_parse_from(["hosttune", "apply", "--feature", "Bluetooth"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_revert_with_explicit_run() {
        let cli = Cli::parse_from(["hosttune", "-v", "revert", "--run", "runs/2026-01-30_090000"]);
        assert_eq!(cli.verbose, 1);
        let Command::Revert(args) = cli.command else {
            panic!("expected revert");
        };
        assert_eq!(args.run, Some(PathBuf::from("runs/2026-01-30_090000")));
    }
}
