//! # Undoable
//!
//! A plan/apply/revert engine for point-in-time host configuration changes.
//!
//! Every change is planned as a typed [`Action`] that carries the state it
//! is about to overwrite. The plan is persisted as a run manifest before
//! anything is touched, so a later process can undo exactly what a run did.
//!
//! ## Core Concepts
//!
//! - **Feature**: A named group of related changes, selected directly or through a [`Profile`]
//! - **Action**: One unit of change plus its captured previous state
//! - **Plan**: The ordered action list for one invocation
//! - **Run directory**: Timestamped folder holding the manifest, results and artifacts
//!
//! ## Example
//!
//! ```ignore
//! use undoable::{
//!     Feature, ManifestStore, MemoryAccessor, NoProgress, PlanContext, Profile,
//!     build_plan, session,
//! };
//!
//! let host = MemoryAccessor::new();
//! let ctx = PlanContext::new(Profile::Gaming, &[Feature::Widgets, Feature::SearchIndexing]);
//! let plan = build_plan(&ctx, &host);
//!
//! let store = ManifestStore::new("/var/backups/hosttune");
//! let run = store.create_run(chrono::Local::now())?;
//! let (_, results) = session::apply_run(&run, manifest, &host, &mut sink, &mut NoProgress)?;
//!
//! // later, possibly from another process
//! let latest = store.latest_run()?.expect("a previous run");
//! session::revert_run(&latest, &host, &mut NoProgress)?;
//! ```
//!
//! ## Collaborator Traits
//!
//! - [`StateAccessor`]: Reads and writes host state
//! - [`ArtifactSink`]: Receives snapshots and reports
//! - [`ProgressCallback`]: Receives progress updates
//!
//! The engine has no terminal, platform, or report-format dependencies of
//! its own.

pub mod accessor;
pub mod action;
pub mod context;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod memory;
pub mod planner;
pub mod reverter;
pub mod session;
pub mod snapshot;
pub mod types;

// Re-export main types at crate root
pub use accessor::StateAccessor;
pub use action::{Action, PreviousService};
pub use context::{ArtifactSink, NoArtifacts, NoProgress, Pass, ProgressCallback};
pub use error::{Error, Result};
pub use executor::{ExecuteOptions, execute};
pub use manifest::{ManifestStore, PassResults, RunDir, RunManifest, SCHEMA_VERSION, Transcript};
pub use memory::MemoryAccessor;
pub use planner::{Plan, PlanContext, SkippedFeature, build_plan, catalog_targets};
pub use reverter::revert;
pub use snapshot::HostSnapshot;
pub use types::{
    BALANCED_SCHEME, HIGH_PERFORMANCE_SCHEME, ULTIMATE_TEMPLATE, ULTIMATE_TEMPLATE_NAME,
    ActionOutcome, ActionStatus, Feature, OutcomeSummary, PowerTier, Profile, RegistryData,
    ReportKind, RunState, ServiceStatus, SnapshotStage, StartMode, ValueRead, ValueType,
};
