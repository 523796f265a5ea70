//! Core vocabulary: profiles, features, typed state values and outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Profiles and features
// ============================================================================

/// A named bundle of default features and per-feature parameter choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    Gaming,
    Office,
    Workstation,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Gaming, Profile::Office, Profile::Workstation];

    /// Features selected when the caller names none
    pub fn default_features(self) -> &'static [Feature] {
        match self {
            Profile::Gaming => &[
                Feature::Snapshot,
                Feature::Widgets,
                Feature::Tips,
                Feature::GameMode,
                Feature::GameDvr,
                Feature::SearchIndexing,
                Feature::SysMain,
                Feature::PowerPlan,
            ],
            Profile::Office => &[
                Feature::Snapshot,
                Feature::Widgets,
                Feature::TaskView,
                Feature::FileExtensions,
                Feature::Tips,
                Feature::ConsumerFeatures,
                Feature::PowerPlan,
            ],
            Profile::Workstation => &[
                Feature::Snapshot,
                Feature::Widgets,
                Feature::FileExtensions,
                Feature::ConsumerFeatures,
                Feature::DeliveryOptimization,
                Feature::Telemetry,
                Feature::SysMain,
                Feature::PowerPlan,
                Feature::StartupReport,
            ],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Profile::Gaming => "Gaming",
            Profile::Office => "Office",
            Profile::Workstation => "Workstation",
        };
        f.write_str(name)
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown profile '{s}' (expected one of: Gaming, Office, Workstation)")
            })
    }
}

/// A named, independently selectable configuration change unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Widgets,
    TaskView,
    SearchBox,
    FileExtensions,
    Tips,
    ConsumerFeatures,
    DeliveryOptimization,
    GameMode,
    GameDvr,
    Telemetry,
    SearchIndexing,
    SysMain,
    PowerPlan,
    StartupReport,
    Snapshot,
}

impl Feature {
    pub const ALL: [Feature; 15] = [
        Feature::Widgets,
        Feature::TaskView,
        Feature::SearchBox,
        Feature::FileExtensions,
        Feature::Tips,
        Feature::ConsumerFeatures,
        Feature::DeliveryOptimization,
        Feature::GameMode,
        Feature::GameDvr,
        Feature::Telemetry,
        Feature::SearchIndexing,
        Feature::SysMain,
        Feature::PowerPlan,
        Feature::StartupReport,
        Feature::Snapshot,
    ];

    /// One-line summary for listings
    pub fn summary(self) -> &'static str {
        match self {
            Feature::Widgets => "Hide the taskbar widgets button",
            Feature::TaskView => "Hide the taskbar Task View button",
            Feature::SearchBox => "Collapse taskbar search to an icon",
            Feature::FileExtensions => "Show file extensions in Explorer",
            Feature::Tips => "Turn off tips and suggested content",
            Feature::ConsumerFeatures => "Disable consumer experience app delivery (policy)",
            Feature::DeliveryOptimization => "Disable peer-to-peer update delivery (policy)",
            Feature::GameMode => "Enable Game Mode",
            Feature::GameDvr => "Disable background game recording",
            Feature::Telemetry => "Stop and disable the telemetry service",
            Feature::SearchIndexing => "Set the search indexer service per profile",
            Feature::SysMain => "Set the SysMain prefetch service per profile",
            Feature::PowerPlan => "Activate the profile's power plan",
            Feature::StartupReport => "Write a listing of startup entries",
            Feature::Snapshot => "Capture before/after host snapshots",
        }
    }

    /// Remove duplicates, keeping the first occurrence of each feature
    pub fn dedup(features: &[Feature]) -> Vec<Feature> {
        let mut seen = Vec::with_capacity(features.len());
        for feature in features {
            if !seen.contains(feature) {
                seen.push(*feature);
            }
        }
        seen
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feat| feat.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown feature '{s}' (run `hosttune features` for the list)"))
    }
}

// ============================================================================
// Registry values
// ============================================================================

/// Registry value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    String,
}

/// Typed registry data; the type travels with the value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RegistryData {
    Int(u32),
    String(String),
}

impl RegistryData {
    pub fn value_type(&self) -> ValueType {
        match self {
            RegistryData::Int(_) => ValueType::Int,
            RegistryData::String(_) => ValueType::String,
        }
    }
}

impl fmt::Display for RegistryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryData::Int(v) => write!(f, "{v}"),
            RegistryData::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Existence-qualified registry read
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueRead {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RegistryData>,
}

impl ValueRead {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(value: RegistryData) -> Self {
        Self {
            exists: true,
            value: Some(value),
        }
    }
}

// ============================================================================
// Services
// ============================================================================

/// Normalized service start mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartMode {
    Automatic,
    /// Automatic, started shortly after boot
    AutomaticDelayed,
    Manual,
    Disabled,
}

impl StartMode {
    /// Mode keyword understood by the service control manager
    pub fn as_accessor_str(self) -> &'static str {
        match self {
            StartMode::Automatic => "auto",
            StartMode::AutomaticDelayed => "delayed-auto",
            StartMode::Manual => "demand",
            StartMode::Disabled => "disabled",
        }
    }
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for StartMode {
    type Err = String;

    /// Accepts both the normalized names and accessor spellings
    /// (`Auto`, `AUTO_START`, `Demand`, `DEMAND_START`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "automatic" | "auto_start" => Ok(StartMode::Automatic),
            "delayed-auto" | "automaticdelayed" => Ok(StartMode::AutomaticDelayed),
            "manual" | "demand" | "demand_start" => Ok(StartMode::Manual),
            "disabled" => Ok(StartMode::Disabled),
            other => Err(format!("unrecognized start mode '{other}'")),
        }
    }
}

/// Service run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Stopped,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Current state of an existing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub start_mode: StartMode,
    pub run_state: RunState,
}

// ============================================================================
// Power plans
// ============================================================================

/// Built-in Balanced scheme
pub const BALANCED_SCHEME: &str = "381b4222-f694-41f0-9685-ff5bb260df2e";
/// Built-in High performance scheme
pub const HIGH_PERFORMANCE_SCHEME: &str = "8c5e7fda-e8bf-4a96-9a85-a6e23a8c635c";
/// Hidden Ultimate Performance template; must be duplicated before activation
pub const ULTIMATE_TEMPLATE: &str = "e9a42b02-d5df-448d-aa00-03f14749eb61";
/// Display name schemes created from the Ultimate template carry
pub const ULTIMATE_TEMPLATE_NAME: &str = "Ultimate Performance";

/// Power plan tier requested by a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerTier {
    Balanced,
    HighPerformance,
    UltimatePerformance,
}

impl PowerTier {
    /// Scheme id for tiers that exist on every host
    pub fn builtin_scheme(self) -> Option<&'static str> {
        match self {
            PowerTier::Balanced => Some(BALANCED_SCHEME),
            PowerTier::HighPerformance => Some(HIGH_PERFORMANCE_SCHEME),
            PowerTier::UltimatePerformance => None,
        }
    }

    /// Template a scheme has to be created from, if any
    pub fn template(self) -> Option<&'static str> {
        match self {
            PowerTier::UltimatePerformance => Some(ULTIMATE_TEMPLATE),
            _ => None,
        }
    }

    /// Lesser tier used when the template cannot be instantiated
    pub fn fallback(self) -> PowerTier {
        match self {
            PowerTier::UltimatePerformance => PowerTier::HighPerformance,
            other => other,
        }
    }
}

impl fmt::Display for PowerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// Kind of point-in-time listing a Report action produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    StartupEntries,
}

impl ReportKind {
    /// File name inside the run directory
    pub fn file_name(self) -> &'static str {
        match self {
            ReportKind::StartupEntries => "startup-entries.csv",
        }
    }
}

/// Snapshot position within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotStage {
    Before,
    After,
}

impl SnapshotStage {
    /// File name inside the run directory
    pub fn file_name(self) -> &'static str {
        match self {
            SnapshotStage::Before => "snapshot-before.json",
            SnapshotStage::After => "snapshot-after.json",
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Per-action status recorded in results files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionStatus {
    Ok,
    Failed,
    Skipped,
}

/// Outcome of applying or reverting one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub feature: Feature,
    pub action_type: String,
    pub target: String,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ActionOutcome {
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == ActionStatus::Failed
    }
}

/// Counts per status for a finished pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub ok: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeSummary {
    pub fn from_outcomes(outcomes: &[ActionOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                ActionStatus::Ok => summary.ok += 1,
                ActionStatus::Failed => summary.failed += 1,
                ActionStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.ok + self.failed + self.skipped
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_mode_round_trip() {
        for mode in [
            StartMode::Automatic,
            StartMode::AutomaticDelayed,
            StartMode::Manual,
            StartMode::Disabled,
        ] {
            let parsed: StartMode = mode.as_accessor_str().parse().unwrap();
            assert_eq!(parsed, mode);
            let parsed: StartMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
        assert_eq!("Auto".parse::<StartMode>().unwrap(), StartMode::Automatic);
        assert_eq!("AUTO_START".parse::<StartMode>().unwrap(), StartMode::Automatic);
        assert_eq!("DEMAND_START".parse::<StartMode>().unwrap(), StartMode::Manual);
        assert_eq!(
            "delayed-auto".parse::<StartMode>().unwrap(),
            StartMode::AutomaticDelayed
        );
        assert!("boot".parse::<StartMode>().is_err());
    }

    #[test]
    fn test_feature_parse_case_insensitive() {
        assert_eq!("widgets".parse::<Feature>().unwrap(), Feature::Widgets);
        assert_eq!("SearchIndexing".parse::<Feature>().unwrap(), Feature::SearchIndexing);
        assert!("Cortana".parse::<Feature>().is_err());
        assert_eq!("gaming".parse::<Profile>().unwrap(), Profile::Gaming);
        assert!("server".parse::<Profile>().is_err());
    }

    #[test]
    fn test_feature_dedup_preserves_order() {
        let deduped = Feature::dedup(&[
            Feature::PowerPlan,
            Feature::Widgets,
            Feature::PowerPlan,
            Feature::Tips,
            Feature::Widgets,
        ]);
        assert_eq!(deduped, vec![Feature::PowerPlan, Feature::Widgets, Feature::Tips]);
    }

    #[test]
    fn test_registry_data_serialization() {
        let json = serde_json::to_string(&RegistryData::Int(0)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":0}"#);

        let back: RegistryData = serde_json::from_str(r#"{"type":"string","value":"x"}"#).unwrap();
        assert_eq!(back, RegistryData::String("x".into()));
        assert_eq!(back.value_type(), ValueType::String);
    }

    #[test]
    fn test_power_tier_fallback() {
        assert_eq!(PowerTier::UltimatePerformance.fallback(), PowerTier::HighPerformance);
        assert_eq!(
            PowerTier::UltimatePerformance.fallback().builtin_scheme(),
            Some(HIGH_PERFORMANCE_SCHEME)
        );
        assert_eq!(PowerTier::UltimatePerformance.template(), Some(ULTIMATE_TEMPLATE));
        assert_eq!(PowerTier::Balanced.template(), None);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&ActionStatus::Ok).unwrap(), r#""OK""#);
        assert_eq!(serde_json::to_string(&ActionStatus::Failed).unwrap(), r#""FAILED""#);
    }

    #[test]
    fn test_every_profile_default_is_unique() {
        for profile in Profile::ALL {
            let defaults = profile.default_features();
            assert_eq!(Feature::dedup(defaults).len(), defaults.len());
        }
    }
}
