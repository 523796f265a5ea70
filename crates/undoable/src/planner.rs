//! Plan builder - deterministic feature → action expansion

use crate::accessor::StateAccessor;
use crate::action::Action;
use crate::error::Result;
use crate::types::{
    Feature, PowerTier, Profile, RegistryData, ReportKind, RunState, SnapshotStage, StartMode,
};
use serde::{Deserialize, Serialize};

const EXPLORER_ADVANCED: &str =
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced";
const SEARCH: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Search";
const CONTENT_DELIVERY: &str =
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\ContentDeliveryManager";
const CLOUD_CONTENT_POLICY: &str = r"HKLM\SOFTWARE\Policies\Microsoft\Windows\CloudContent";
const DELIVERY_OPTIMIZATION_POLICY: &str =
    r"HKLM\SOFTWARE\Policies\Microsoft\Windows\DeliveryOptimization";
const GAME_BAR: &str = r"HKCU\Software\Microsoft\GameBar";
const GAME_CONFIG_STORE: &str = r"HKCU\System\GameConfigStore";

/// Explicit inputs to plan construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanContext {
    pub profile: Profile,
    pub features: Vec<Feature>,
}

impl PlanContext {
    /// De-duplicates `features` (first occurrence wins); falls back to the
    /// profile's defaults when none are given
    pub fn new(profile: Profile, features: &[Feature]) -> Self {
        let features = if features.is_empty() {
            profile.default_features().to_vec()
        } else {
            Feature::dedup(features)
        };
        Self { profile, features }
    }
}

/// A feature that expanded to no actions, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFeature {
    pub feature: Feature,
    pub reason: String,
}

/// Ordered action list produced for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFeature>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn reversible_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_reversible()).count()
    }
}

// ============================================================================
// Rule table
// ============================================================================

/// Action template inside a feature rule
enum Template {
    Value {
        path: &'static str,
        name: &'static str,
        desired: u32,
    },
    Service {
        name: &'static str,
        params: fn(Profile) -> (StartMode, RunState),
    },
    Power {
        tier: fn(Profile) -> PowerTier,
    },
    Report(ReportKind),
}

struct FeatureRule {
    feature: Feature,
    /// Profiles the rule is defined for; `None` means every profile
    profiles: Option<&'static [Profile]>,
    templates: &'static [Template],
}

fn disabled_stopped(_: Profile) -> (StartMode, RunState) {
    (StartMode::Disabled, RunState::Stopped)
}

fn search_indexing_params(profile: Profile) -> (StartMode, RunState) {
    match profile {
        Profile::Gaming => (StartMode::Disabled, RunState::Stopped),
        _ => (StartMode::Automatic, RunState::Running),
    }
}

fn sysmain_params(profile: Profile) -> (StartMode, RunState) {
    match profile {
        Profile::Gaming => (StartMode::Disabled, RunState::Stopped),
        _ => (StartMode::Automatic, RunState::Running),
    }
}

fn power_tier(profile: Profile) -> PowerTier {
    match profile {
        Profile::Gaming => PowerTier::UltimatePerformance,
        _ => PowerTier::Balanced,
    }
}

static FEATURE_RULES: &[FeatureRule] = &[
    FeatureRule {
        feature: Feature::Widgets,
        profiles: None,
        templates: &[Template::Value {
            path: EXPLORER_ADVANCED,
            name: "TaskbarDa",
            desired: 0,
        }],
    },
    FeatureRule {
        feature: Feature::TaskView,
        profiles: None,
        templates: &[Template::Value {
            path: EXPLORER_ADVANCED,
            name: "ShowTaskViewButton",
            desired: 0,
        }],
    },
    FeatureRule {
        feature: Feature::SearchBox,
        profiles: None,
        templates: &[Template::Value {
            path: SEARCH,
            name: "SearchboxTaskbarMode",
            desired: 1,
        }],
    },
    FeatureRule {
        feature: Feature::FileExtensions,
        profiles: None,
        templates: &[Template::Value {
            path: EXPLORER_ADVANCED,
            name: "HideFileExt",
            desired: 0,
        }],
    },
    FeatureRule {
        feature: Feature::Tips,
        profiles: None,
        templates: &[
            Template::Value {
                path: CONTENT_DELIVERY,
                name: "SubscribedContent-338389Enabled",
                desired: 0,
            },
            Template::Value {
                path: CONTENT_DELIVERY,
                name: "SystemPaneSuggestionsEnabled",
                desired: 0,
            },
        ],
    },
    FeatureRule {
        feature: Feature::ConsumerFeatures,
        profiles: None,
        templates: &[Template::Value {
            path: CLOUD_CONTENT_POLICY,
            name: "DisableWindowsConsumerFeatures",
            desired: 1,
        }],
    },
    FeatureRule {
        feature: Feature::DeliveryOptimization,
        profiles: None,
        templates: &[Template::Value {
            path: DELIVERY_OPTIMIZATION_POLICY,
            name: "DODownloadMode",
            desired: 0,
        }],
    },
    FeatureRule {
        feature: Feature::GameMode,
        profiles: Some(&[Profile::Gaming]),
        templates: &[Template::Value {
            path: GAME_BAR,
            name: "AutoGameModeEnabled",
            desired: 1,
        }],
    },
    FeatureRule {
        feature: Feature::GameDvr,
        profiles: None,
        templates: &[Template::Value {
            path: GAME_CONFIG_STORE,
            name: "GameDVR_Enabled",
            desired: 0,
        }],
    },
    FeatureRule {
        feature: Feature::Telemetry,
        profiles: None,
        templates: &[Template::Service {
            name: "DiagTrack",
            params: disabled_stopped,
        }],
    },
    FeatureRule {
        feature: Feature::SearchIndexing,
        profiles: None,
        templates: &[Template::Service {
            name: "WSearch",
            params: search_indexing_params,
        }],
    },
    FeatureRule {
        feature: Feature::SysMain,
        profiles: Some(&[Profile::Gaming, Profile::Workstation]),
        templates: &[Template::Service {
            name: "SysMain",
            params: sysmain_params,
        }],
    },
    FeatureRule {
        feature: Feature::PowerPlan,
        profiles: None,
        templates: &[Template::Power { tier: power_tier }],
    },
    FeatureRule {
        feature: Feature::StartupReport,
        profiles: None,
        templates: &[Template::Report(ReportKind::StartupEntries)],
    },
];

fn rule_for(feature: Feature, profile: Profile) -> Option<&'static FeatureRule> {
    FEATURE_RULES.iter().find(|rule| {
        rule.feature == feature
            && rule
                .profiles
                .is_none_or(|profiles| profiles.contains(&profile))
    })
}

fn expand<A: StateAccessor + ?Sized>(
    rule: &FeatureRule,
    profile: Profile,
    accessor: &A,
) -> Result<Vec<Action>> {
    let mut actions = Vec::with_capacity(rule.templates.len());
    for template in rule.templates {
        let action = match template {
            Template::Value {
                path,
                name,
                desired,
            } => Action::registry_value(
                accessor,
                rule.feature,
                path,
                name,
                RegistryData::Int(*desired),
            )?,
            Template::Service { name, params } => {
                let (mode, state) = params(profile);
                Action::service_state(accessor, rule.feature, name, mode, state)?
            }
            Template::Power { tier } => Action::power_plan(accessor, rule.feature, tier(profile)),
            Template::Report(kind) => Action::report(rule.feature, *kind),
        };
        actions.push(action);
    }
    Ok(actions)
}

// ============================================================================
// Plan construction
// ============================================================================

/// Expand the requested features into an ordered plan.
///
/// Every action's previous state is read here, before anything is applied.
/// Features without a rule for the profile, or whose previous state cannot
/// be read, contribute no actions and are listed in [`Plan::skipped`].
/// A requested `Snapshot` wraps the whole plan in Before/After captures
/// regardless of where it appeared in the input.
pub fn build_plan<A: StateAccessor + ?Sized>(ctx: &PlanContext, accessor: &A) -> Plan {
    let mut plan = Plan::default();
    let mut wants_snapshot = false;

    for &feature in &ctx.features {
        if feature == Feature::Snapshot {
            wants_snapshot = true;
            continue;
        }

        let Some(rule) = rule_for(feature, ctx.profile) else {
            log::warn!(
                "Feature {feature} has no rule for profile {}, skipping",
                ctx.profile
            );
            plan.skipped.push(SkippedFeature {
                feature,
                reason: format!("not defined for profile {}", ctx.profile),
            });
            continue;
        };

        match expand(rule, ctx.profile, accessor) {
            Ok(actions) => {
                log::debug!("Feature {feature} expanded to {} action(s)", actions.len());
                plan.actions.extend(actions);
            }
            Err(e) => {
                log::warn!("Feature {feature} skipped, previous state not capturable: {e}");
                plan.skipped.push(SkippedFeature {
                    feature,
                    reason: e.to_string(),
                });
            }
        }
    }

    if wants_snapshot {
        plan.actions.insert(0, Action::snapshot(SnapshotStage::Before));
        plan.actions.push(Action::snapshot(SnapshotStage::After));
    }

    plan
}

/// Every configuration value and service the catalog can touch.
///
/// Snapshots read these so before/after captures cover the same ground
/// regardless of which features a run selected.
pub fn catalog_targets() -> (Vec<(&'static str, &'static str)>, Vec<&'static str>) {
    let mut values = Vec::new();
    let mut services = Vec::new();

    for rule in FEATURE_RULES {
        for template in rule.templates {
            match template {
                Template::Value { path, name, .. } => {
                    if !values.contains(&(*path, *name)) {
                        values.push((*path, *name));
                    }
                }
                Template::Service { name, .. } => {
                    if !services.contains(name) {
                        services.push(*name);
                    }
                }
                Template::Power { .. } | Template::Report(_) => {}
            }
        }
    }

    (values, services)
}
