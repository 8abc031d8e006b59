// src/services/plans.rs

use std::{collections::HashMap, fmt, path::Path};

use crate::models::{
    mode::GameMode,
    usage::{FeatureAllowance, Period, PlanLimits, is_valid_feature_key},
};

/// Plan every unknown or missing plan id falls back to.
pub const FREE_PLAN: &str = "free";
pub const PREMIUM_PLAN: &str = "premium";

/// Gated features that are not quiz modes.
pub const IMAGE_GENERATION: &str = "image-generation";
pub const PRAYER_GENERATION: &str = "prayer-generation";

#[derive(Debug)]
pub enum PlanCatalogError {
    Io(String),
    Parse(String),
    MissingFreePlan,
    /// A feature is counted daily in one plan and weekly in another.
    InconsistentPeriod(String),
    InvalidFeatureKey(String),
}

impl fmt::Display for PlanCatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanCatalogError::Io(msg) => write!(f, "cannot read plan limits: {}", msg),
            PlanCatalogError::Parse(msg) => write!(f, "invalid plan limits: {}", msg),
            PlanCatalogError::MissingFreePlan => {
                write!(f, "plan limits must define a '{}' plan", FREE_PLAN)
            }
            PlanCatalogError::InconsistentPeriod(feature) => {
                write!(f, "feature '{}' uses different periods across plans", feature)
            }
            PlanCatalogError::InvalidFeatureKey(feature) => write!(
                f,
                "feature key '{}' must be lowercase letters, digits and '-'",
                feature
            ),
        }
    }
}

impl std::error::Error for PlanCatalogError {}

/// All subscription plans, loaded once at startup.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: HashMap<String, PlanLimits>,
    free: PlanLimits,
}

impl PlanCatalog {
    pub fn new(plans: HashMap<String, PlanLimits>) -> Result<Self, PlanCatalogError> {
        let free = plans
            .get(FREE_PLAN)
            .cloned()
            .ok_or(PlanCatalogError::MissingFreePlan)?;

        let mut periods: HashMap<&str, Period> = HashMap::new();
        for limits in plans.values() {
            for (feature, allowance) in &limits.features {
                if !is_valid_feature_key(feature) {
                    return Err(PlanCatalogError::InvalidFeatureKey(feature.clone()));
                }
                if let FeatureAllowance::Limited { period, .. } = allowance {
                    if *periods.entry(feature.as_str()).or_insert(*period) != *period {
                        return Err(PlanCatalogError::InconsistentPeriod(feature.clone()));
                    }
                }
            }
        }

        Ok(Self { plans, free })
    }

    /// Free: three games of each mode per day, two illustrations a week,
    /// one generated prayer a day. Premium: everything unlimited.
    pub fn builtin() -> Self {
        let mut free = HashMap::new();
        for mode in GameMode::ALL {
            free.insert(
                mode.feature_key().to_string(),
                FeatureAllowance::limited(3, Period::Daily),
            );
        }
        free.insert(
            IMAGE_GENERATION.to_string(),
            FeatureAllowance::limited(2, Period::Weekly),
        );
        free.insert(
            PRAYER_GENERATION.to_string(),
            FeatureAllowance::limited(1, Period::Daily),
        );

        let premium: HashMap<String, FeatureAllowance> = free
            .keys()
            .map(|k| (k.clone(), FeatureAllowance::Unlimited))
            .collect();

        let free = PlanLimits { features: free };
        let mut plans = HashMap::new();
        plans.insert(FREE_PLAN.to_string(), free.clone());
        plans.insert(PREMIUM_PLAN.to_string(), PlanLimits { features: premium });

        Self { plans, free }
    }

    /// JSON object of plan id to [`PlanLimits`].
    pub fn from_json(json: &str) -> Result<Self, PlanCatalogError> {
        let plans: HashMap<String, PlanLimits> =
            serde_json::from_str(json).map_err(|e| PlanCatalogError::Parse(e.to_string()))?;
        Self::new(plans)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanCatalogError> {
        let json = std::fs::read_to_string(path).map_err(|e| PlanCatalogError::Io(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Limits of `plan`; absent or unknown plans get the free tier.
    pub fn resolve(&self, plan: Option<&str>) -> &PlanLimits {
        plan.and_then(|p| self.plans.get(p)).unwrap_or(&self.free)
    }

    /// Whether any plan mentions `feature_key`.
    pub fn knows(&self, feature_key: &str) -> bool {
        self.plans
            .values()
            .any(|limits| limits.features.contains_key(feature_key))
    }

    /// Plan id actually applied for `plan`.
    pub fn resolve_id<'a>(&self, plan: Option<&'a str>) -> &'a str {
        match plan {
            Some(p) if self.plans.contains_key(p) => p,
            _ => FREE_PLAN,
        }
    }

    /// Accounting period of a feature: the period of any plan that limits
    /// it (all agree), or daily when no plan does.
    pub fn period_for(&self, feature_key: &str) -> Period {
        self.plans
            .values()
            .find_map(|limits| match limits.allowance(feature_key) {
                FeatureAllowance::Limited { period, .. } => Some(period),
                FeatureAllowance::Unlimited => None,
            })
            .unwrap_or(Period::Daily)
    }
}
