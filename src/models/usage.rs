// src/models/usage.rs

use std::{collections::HashMap, num::NonZeroU32};

use serde::{Deserialize, Serialize};

/// Uses consumed by one user on one feature in the current period.
/// Stored as JSON under `usage_{user_id}_{feature_key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub count: u32,
    pub period_key: String,
}

/// Longest feature key accepted anywhere.
pub const MAX_FEATURE_KEY_LEN: usize = 64;

/// Feature keys are lowercase ASCII letters, digits and `-`.
///
/// No `_`: usage records live under `usage_{user_id}_{feature_key}`, and a
/// feature key without underscores keeps that key unique for every user id.
pub fn is_valid_feature_key(feature_key: &str) -> bool {
    !feature_key.is_empty()
        && feature_key.len() <= MAX_FEATURE_KEY_LEN
        && feature_key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Length of the accounting window for a limited feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
}

/// How much of a feature a plan grants.
///
/// JSON form: `{"type": "limited", "limit": 3, "period": "daily"}` or
/// `{"type": "unlimited"}`. A zero limit is rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeatureAllowance {
    Limited { limit: NonZeroU32, period: Period },
    Unlimited,
}

impl FeatureAllowance {
    /// Limits below 1 are raised to 1.
    pub fn limited(limit: u32, period: Period) -> Self {
        FeatureAllowance::Limited {
            limit: NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN),
            period,
        }
    }
}

/// Per-feature allowances of one subscription plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanLimits {
    pub features: HashMap<String, FeatureAllowance>,
}

impl PlanLimits {
    /// Features the plan does not mention are not gated.
    pub fn allowance(&self, feature_key: &str) -> FeatureAllowance {
        self.features
            .get(feature_key)
            .copied()
            .unwrap_or(FeatureAllowance::Unlimited)
    }
}

/// Usage summary returned to clients ("2 of 3 quizzes left today").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatus {
    pub feature: String,
    pub plan: String,
    pub allowed: bool,
    pub used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_key: Option<String>,
}
