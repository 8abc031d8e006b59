// src/services/entitlement.rs

use std::sync::Arc;

use crate::{
    models::usage::{FeatureAllowance, UsageRecord, UsageStatus, is_valid_feature_key},
    services::plans::PlanCatalog,
    store::{KeyValueStore, StoreError, usage_key},
    utils::period::{Clock, current_period_key},
};

/// Gates features by plan and counts how often they are used.
///
/// Store failures never block a user: reads that fail count as zero usage and
/// writes that fail are dropped, both logged.
///
/// `can_use` followed by `record_usage` is a read-then-write pair without a
/// lock. Two simultaneous actions by the same user on the same feature can
/// both pass the check before either is recorded.
#[derive(Clone)]
pub struct EntitlementTracker {
    store: Arc<dyn KeyValueStore>,
    plans: Arc<PlanCatalog>,
    clock: Arc<dyn Clock>,
}

impl EntitlementTracker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        plans: Arc<PlanCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            plans,
            clock,
        }
    }

    pub fn plans(&self) -> &PlanCatalog {
        &self.plans
    }

    /// Whether `user_id` may use `feature_key` once more under `plan`.
    pub async fn can_use(&self, user_id: &str, feature_key: &str, plan: Option<&str>) -> bool {
        let (limit, period) = match self.plans.resolve(plan).allowance(feature_key) {
            FeatureAllowance::Unlimited => return true,
            FeatureAllowance::Limited { limit, period } => (limit.get(), period),
        };

        let period_key = current_period_key(period, self.clock.today());
        match self.load_record(user_id, feature_key).await {
            Ok(Some(record)) if record.period_key == period_key => record.count < limit,
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    "Usage lookup failed for user {} feature {}, allowing: {}",
                    user_id,
                    feature_key,
                    e
                );
                true
            }
        }
    }

    /// Counts one use of `feature_key` in the current period.
    ///
    /// A record from an earlier period is replaced with a count of 1.
    /// Malformed feature keys are never written, so one user's record can
    /// not alias another's.
    pub async fn record_usage(&self, user_id: &str, feature_key: &str) {
        if !is_valid_feature_key(feature_key) {
            tracing::warn!(
                "Not recording usage of malformed feature key '{}' for user {}",
                feature_key,
                user_id
            );
            return;
        }

        let period_key = current_period_key(self.plans.period_for(feature_key), self.clock.today());

        let previous = match self.load_record(user_id, feature_key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    "Usage lookup failed for user {} feature {}, not recording: {}",
                    user_id,
                    feature_key,
                    e
                );
                return;
            }
        };

        let count = match previous {
            Some(record) if record.period_key == period_key => record.count.saturating_add(1),
            _ => 1,
        };
        let record = UsageRecord { count, period_key };

        if let Err(e) = self.save_record(user_id, feature_key, &record).await {
            tracing::error!(
                "Failed to record usage for user {} feature {}: {}",
                user_id,
                feature_key,
                e
            );
        }
    }

    /// Current usage of `feature_key` as shown to the user.
    pub async fn usage_status(
        &self,
        user_id: &str,
        feature_key: &str,
        plan: Option<&str>,
    ) -> UsageStatus {
        let plan_id = self.plans.resolve_id(plan).to_string();
        let period = self.plans.period_for(feature_key);
        let period_key = current_period_key(period, self.clock.today());

        let used = match self.load_record(user_id, feature_key).await {
            Ok(Some(record)) if record.period_key == period_key => record.count,
            Ok(_) => 0,
            Err(e) => {
                tracing::error!("Usage lookup failed for user {}: {}", user_id, e);
                0
            }
        };

        match self.plans.resolve(plan).allowance(feature_key) {
            FeatureAllowance::Unlimited => UsageStatus {
                feature: feature_key.to_string(),
                plan: plan_id,
                allowed: true,
                used,
                limit: None,
                remaining: None,
                period: None,
                period_key: None,
            },
            FeatureAllowance::Limited { limit, .. } => {
                let limit = limit.get();
                UsageStatus {
                    feature: feature_key.to_string(),
                    plan: plan_id,
                    allowed: used < limit,
                    used,
                    limit: Some(limit),
                    remaining: Some(limit.saturating_sub(used)),
                    period: Some(period),
                    period_key: Some(period_key),
                }
            }
        }
    }

    /// Stored record, with unreadable JSON treated as no record.
    async fn load_record(
        &self,
        user_id: &str,
        feature_key: &str,
    ) -> Result<Option<UsageRecord>, StoreError> {
        let key = usage_key(user_id, feature_key);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable usage record '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    async fn save_record(
        &self,
        user_id: &str,
        feature_key: &str,
        record: &UsageRecord,
    ) -> Result<(), StoreError> {
        let value =
            serde_json::to_string(record).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.store.set(&usage_key(user_id, feature_key), &value).await
    }
}
