use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::plans::{self, Plan};

use super::clock::{Clock, MonthKey};
use super::store::{StoreError, UsageStore};

/// Errors from the entitlement meter
#[derive(Debug, Error)]
pub enum MeterError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of resolving a user's plan assignment against the catalog
///
/// The degraded case is a tagged variant rather than an Option so every
/// caller handles it explicitly: an unrecognized plan must never crash the
/// calling flow, it just yields zero quota.
#[derive(Debug, Clone, Copy)]
pub enum PlanResolution {
    Resolved(&'static Plan),
    Unresolved,
}

/// Decision returned by `check`: a point-in-time allow/deny with the values
/// the caller needs to render an "upgrade required" message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStatus {
    pub allowed: bool,
    pub current: i64,
    pub limit: i64,
    pub plan_name: String,
}

/// Read-only usage projection for display (usage indicators, /api/usage)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub current: i64,
    pub limit: i64,
    pub plan_name: String,
}

/// The entitlement meter: decides whether a user may perform one more file
/// analysis this calendar month, and records consumption afterwards.
///
/// All state lives in the injected store; the meter itself holds no mutable
/// state and is safe to share across request handlers.
pub struct UsageMeter {
    store: Arc<dyn UsageStore>,
    clock: Arc<dyn Clock>,
}

impl UsageMeter {
    pub fn new(store: Arc<dyn UsageStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Check whether `user_id` may perform one more metered analysis.
    ///
    /// This is a point-in-time read, not a reservation: two concurrent
    /// callers can both be allowed at `current = limit - 1` and push the
    /// final count one past the limit. That soft-limit behavior is
    /// deliberate; `try_record` is the strict alternative.
    ///
    /// Never mutates the usage record.
    pub async fn check(&self, user_id: Uuid) -> Result<UsageStatus, MeterError> {
        let plan = self.resolve_plan(user_id).await?;

        let plan = match plan {
            PlanResolution::Resolved(plan) => plan,
            PlanResolution::Unresolved => {
                warn!(%user_id, "usage check with unresolvable plan, denying with zero quota");
                return Ok(UsageStatus {
                    allowed: false,
                    current: 0,
                    limit: 0,
                    plan_name: "unknown".to_string(),
                });
            }
        };

        let month = self.current_month();
        let current = self.store.usage_count(user_id, &month).await?.unwrap_or(0);

        Ok(UsageStatus {
            allowed: current < plan.files_per_month,
            current,
            limit: plan.files_per_month,
            plan_name: plan.name.to_string(),
        })
    }

    /// Record one consumed unit for the current month.
    ///
    /// Call exactly once per analysis that observably succeeded. Not
    /// idempotent: duplicate calls over-count, which is a caller contract
    /// rather than something the meter can detect. If the store is down the
    /// increment fails, but the already-delivered analysis must not be
    /// retried or rolled back on that account.
    pub async fn record(&self, user_id: Uuid) -> Result<(), MeterError> {
        let month = self.current_month();
        let count = self.store.increment_usage(user_id, &month).await?;
        debug!(%user_id, month = %month, count, "recorded file analysis usage");
        Ok(())
    }

    /// Strict variant of the check/record pair: atomically consumes one unit
    /// only if the resulting count stays within the user's plan limit.
    ///
    /// Returns the post-increment status when the unit was granted, or the
    /// denying status when the limit was already reached. Callers using this
    /// reserve quota *before* running the analysis, trading the soft limit
    /// for a hard cap (a unit consumed by an analysis that later fails is
    /// not refunded).
    pub async fn try_record(&self, user_id: Uuid) -> Result<UsageStatus, MeterError> {
        let plan = match self.resolve_plan(user_id).await? {
            PlanResolution::Resolved(plan) => plan,
            PlanResolution::Unresolved => {
                return Ok(UsageStatus {
                    allowed: false,
                    current: 0,
                    limit: 0,
                    plan_name: "unknown".to_string(),
                });
            }
        };

        let month = self.current_month();
        match self
            .store
            .increment_usage_below(user_id, &month, plan.files_per_month)
            .await?
        {
            Some(count) => Ok(UsageStatus {
                allowed: true,
                current: count,
                limit: plan.files_per_month,
                plan_name: plan.name.to_string(),
            }),
            None => {
                let current = self.store.usage_count(user_id, &month).await?.unwrap_or(0);
                Ok(UsageStatus {
                    allowed: false,
                    current,
                    limit: plan.files_per_month,
                    plan_name: plan.name.to_string(),
                })
            }
        }
    }

    /// Current usage for display; same resolution logic and degraded
    /// defaults as `check`, without the allow/deny decision
    pub async fn get_usage(&self, user_id: Uuid) -> Result<UsageSnapshot, MeterError> {
        let status = self.check(user_id).await?;
        Ok(UsageSnapshot {
            current: status.current,
            limit: status.limit,
            plan_name: status.plan_name,
        })
    }

    async fn resolve_plan(&self, user_id: Uuid) -> Result<PlanResolution, MeterError> {
        let plan_id = self.store.plan_for_user(user_id).await?;

        Ok(match plan_id.as_deref().and_then(plans::find_plan) {
            Some(plan) => PlanResolution::Resolved(plan),
            None => PlanResolution::Unresolved,
        })
    }

    fn current_month(&self) -> MonthKey {
        MonthKey::from_datetime(&self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use futures::future::join_all;
    use uuid::Uuid;

    use crate::testing::{FailingStore, ManualClock, MeterHarness};

    use super::*;

    fn march_harness() -> MeterHarness {
        MeterHarness::at(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn check_allows_below_limit() {
        let harness = march_harness();
        let user = harness.user_on_plan("free");

        let status = harness.meter.check(user).await.unwrap();
        assert!(status.allowed);
        assert_eq!(status.current, 0);
        assert_eq!(status.limit, 50);
        assert_eq!(status.plan_name, "Free");
    }

    #[tokio::test]
    async fn check_denies_at_limit() {
        let harness = march_harness();
        let (meter, user) = (&harness.meter, harness.user_on_plan("free"));

        for _ in 0..50 {
            meter.record(user).await.unwrap();
        }

        let status = meter.check(user).await.unwrap();
        assert!(!status.allowed);
        assert_eq!(status.current, 50);
        assert_eq!(status.limit, 50);
    }

    #[tokio::test]
    async fn unresolvable_plan_degrades_to_zero_quota() {
        let harness = march_harness();
        let meter = &harness.meter;

        // No user row at all
        let nobody = Uuid::new_v4();
        let status = meter.check(nobody).await.unwrap();
        assert_eq!(
            status,
            UsageStatus {
                allowed: false,
                current: 0,
                limit: 0,
                plan_name: "unknown".to_string(),
            }
        );

        // Plan id outside the catalog
        let stranger = harness.user_on_plan("enterprise");
        let status = meter.check(stranger).await.unwrap();
        assert!(!status.allowed);
        assert_eq!(status.plan_name, "unknown");
    }

    #[tokio::test]
    async fn sequential_records_accumulate_exactly() {
        let harness = march_harness();
        let (meter, user) = (&harness.meter, harness.user_on_plan("business"));

        for _ in 0..7 {
            meter.record(user).await.unwrap();
        }

        let usage = meter.get_usage(user).await.unwrap();
        assert_eq!(usage.current, 7);
        assert_eq!(usage.limit, 500);
        assert_eq!(usage.plan_name, "Business");
    }

    #[tokio::test]
    async fn months_have_independent_counters() {
        let harness = march_harness();
        let (meter, clock) = (&harness.meter, &harness.clock);
        let user = harness.user_on_plan("business");

        meter.record(user).await.unwrap();
        meter.record(user).await.unwrap();

        clock.set(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        meter.record(user).await.unwrap();

        let april = meter.get_usage(user).await.unwrap();
        assert_eq!(april.current, 1);

        clock.set(Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap());
        let march = meter.get_usage(user).await.unwrap();
        assert_eq!(march.current, 2);
    }

    #[tokio::test]
    async fn concurrent_records_lose_no_updates() {
        let harness = march_harness();
        let user = harness.user_on_plan("premium");
        let meter = Arc::new(UsageMeter::new(harness.store.clone(), harness.clock.clone()));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let meter = meter.clone();
                tokio::spawn(async move { meter.record(user).await })
            })
            .collect();

        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let usage = meter.get_usage(user).await.unwrap();
        assert_eq!(usage.current, 32);
    }

    #[tokio::test]
    async fn free_plan_boundary_scenario() {
        let harness = march_harness();
        let (meter, user) = (&harness.meter, harness.user_on_plan("free"));

        for _ in 0..49 {
            meter.record(user).await.unwrap();
        }

        let status = meter.check(user).await.unwrap();
        assert_eq!(
            status,
            UsageStatus {
                allowed: true,
                current: 49,
                limit: 50,
                plan_name: "Free".to_string(),
            }
        );

        meter.record(user).await.unwrap();
        assert_eq!(meter.get_usage(user).await.unwrap().current, 50);
        assert!(!meter.check(user).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn business_plan_with_no_usage_record() {
        let harness = march_harness();
        let (meter, user) = (&harness.meter, harness.user_on_plan("business"));

        let status = meter.check(user).await.unwrap();
        assert!(status.allowed);
        assert_eq!(status.current, 0);
        assert_eq!(status.limit, 500);
    }

    #[tokio::test]
    async fn month_rollover_starts_fresh() {
        let harness = march_harness();
        let (meter, clock) = (&harness.meter, &harness.clock);
        let user = harness.user_on_plan("free");

        for _ in 0..50 {
            meter.record(user).await.unwrap();
        }
        assert!(!meter.check(user).await.unwrap().allowed);

        clock.set(Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap());
        let status = meter.check(user).await.unwrap();
        assert!(status.allowed);
        assert_eq!(status.current, 0);
        assert_eq!(status.limit, 50);
    }

    #[tokio::test]
    async fn strict_mode_enforces_hard_cap() {
        let harness = march_harness();
        let user = harness.user_on_plan("free");
        let meter = Arc::new(UsageMeter::new(harness.store.clone(), harness.clock.clone()));

        // 60 concurrent attempts against a limit of 50: exactly 50 grants
        let tasks: Vec<_> = (0..60)
            .map(|_| {
                let meter = meter.clone();
                tokio::spawn(async move { meter.try_record(user).await })
            })
            .collect();

        let mut granted = 0;
        for result in join_all(tasks).await {
            if result.unwrap().unwrap().allowed {
                granted += 1;
            }
        }

        assert_eq!(granted, 50);
        assert_eq!(meter.get_usage(user).await.unwrap().current, 50);

        let denied = meter.try_record(user).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.current, 50);
        assert_eq!(denied.plan_name, "Free");
    }

    #[tokio::test]
    async fn store_outage_is_an_error_not_an_allow() {
        let clock = Arc::new(ManualClock::at(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        ));
        let meter = UsageMeter::new(Arc::new(FailingStore), clock);

        let err = meter.check(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, MeterError::Store(StoreError::Unavailable(_))));

        let err = meter.record(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, MeterError::Store(StoreError::Unavailable(_))));
    }
}
