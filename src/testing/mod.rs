use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::usage::clock::{Clock, MonthKey};
use crate::usage::store::{MemoryUsageStore, StoreError, UsageStore};
use crate::usage::UsageMeter;

/// Settable clock for driving month boundaries in tests
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Store that refuses every call, for simulating an outage
pub struct FailingStore;

#[async_trait]
impl UsageStore for FailingStore {
    async fn plan_for_user(&self, _user_id: Uuid) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("simulated outage".to_string()))
    }

    async fn usage_count(&self, _user_id: Uuid, _month: &MonthKey) -> Result<Option<i64>, StoreError> {
        Err(StoreError::Unavailable("simulated outage".to_string()))
    }

    async fn increment_usage(&self, _user_id: Uuid, _month: &MonthKey) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("simulated outage".to_string()))
    }

    async fn increment_usage_below(
        &self,
        _user_id: Uuid,
        _month: &MonthKey,
        _limit: i64,
    ) -> Result<Option<i64>, StoreError> {
        Err(StoreError::Unavailable("simulated outage".to_string()))
    }
}

/// In-memory meter wired to a manual clock, for tests that drive the full
/// check/record flow without a database
pub struct MeterHarness {
    pub store: Arc<MemoryUsageStore>,
    pub clock: Arc<ManualClock>,
    pub meter: UsageMeter,
}

impl MeterHarness {
    pub fn at(now: DateTime<Utc>) -> Self {
        let store = Arc::new(MemoryUsageStore::new());
        let clock = Arc::new(ManualClock::at(now));
        let meter = UsageMeter::new(store.clone(), clock.clone());
        Self { store, clock, meter }
    }

    /// Register a user on the given plan and return their id
    pub fn user_on_plan(&self, plan_id: &str) -> Uuid {
        let user = Uuid::new_v4();
        self.store.set_plan(user, plan_id);
        user
    }
}
