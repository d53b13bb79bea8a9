//! Usage metering and entitlement checks
//!
//! The meter is the sole authority on whether a user may perform another
//! metered file analysis this calendar month, and the sole writer of the
//! per-(user, month) consumption counters.

pub mod clock;
pub mod meter;
pub mod store;

pub use clock::{Clock, MonthKey, SystemClock};
pub use meter::{MeterError, PlanResolution, UsageMeter, UsageSnapshot, UsageStatus};
pub use store::{MemoryUsageStore, PgUsageStore, StoreError, UsageStore};
