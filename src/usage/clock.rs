use chrono::{DateTime, Datelike, Utc};

/// Injectable time source so month boundaries can be simulated in tests
/// instead of depending on the real system clock
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time, used everywhere outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Calendar month key scoping a usage record, formatted as "YYYY-MM"
///
/// Derived from the clock at call time, never from a caller-supplied
/// timestamp. Month rollover produces a new key; old records are never
/// migrated or summed across months.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonthKey(String);

impl MonthKey {
    pub fn from_datetime(at: &DateTime<Utc>) -> Self {
        MonthKey(format!("{:04}-{:02}", at.year(), at.month()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_key_is_zero_padded() {
        let march = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap();
        assert_eq!(MonthKey::from_datetime(&march).as_str(), "2024-03");

        let december = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(MonthKey::from_datetime(&december).as_str(), "2024-12");
    }

    #[test]
    fn adjacent_months_produce_distinct_keys() {
        let a = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        assert_ne!(MonthKey::from_datetime(&a), MonthKey::from_datetime(&b));
    }
}
