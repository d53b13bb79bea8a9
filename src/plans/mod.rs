//! Subscription plan catalog
//!
//! The catalog is a fixed in-process table loaded once at startup. Plans are
//! never fetched from the database; user rows only carry a plan id that is
//! resolved here.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed set of plan identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Free,
    Business,
    Premium,
}

impl PlanId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Free => "free",
            PlanId::Business => "business",
            PlanId::Premium => "premium",
        }
    }

    /// Parse a stored plan id string. Returns None for anything outside the
    /// known set; callers decide whether that is a hard error or a degraded
    /// result (the usage meter treats it as the latter).
    pub fn parse(s: &str) -> Option<PlanId> {
        match s {
            "free" => Some(PlanId::Free),
            "business" => Some(PlanId::Business),
            "premium" => Some(PlanId::Premium),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subscription tier: monthly analysis quota, team-size cap, and price
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: &'static str,
    pub files_per_month: i64,
    pub max_team_members: i64,
    pub price_monthly: Decimal,
    pub popular: bool,
    pub features: &'static [&'static str],
}

// Display order is ascending by price; all_plans() relies on this
static PLANS: Lazy<[Plan; 3]> = Lazy::new(|| {
    [
        Plan {
            id: PlanId::Free,
            name: "Free",
            files_per_month: 50,
            max_team_members: 3,
            price_monthly: Decimal::from(0),
            popular: false,
            features: &[
                "50 file analyses per month",
                "Up to 3 team members",
                "Basic analytics",
                "Email support",
            ],
        },
        Plan {
            id: PlanId::Business,
            name: "Business",
            files_per_month: 500,
            max_team_members: 6,
            price_monthly: Decimal::from(29),
            popular: true,
            features: &[
                "500 file analyses per month",
                "Up to 6 team members",
                "Advanced analytics",
                "Priority email support",
                "API access",
            ],
        },
        Plan {
            id: PlanId::Premium,
            name: "Premium",
            files_per_month: 1000,
            max_team_members: 15,
            price_monthly: Decimal::from(99),
            popular: false,
            features: &[
                "1000 file analyses per month",
                "Up to 15 team members",
                "Advanced analytics",
                "24/7 priority support",
                "API access",
                "Custom integrations",
            ],
        },
    ]
});

/// Look up plan metadata by identifier
pub fn get_plan(id: PlanId) -> &'static Plan {
    match id {
        PlanId::Free => &PLANS[0],
        PlanId::Business => &PLANS[1],
        PlanId::Premium => &PLANS[2],
    }
}

/// Resolve a raw plan id string to catalog metadata
pub fn find_plan(id: &str) -> Option<&'static Plan> {
    PlanId::parse(id).map(get_plan)
}

/// All plans in stable display order (ascending by price)
pub fn all_plans() -> &'static [Plan] {
    &*PLANS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id_returns_matching_plan() {
        let plan = get_plan(PlanId::Business);
        assert_eq!(plan.name, "Business");
        assert_eq!(plan.files_per_month, 500);
        assert_eq!(plan.max_team_members, 6);
    }

    #[test]
    fn unknown_id_string_does_not_resolve() {
        assert!(find_plan("enterprise").is_none());
        assert!(find_plan("").is_none());
        assert_eq!(find_plan("premium").unwrap().files_per_month, 1000);
    }

    #[test]
    fn plans_are_ordered_by_ascending_price() {
        let plans = all_plans();
        assert_eq!(plans.len(), 3);
        for pair in plans.windows(2) {
            assert!(pair[0].price_monthly <= pair[1].price_monthly);
        }
    }

    #[test]
    fn plan_id_round_trips_through_parse() {
        for plan in all_plans() {
            assert_eq!(PlanId::parse(plan.id.as_str()), Some(plan.id));
        }
    }
}
