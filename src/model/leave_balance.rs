use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "user_id": 1,
    "paid_days": 20,
    "sick_days": 10,
    "unpaid_days": 0,
    "created_at": "2026-01-01T09:00:00Z",
    "updated_at": "2026-01-01T09:00:00Z"
}))]
pub struct LeaveBalance {
    pub user_id: u64,
    pub paid_days: u32,
    pub sick_days: u32,
    pub unpaid_days: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    pub fn counters(&self) -> BalanceCounters {
        BalanceCounters {
            paid_days: self.paid_days,
            sick_days: self.sick_days,
            unpaid_days: self.unpaid_days,
        }
    }
}

/// The three day counters, replaced as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BalanceCounters {
    #[schema(example = 20)]
    pub paid_days: u32,
    #[schema(example = 10)]
    pub sick_days: u32,
    #[schema(example = 0)]
    pub unpaid_days: u32,
}

impl Default for BalanceCounters {
    /// Allowance granted to a user whose balance has never been set.
    fn default() -> Self {
        Self {
            paid_days: 20,
            sick_days: 10,
            unpaid_days: 0,
        }
    }
}
