use serde::{Deserialize, Serialize};

use super::PeriodType;

/// Subscription plan offered by the platform. A zero price for a period
/// means the plan is free for that period and activation needs no payment
/// evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price_monthly_cents: i64,
    pub price_annual_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
}

impl Plan {
    pub fn price_cents_for(&self, period: PeriodType) -> i64 {
        match period {
            PeriodType::Monthly => self.price_monthly_cents,
            PeriodType::Annual => self.price_annual_cents,
        }
    }

    pub fn is_free_for(&self, period: PeriodType) -> bool {
        self.price_cents_for(period) == 0
    }
}
