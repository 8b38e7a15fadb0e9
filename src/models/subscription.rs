use serde::{Deserialize, Serialize};

use super::PaymentStatus;

/// Billing period for a plan subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Monthly,
    Annual,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Monthly => "monthly",
            PeriodType::Annual => "annual",
        }
    }

    /// Length of one billing period in days.
    pub fn days(&self) -> i64 {
        match self {
            PeriodType::Monthly => 30,
            PeriodType::Annual => 365,
        }
    }
}

impl std::str::FromStr for PeriodType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(PeriodType::Monthly),
            "annual" => Ok(PeriodType::Annual),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            _ => Err(()),
        }
    }
}

/// Plan subscription row. Invariant: at most one active row per user at any
/// time, enforced both by the transition transaction and by a partial unique
/// index on (user_id) WHERE status = 'active'.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub period_type: PeriodType,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Validated input for a subscription transition (create / switch / cancel).
#[derive(Debug, Clone)]
pub struct SubscriptionTransition {
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub period_type: PeriodType,
    /// Explicit payment evidence; when absent, the most recent approved
    /// subscription payment for the user is used.
    pub payment_id: Option<String>,
}

/// Evidence that a paid-plan activation is backed by a real approved
/// payment. Looked up by "most recent approved payment for user" when the
/// transition is not handed an explicit payment id.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPayment {
    pub payment_id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub period_type: PeriodType,
    pub created_at: i64,
}
