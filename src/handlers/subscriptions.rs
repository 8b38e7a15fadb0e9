use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::{
    PaymentStatus, PeriodType, Subscription, SubscriptionPayment, SubscriptionStatus,
    SubscriptionTransition,
};
use crate::notify;
use crate::util::amount_to_cents;

#[derive(Debug, Deserialize)]
pub struct RecordSubscriptionPaymentRequest {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "planId")]
    pub plan_id: String,
    pub period_type: String,
    /// Needed to verify live gateway payments; synthetic `manual_` payments
    /// skip the gateway and don't require it.
    #[serde(rename = "storeApiKey", default)]
    pub store_api_key: String,
}

/// Record approved payment evidence for a plan activation.
///
/// Live payments are re-read from the gateway and must be approved. Ids with
/// the `manual_` prefix (zero-amount free activations and admin-issued
/// records) are trusted without a gateway round trip: anyone holding the
/// platform token can mint them, so the paid-plan gate is only as strong as
/// that token. Idempotent on payment id.
pub async fn record_subscription_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordSubscriptionPaymentRequest>,
) -> Result<Json<SubscriptionPayment>> {
    let period_type: PeriodType = request
        .period_type
        .parse()
        .map_err(|_| AppError::Validation(msg::PERIOD_TYPE_INVALID.into()))?;

    let amount_cents = if request.payment_id.starts_with("manual_") {
        0
    } else {
        let payment = state
            .gateway
            .get_payment(&request.store_api_key, &request.payment_id)
            .await?;
        if payment.status != PaymentStatus::Approved {
            return Err(AppError::Validation(msg::PAYMENT_NOT_APPROVED.into()));
        }
        amount_to_cents(payment.transaction_amount)?
    };

    let conn = state.db.get()?;
    queries::get_profile_by_id(&conn, &request.user_id)?.or_not_found(msg::PROFILE_NOT_FOUND)?;
    queries::get_plan_by_id(&conn, &request.plan_id)?.or_not_found(msg::PLAN_NOT_FOUND)?;

    let recorded = queries::create_subscription_payment(
        &conn,
        &request.payment_id,
        &request.user_id,
        &request.plan_id,
        PaymentStatus::Approved,
        amount_cents,
        period_type,
    )?;

    Ok(Json(recorded))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "planId")]
    pub plan_id: String,
    pub status: String,
    pub period_type: String,
    #[serde(rename = "paymentId", default)]
    pub payment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
}

/// Apply a subscription transition: activate, switch plans, or cancel.
/// Leaves the user with at most one active subscription, always.
pub async fn transition_subscription(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>> {
    let status: SubscriptionStatus = request
        .status
        .parse()
        .map_err(|_| AppError::Validation(msg::INVALID_SUBSCRIPTION_STATUS.into()))?;
    let period_type: PeriodType = request
        .period_type
        .parse()
        .map_err(|_| AppError::Validation(msg::PERIOD_TYPE_INVALID.into()))?;

    let transition = SubscriptionTransition {
        user_id: request.user_id.clone(),
        plan_id: request.plan_id.clone(),
        status,
        period_type,
        payment_id: request.payment_id.clone(),
    };

    let (subscription, profile, plan) = {
        let mut conn = state.db.get()?;
        let profile = queries::get_profile_by_id(&conn, &request.user_id)?
            .or_not_found(msg::PROFILE_NOT_FOUND)?;
        let plan = queries::get_plan_by_id(&conn, &request.plan_id)?
            .or_not_found(msg::PLAN_NOT_FOUND)?;
        let subscription = queries::transition_subscription(&mut conn, &transition)?;
        (subscription, profile, plan)
    };

    if status == SubscriptionStatus::Active && subscription.is_some() {
        if let Some(phone) = profile.whatsapp.clone() {
            let notifier = state.notifier.clone();
            let message = notify::plan_change_message(&profile.name, &plan.name, period_type);
            tokio::spawn(async move {
                if let Err(e) = notifier.send_text(&phone, &message).await {
                    tracing::warn!("Plan change notification not sent: {}", e);
                }
            });
        }
    }

    Ok(Json(TransitionResponse { subscription }))
}
