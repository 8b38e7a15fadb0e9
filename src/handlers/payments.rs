use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::checkout::create_checkout_payment;
use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::models::{CreatePaymentRequest, Payment, PaymentStatus, PeriodType};
use crate::poller;
use crate::reconcile::{reconcile_payment, ReconcileInput, ReconcileOutcome};

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    /// Echoed back on the plan flow so the client can thread it through to
    /// the subscription transition without re-deriving it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_type: Option<PeriodType>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>> {
    let (payment, period_type) = create_checkout_payment(&state, &request).await?;

    Ok(Json(CreatePaymentResponse {
        payment,
        period_type,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusRequest {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    #[serde(rename = "storeApiKey", default)]
    pub store_api_key: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
}

/// Plain status check: no persistence, no order creation.
pub async fn payment_status(
    State(state): State<AppState>,
    Json(request): Json<PaymentStatusRequest>,
) -> Result<Json<PaymentStatusResponse>> {
    let payment = state
        .gateway
        .get_payment(&request.store_api_key, &request.payment_id)
        .await?;

    Ok(Json(PaymentStatusResponse {
        status: payment.status,
        status_detail: payment.status_detail,
    }))
}

/// Status check plus exactly-once order creation on approval.
///
/// When the payment is still pending and carries order data, a server-side
/// poller is registered as well, so an abandoned browser tab cannot strand
/// an approved payment without its order.
pub async fn reconcile(
    State(state): State<AppState>,
    Json(input): Json<ReconcileInput>,
) -> Result<Json<ReconcileOutcome>> {
    let outcome = reconcile_payment(&state, &input).await?;

    if !outcome.status.is_terminal() && input.order_data.is_some() {
        poller::ensure_payment_poller(&state, input);
    }

    Ok(Json(outcome))
}
