use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::{DeliveryStatus, PeriodType};
use crate::notify;

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusNotification {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "oldDeliveryStatus")]
    pub old_delivery_status: String,
    #[serde(rename = "newDeliveryStatus")]
    pub new_delivery_status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Send a delivery-status message directly, synchronously.
///
/// Unlike the dispatch helpers on the payment path, this endpoint exists to
/// send a message, so a send failure is the caller's problem and surfaces
/// as an error body.
pub async fn notify_order_status(
    State(state): State<AppState>,
    Json(request): Json<OrderStatusNotification>,
) -> Result<Json<NotificationResponse>> {
    let old: DeliveryStatus = request
        .old_delivery_status
        .parse()
        .map_err(|_| AppError::Validation(msg::INVALID_DELIVERY_STATUS.into()))?;
    let new: DeliveryStatus = request
        .new_delivery_status
        .parse()
        .map_err(|_| AppError::Validation(msg::INVALID_DELIVERY_STATUS.into()))?;

    let order = {
        let conn = state.db.get()?;
        queries::get_order_by_id(&conn, &request.order_id)?.or_not_found(msg::ORDER_NOT_FOUND)?
    };

    let message =
        notify::delivery_status_message(&order.customer_name, old, new, request.reason.as_deref());

    state
        .notifier
        .send_text(&order.customer_phone, &message)
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => e,
            _ => AppError::Internal(format!("{}: {}", msg::NOTIFICATION_FAILED, e)),
        })?;

    Ok(Json(NotificationResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct PlanChangeNotification {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "planName")]
    pub plan_name: String,
    pub period: String,
}

/// Send a plan-change message directly to the user's WhatsApp number.
pub async fn notify_plan_change(
    State(state): State<AppState>,
    Json(request): Json<PlanChangeNotification>,
) -> Result<Json<NotificationResponse>> {
    let period: PeriodType = request
        .period
        .parse()
        .map_err(|_| AppError::Validation(msg::PERIOD_TYPE_INVALID.into()))?;

    let profile = {
        let conn = state.db.get()?;
        queries::get_profile_by_id(&conn, &request.user_id)?
            .or_not_found(msg::PROFILE_NOT_FOUND)?
    };

    let phone = profile
        .whatsapp
        .as_deref()
        .ok_or_else(|| AppError::Validation(msg::PHONE_INVALID.into()))?;

    let message = notify::plan_change_message(&profile.name, &request.plan_name, period);

    state.notifier.send_text(phone, &message).await.map_err(|e| match e {
        AppError::Validation(_) => e,
        _ => AppError::Internal(format!("{}: {}", msg::NOTIFICATION_FAILED, e)),
    })?;

    Ok(Json(NotificationResponse { success: true }))
}
