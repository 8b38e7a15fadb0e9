use axum::extract::State;
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::models::{DeliveryStatus, Order};
use crate::notify;

#[derive(Debug, Deserialize)]
pub struct DeliveryStatusUpdate {
    pub delivery_status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Merchant-facing delivery-status mutation. Validates the value against
/// the known set, persists it, and fires a best-effort customer
/// notification; the response does not depend on the notification outcome.
pub async fn set_delivery_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(update): Json<DeliveryStatusUpdate>,
) -> Result<Json<Order>> {
    let new_status: DeliveryStatus = update
        .delivery_status
        .parse()
        .map_err(|_| AppError::Validation(msg::INVALID_DELIVERY_STATUS.into()))?;

    let conn = state.db.get()?;

    let existing =
        queries::get_order_by_id(&conn, &order_id)?.or_not_found(msg::ORDER_NOT_FOUND)?;
    let old_status = existing.delivery_status;

    let updated = queries::update_delivery_status(&conn, &order_id, new_status)?
        .or_not_found(msg::ORDER_NOT_FOUND)?;

    if old_status != new_status {
        notify::dispatch_delivery_status_change(
            state.notifier.clone(),
            &updated,
            old_status,
            new_status,
            update.reason,
        );
    }

    Ok(Json(updated))
}
