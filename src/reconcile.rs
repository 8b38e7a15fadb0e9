//! Payment status reconciliation.
//!
//! Polled by the client every few seconds, so everything here assumes
//! at-least-once delivery of the "payment just became approved" observation:
//! the reconcile is level-triggered (re-reads current gateway state), and
//! order creation is guarded so only the first approved poll writes.

use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::db::queries::OrderOutcome;
use crate::error::Result;
use crate::models::{OrderData, PaymentStatus};
use crate::notify;

/// Input for one reconciliation pass. `order_data` is present only on the
/// storefront flow; plan payments carry none and reconciliation stays
/// read-only for them.
#[derive(Debug, Deserialize)]
pub struct ReconcileInput {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    #[serde(rename = "storeApiKey", default)]
    pub store_api_key: String,
    #[serde(rename = "storeId", default)]
    pub store_id: String,
    #[serde(rename = "orderData", default)]
    pub order_data: Option<OrderData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    #[serde(rename = "orderId", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// One reconciliation pass: read the current gateway status and, on
/// approval of a storefront payment, finalize the order exactly once.
///
/// Non-approved statuses pass straight through with no persistence;
/// `rejected` in particular writes nothing. A gateway failure surfaces as a
/// transient error for the client to retry on its next poll tick — never as
/// a terminal rejection.
pub async fn reconcile_payment(
    state: &AppState,
    input: &ReconcileInput,
) -> Result<ReconcileOutcome> {
    let payment = state
        .gateway
        .get_payment(&input.store_api_key, &input.payment_id)
        .await?;

    if payment.status != PaymentStatus::Approved {
        return Ok(ReconcileOutcome {
            status: payment.status,
            status_detail: payment.status_detail,
            order_id: None,
        });
    }

    let order_data = match &input.order_data {
        Some(data) => data,
        // Plan payments: approval is reported, nothing is written here.
        None => {
            return Ok(ReconcileOutcome {
                status: PaymentStatus::Approved,
                status_detail: payment.status_detail,
                order_id: None,
            })
        }
    };

    // Data-integrity guard. The money is already captured; a failure here
    // aborts order creation, not the payment.
    order_data.validate()?;

    let outcome = {
        let mut conn = state.db.get()?;
        queries::finalize_order(&mut conn, &input.payment_id, &input.store_id, order_data)?
    };

    let order_id = match outcome {
        OrderOutcome::Created(order) => {
            notify::dispatch_order_confirmation(state.notifier.clone(), &order);
            order.id
        }
        // Repeated poll after approval: the order already exists and stock
        // was already taken. Report the same result, write nothing.
        OrderOutcome::AlreadyExists(order) => order.id,
    };

    Ok(ReconcileOutcome {
        status: PaymentStatus::Approved,
        status_detail: payment.status_detail,
        order_id: Some(order_id),
    })
}
