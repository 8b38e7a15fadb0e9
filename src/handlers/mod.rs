mod notifications;
mod orders;
mod payments;
mod subscriptions;

pub use notifications::*;
pub use orders::*;
pub use payments::*;
pub use subscriptions::*;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::AppState;
use crate::middleware::platform_auth;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router {
    // The storefront is a browser client on another origin, so CORS is wide
    // open; the bearer check is what actually gates the API.
    let api = Router::new()
        .route("/api/payments", post(create_payment))
        .route("/api/payments/status", post(payment_status))
        .route("/api/payments/reconcile", post(reconcile))
        .route("/api/orders/{id}/delivery-status", post(set_delivery_status))
        .route("/api/subscriptions/payments", post(record_subscription_payment))
        .route("/api/subscriptions/transition", post(transition_subscription))
        .route("/api/notifications/order-status", post(notify_order_status))
        .route("/api/notifications/plan-change", post(notify_plan_change))
        .layer(middleware::from_fn_with_state(state.clone(), platform_auth));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
