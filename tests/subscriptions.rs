//! Subscription payment evidence and plan transition tests. The invariant
//! under test throughout: at most one active subscription per user.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

fn transition_body(user_id: &str, plan_id: &str, status: &str, period: &str) -> serde_json::Value {
    json!({
        "userId": user_id,
        "planId": plan_id,
        "status": status,
        "period_type": period,
    })
}

async fn approved_plan_payment(
    app: &axum::Router,
    gateway: &MockGateway,
    amount: f64,
) -> String {
    let mut request = payment_request(amount);
    request["period_type"] = json!("monthly");
    let (_, created) = post_json(app, "/api/payments", request).await;
    let payment_id = created["id"].as_str().unwrap().to_string();
    gateway.set_status(&payment_id, PaymentStatus::Approved);
    payment_id
}

#[tokio::test]
async fn test_record_payment_requires_gateway_approval() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (_, paid) = create_test_plans(&state);
    let app = test_app(state);

    let mut request = payment_request(49.90);
    request["period_type"] = json!("monthly");
    let (_, created) = post_json(&app, "/api/payments", request).await;
    let payment_id = created["id"].as_str().unwrap().to_string();

    // Still pending at the gateway: recording is refused.
    let body = json!({
        "paymentId": payment_id,
        "userId": user.id,
        "planId": paid.id,
        "period_type": "monthly",
        "storeApiKey": "TEST-KEY-1",
    });
    let (status, response) = post_json(&app, "/api/subscriptions/payments", body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], msg::PAYMENT_NOT_APPROVED);

    gateway.set_status(&payment_id, PaymentStatus::Approved);
    let (status, response) = post_json(&app, "/api/subscriptions/payments", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["payment_id"], payment_id.as_str());
    assert_eq!(response["status"], "approved");
    assert_eq!(response["amount_cents"], 4990);
}

#[tokio::test]
async fn test_record_payment_is_idempotent() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (_, paid) = create_test_plans(&state);
    let app = test_app(state.clone());

    let payment_id = approved_plan_payment(&app, &gateway, 49.90).await;
    let body = json!({
        "paymentId": payment_id,
        "userId": user.id,
        "planId": paid.id,
        "period_type": "monthly",
        "storeApiKey": "TEST-KEY-1",
    });

    let (_, first) = post_json(&app, "/api/subscriptions/payments", body.clone()).await;
    let (_, second) = post_json(&app, "/api/subscriptions/payments", body).await;
    assert_eq!(first["created_at"], second["created_at"]);

    let conn = state.db.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM subscription_payments", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_free_plan_activates_without_payment_evidence() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (free, _) = create_test_plans(&state);
    let app = test_app(state.clone());

    let body = transition_body(&user.id, &free.id, "active", "monthly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["subscription"]["status"], "active");
    assert_eq!(response["subscription"]["plan_id"], free.id.as_str());

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_active_subscriptions(&conn, &user.id).unwrap(), 1);
}

#[tokio::test]
async fn test_paid_plan_requires_approved_payment_evidence() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (_, paid) = create_test_plans(&state);
    let app = test_app(state.clone());

    // No recorded payment: activation refused.
    let body = transition_body(&user.id, &paid.id, "active", "monthly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], msg::SUBSCRIPTION_PAYMENT_REQUIRED);

    {
        let conn = state.db.get().unwrap();
        assert_eq!(queries::count_active_subscriptions(&conn, &user.id).unwrap(), 0);
    }

    // Record approved evidence, then the same transition succeeds.
    let payment_id = approved_plan_payment(&app, &gateway, 49.90).await;
    let record = json!({
        "paymentId": payment_id,
        "userId": user.id,
        "planId": paid.id,
        "period_type": "monthly",
        "storeApiKey": "TEST-KEY-1",
    });
    post_json(&app, "/api/subscriptions/payments", record).await;

    let (status, response) = post_json(&app, "/api/subscriptions/transition", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["subscription"]["status"], "active");
}

#[tokio::test]
async fn test_plan_switch_leaves_exactly_one_active() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (free, paid) = create_test_plans(&state);
    let app = test_app(state.clone());

    let body = transition_body(&user.id, &free.id, "active", "monthly");
    post_json(&app, "/api/subscriptions/transition", body).await;

    let payment_id = approved_plan_payment(&app, &gateway, 49.90).await;
    let record = json!({
        "paymentId": payment_id,
        "userId": user.id,
        "planId": paid.id,
        "period_type": "monthly",
        "storeApiKey": "TEST-KEY-1",
    });
    post_json(&app, "/api/subscriptions/payments", record).await;

    let body = transition_body(&user.id, &paid.id, "active", "monthly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["subscription"]["plan_id"], paid.id.as_str());

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_active_subscriptions(&conn, &user.id).unwrap(), 1);
    let active = queries::get_active_subscription(&conn, &user.id)
        .unwrap()
        .unwrap();
    assert_eq!(active.plan_id, paid.id);
}

#[tokio::test]
async fn test_cancel_and_reactivate() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (free, _) = create_test_plans(&state);
    let app = test_app(state.clone());

    let activate = transition_body(&user.id, &free.id, "active", "monthly");
    post_json(&app, "/api/subscriptions/transition", activate.clone()).await;

    let cancel = transition_body(&user.id, &free.id, "canceled", "monthly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", cancel.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["subscription"]["status"], "canceled");

    {
        let conn = state.db.get().unwrap();
        assert_eq!(queries::count_active_subscriptions(&conn, &user.id).unwrap(), 0);
    }

    // Cancel with nothing active is a no-op, not an error.
    let (status, response) = post_json(&app, "/api/subscriptions/transition", cancel).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.get("subscription").is_none());

    // Reactivation creates a fresh row alongside the canceled one.
    let (status, _) = post_json(&app, "/api/subscriptions/transition", activate).await;
    assert_eq!(status, StatusCode::OK);

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_active_subscriptions(&conn, &user.id).unwrap(), 1);
    assert_eq!(queries::list_subscriptions_for_user(&conn, &user.id).unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_status_and_period_rejected() {
    let gateway = MockGateway::new();
    let state = test_state(gateway);
    let user = create_test_store(&state);
    let (free, _) = create_test_plans(&state);
    let app = test_app(state);

    let body = transition_body(&user.id, &free.id, "paused", "monthly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], msg::INVALID_SUBSCRIPTION_STATUS);

    let body = transition_body(&user.id, &free.id, "active", "weekly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], msg::PERIOD_TYPE_INVALID);
}

#[tokio::test]
async fn test_transition_for_unknown_user_or_plan_is_404() {
    let gateway = MockGateway::new();
    let state = test_state(gateway);
    let user = create_test_store(&state);
    let (free, _) = create_test_plans(&state);
    let app = test_app(state);

    let body = transition_body("nope", &free.id, "active", "monthly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], msg::PROFILE_NOT_FOUND);

    let body = transition_body(&user.id, "nope", "active", "monthly");
    let (status, response) = post_json(&app, "/api/subscriptions/transition", body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], msg::PLAN_NOT_FOUND);
}

#[tokio::test]
async fn test_manual_payment_id_skips_gateway_verification() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (_, paid) = create_test_plans(&state);
    let app = test_app(state);

    let body = json!({
        "paymentId": "manual_admin_override_1",
        "userId": user.id,
        "planId": paid.id,
        "period_type": "annual",
    });
    let (status, response) = post_json(&app, "/api/subscriptions/payments", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "approved");
    assert_eq!(response["amount_cents"], 0);
    assert_eq!(gateway.get_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
