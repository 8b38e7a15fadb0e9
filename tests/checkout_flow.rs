//! End-to-end storefront scenario: create a PIX payment, poll it to
//! approval, and watch the order appear exactly once.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_full_storefront_checkout_flow() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let store = create_test_store(&state);
    let product = create_test_product(&state, &store.id, "Marmita executiva", 49.90, 5);
    let app = test_app(state.clone());

    // 1. Customer checks out: payment created at the gateway.
    let create_body = json!({
        "amount": 49.90,
        "customerData": {
            "name": "Ana Souza",
            "email": "a@b.com",
            "cpf": "11144477735",
        },
        "storeApiKey": "TEST-KEY-1",
        "description": "Pedido Loja Teste",
    });
    let (status, created) = post_json(&app, "/api/payments", create_body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "pending");
    let payment_id = created["id"].as_str().unwrap().to_string();
    let qr = created["point_of_interaction"]["qr_code"].as_str().unwrap();
    assert!(!qr.is_empty());
    assert_eq!(gateway.create_call_count(), 1);

    // 2. Storefront polls while the customer stares at the QR code.
    let reconcile_body = json!({
        "paymentId": payment_id,
        "storeApiKey": "TEST-KEY-1",
        "storeId": store.id,
        "orderData": order_data_for(&product, 2),
    });
    let (status, poll) = post_json(&app, "/api/payments/reconcile", reconcile_body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(poll["status"], "pending");
    assert!(poll.get("orderId").is_none());
    assert_eq!(product_quantity(&state, &product.id), 5);

    // 3. Customer pays; gateway flips to approved.
    gateway.set_status(&payment_id, PaymentStatus::Approved);

    let (status, poll) = post_json(&app, "/api/payments/reconcile", reconcile_body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(poll["status"], "approved");
    let order_id = poll["orderId"].as_str().unwrap().to_string();
    assert_eq!(product_quantity(&state, &product.id), 3);

    // 4. The client polls once more after approval; nothing changes.
    let (_, again) = post_json(&app, "/api/payments/reconcile", reconcile_body).await;
    assert_eq!(again["orderId"], order_id.as_str());
    assert_eq!(product_quantity(&state, &product.id), 3);

    // 5. Merchant works the order through to delivered.
    let uri = format!("/api/orders/{}/delivery-status", order_id);
    for step in ["em_preparacao", "em_transito", "entregue"] {
        let (status, response) =
            post_json(&app, &uri, json!({"delivery_status": step})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["delivery_status"], step);
    }

    let conn = state.db.get().unwrap();
    let order = queries::get_order_by_id(&conn, &order_id).unwrap().unwrap();
    assert_eq!(order.delivery_status, DeliveryStatus::Entregue);
    assert_eq!(order.customer_cpf, "11144477735");
    assert_eq!(order.total_cents, 9980);
}

#[tokio::test]
async fn test_full_plan_subscription_flow() {
    let gateway = MockGateway::new();
    let state = test_state(gateway.clone());
    let user = create_test_store(&state);
    let (_, paid) = create_test_plans(&state);
    let app = test_app(state.clone());

    // 1. Plan checkout with period_type: CPF checksum enforced, echo returned.
    let create_body = json!({
        "amount": 49.90,
        "customerData": {
            "name": "Ana Souza",
            "email": "a@b.com",
            "cpf": "111.444.777-35",
        },
        "storeApiKey": "TEST-KEY-1",
        "description": "Plano Profissional",
        "period_type": "monthly",
    });
    let (status, created) = post_json(&app, "/api/payments", create_body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["period_type"], "monthly");
    let payment_id = created["id"].as_str().unwrap().to_string();

    // 2. Payment approves at the gateway.
    gateway.set_status(&payment_id, PaymentStatus::Approved);

    // 3. Record the evidence, then transition.
    let record_body = json!({
        "paymentId": payment_id,
        "userId": user.id,
        "planId": paid.id,
        "period_type": "monthly",
        "storeApiKey": "TEST-KEY-1",
    });
    let (status, _) = post_json(&app, "/api/subscriptions/payments", record_body).await;
    assert_eq!(status, StatusCode::OK);

    let transition_body = json!({
        "userId": user.id,
        "planId": paid.id,
        "status": "active",
        "period_type": "monthly",
        "paymentId": payment_id,
    });
    let (status, response) = post_json(&app, "/api/subscriptions/transition", transition_body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["subscription"]["status"], "active");
    assert_eq!(response["subscription"]["period_type"], "monthly");

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_active_subscriptions(&conn, &user.id).unwrap(), 1);
}
