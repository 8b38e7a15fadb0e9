//! Test utilities and fixtures for XMenu integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;
use tower::ServiceExt;

pub use xmenu::db::{init_db, queries, AppState, DbPool};
pub use xmenu::error::{msg, AppError};
pub use xmenu::gateway::{GatewayPaymentRequest, PaymentGateway};
pub use xmenu::models::*;
pub use xmenu::notify::Notifier;

/// Programmable in-process payment gateway.
///
/// Tests drive it by mutating the payment map; call counters let tests
/// assert that validation failures never reach the gateway.
pub struct MockGateway {
    payments: Mutex<HashMap<String, Payment>>,
    pub create_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    unavailable: AtomicBool,
    next_id: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(MockGateway {
            payments: Mutex::new(HashMap::new()),
            create_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
        })
    }

    /// Simulate the gateway being unreachable for all subsequent calls.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn set_status(&self, payment_id: &str, status: PaymentStatus) {
        let mut payments = self.payments.lock().unwrap();
        if let Some(payment) = payments.get_mut(payment_id) {
            payment.status = status;
            payment.status_detail = match status {
                PaymentStatus::Approved => Some("accredited".to_string()),
                PaymentStatus::Rejected => Some("cc_rejected".to_string()),
                _ => payment.status_detail.clone(),
            };
        }
    }

    /// Seed a payment that was "created elsewhere" (e.g. a previous run).
    pub fn insert_payment(&self, payment: Payment) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id.clone(), payment);
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment(
        &self,
        _api_key: &str,
        request: &GatewayPaymentRequest,
        _idempotency_key: &str,
    ) -> Result<Payment, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Gateway(msg::GATEWAY_UNAVAILABLE.to_string()));
        }

        let id = format!("mock_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let payment = Payment {
            id: id.clone(),
            status: PaymentStatus::Pending,
            status_detail: Some("pending_waiting_transfer".to_string()),
            transaction_amount: request.transaction_amount,
            description: request.description.clone(),
            point_of_interaction: PixQr {
                qr_code: format!("00020126-{}", id),
                qr_code_base64: "aVZCT1I=".to_string(),
            },
        };
        self.payments
            .lock()
            .unwrap()
            .insert(id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, _api_key: &str, payment_id: &str) -> Result<Payment, AppError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Gateway(msg::GATEWAY_UNAVAILABLE.to_string()));
        }

        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| AppError::Gateway("Pagamento não encontrado".to_string()))
    }
}

/// In-memory database pool. Single connection: an in-memory SQLite database
/// is per-connection, so the pool must never open a second one.
pub fn setup_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

pub fn test_state(gateway: Arc<MockGateway>) -> AppState {
    AppState {
        db: setup_test_pool(),
        gateway,
        notifier: Arc::new(Notifier::disabled()),
        platform_token: None,
        pollers: Arc::new(Mutex::new(HashMap::new())),
    }
}

/// State whose notifier points at a closed port, so every send fails.
pub fn test_state_with_failing_notifier(gateway: Arc<MockGateway>) -> AppState {
    let mut state = test_state(gateway);
    state.notifier = Arc::new(Notifier::new(
        Some("http://127.0.0.1:9".to_string()),
        "test-token".to_string(),
    ));
    state
}

pub fn test_app(state: AppState) -> Router {
    xmenu::handlers::router(state)
}

/// Create a test store profile.
pub fn create_test_store(state: &AppState) -> Profile {
    let conn = state.db.get().unwrap();
    queries::create_profile(
        &conn,
        &CreateProfile {
            name: "Loja Teste".to_string(),
            email: "loja@teste.com".to_string(),
            whatsapp: Some("11987654321".to_string()),
            store_name: Some("Loja Teste".to_string()),
        },
    )
    .unwrap()
}

pub fn create_test_product(
    state: &AppState,
    store_id: &str,
    name: &str,
    price: f64,
    quantity: i64,
) -> Product {
    let conn = state.db.get().unwrap();
    queries::create_product(
        &conn,
        store_id,
        &CreateProduct {
            name: name.to_string(),
            price,
            quantity,
            description: None,
            category: None,
            tags: vec![],
            image_url: None,
        },
    )
    .unwrap()
}

/// Create the standard free + paid plan pair. Returns (free, paid).
pub fn create_test_plans(state: &AppState) -> (Plan, Plan) {
    let conn = state.db.get().unwrap();
    let free = queries::create_plan(&conn, "Gratuito", 0, 0, None).unwrap();
    let paid = queries::create_plan(&conn, "Profissional", 4990, 49900, None).unwrap();
    (free, paid)
}

pub fn product_quantity(state: &AppState, product_id: &str) -> i64 {
    let conn = state.db.get().unwrap();
    queries::get_product_by_id(&conn, product_id)
        .unwrap()
        .unwrap()
        .quantity
}

/// Order data for a cart of `quantity` units of one product.
pub fn order_data_for(product: &Product, quantity: i64) -> Value {
    serde_json::json!({
        "customer_name": "Ana Souza",
        "customer_email": "ana@example.com",
        "customer_phone": "11987654321",
        "customer_cpf": "11144477735",
        "customer_address": "Rua das Flores, 10",
        "total_amount": (product.price_cents * quantity) as f64 / 100.0,
        "produtos": [
            {
                "id": product.id,
                "name": product.name,
                "price": product.price_cents as f64 / 100.0,
                "quantity": quantity,
            }
        ]
    })
}

/// POST a JSON body and return (status, parsed response body).
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Same as `post_json` with a bearer token attached.
pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Minimal valid payment-creation body for the storefront flow.
pub fn payment_request(amount: f64) -> Value {
    serde_json::json!({
        "amount": amount,
        "customerData": {
            "name": "Ana Souza",
            "email": "a@b.com",
            "cpf": "11144477735",
        },
        "storeApiKey": "TEST-KEY-1",
        "description": "Pedido Loja Teste",
    })
}
