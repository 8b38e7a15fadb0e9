use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{msg, AppError, Result};
use crate::models::{Payment, PaymentStatus, PixQr};

use super::{GatewayPaymentRequest, PaymentGateway};

/// HTTP client for the PIX payment gateway.
///
/// Authenticated per request with the store's API key; the platform itself
/// holds no gateway credentials.
#[derive(Debug, Clone)]
pub struct PixClient {
    client: Client,
    base_url: String,
}

/// Raw gateway payment payload. `id` is typed loosely because the gateway
/// returns a numeric id; everything is normalized before leaving this
/// module.
#[derive(Debug, Deserialize)]
struct GatewayPaymentResponse {
    id: Option<Value>,
    status: Option<String>,
    status_detail: Option<String>,
    #[serde(default)]
    transaction_amount: f64,
    #[serde(default)]
    description: String,
    point_of_interaction: Option<GatewayPointOfInteraction>,
}

#[derive(Debug, Deserialize)]
struct GatewayPointOfInteraction {
    transaction_data: Option<PixQr>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl PixClient {
    pub fn new(base_url: &str) -> Self {
        PixClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extract the gateway's own message from an error body, falling back to
    /// a generic Portuguese message when the body is opaque.
    fn error_message(body: &str) -> String {
        serde_json::from_str::<GatewayErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| msg::GATEWAY_UNAVAILABLE.to_string())
    }

    fn normalize(response: GatewayPaymentResponse) -> Result<Payment> {
        let id = match response.id {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(AppError::InvalidGatewayResponse(
                    "payment response missing id".into(),
                ))
            }
        };

        let status = response
            .status
            .as_deref()
            .map(PaymentStatus::from_gateway)
            .unwrap_or(PaymentStatus::Pending);

        Ok(Payment {
            id,
            status,
            status_detail: response.status_detail,
            transaction_amount: response.transaction_amount,
            description: response.description,
            point_of_interaction: response
                .point_of_interaction
                .and_then(|p| p.transaction_data)
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PaymentGateway for PixClient {
    async fn create_payment(
        &self,
        api_key: &str,
        request: &GatewayPaymentRequest,
        idempotency_key: &str,
    ) -> Result<Payment> {
        let response = self
            .client
            .post(format!("{}/v1/payments", self.base_url))
            .bearer_auth(api_key)
            .header("X-Idempotency-Key", idempotency_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gateway create_payment request failed: {}", e);
                AppError::Gateway(msg::GATEWAY_UNAVAILABLE.to_string())
            })?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(Self::error_message(&body)));
        }

        let payload: GatewayPaymentResponse = response.json().await.map_err(|e| {
            AppError::InvalidGatewayResponse(format!("unparseable payment response: {}", e))
        })?;

        Self::normalize(payload)
    }

    async fn get_payment(&self, api_key: &str, payment_id: &str) -> Result<Payment> {
        let response = self
            .client
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gateway get_payment request failed: {}", e);
                AppError::Gateway(msg::GATEWAY_UNAVAILABLE.to_string())
            })?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(Self::error_message(&body)));
        }

        let payload: GatewayPaymentResponse = response.json().await.map_err(|e| {
            AppError::InvalidGatewayResponse(format!("unparseable payment response: {}", e))
        })?;

        Self::normalize(payload)
    }
}
