//! Best-effort WhatsApp notifications.
//!
//! Contract with callers: dispatch helpers always catch and log failures.
//! A notification that cannot be sent never blocks or rolls back payment or
//! order processing.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};
use crate::models::{DeliveryStatus, Order, PeriodType};
use crate::util::cents_to_amount;

const COUNTRY_CODE: &str = "55";

/// Normalize a raw phone number: strip non-digits, prefix the country code
/// when absent. Brazilian numbers are 10 or 11 digits locally, so the
/// normalized form must be exactly 12 or 13 digits.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let normalized = if digits.starts_with(COUNTRY_CODE) && digits.len() > 11 {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    };

    if normalized.len() != 12 && normalized.len() != 13 {
        return Err(AppError::Validation(msg::PHONE_INVALID.into()));
    }
    Ok(normalized)
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    phone: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// WhatsApp messaging client. With no API URL configured the notifier is
/// disabled: sends are logged and reported as success so flows behave the
/// same in environments without the messaging service.
pub struct Notifier {
    client: Client,
    api_url: Option<String>,
    api_token: String,
}

impl Notifier {
    pub fn new(api_url: Option<String>, api_token: String) -> Self {
        Notifier {
            client: Client::new(),
            api_url,
            api_token,
        }
    }

    pub fn disabled() -> Self {
        Notifier::new(None, String::new())
    }

    /// Send one text message. Callers on the payment/order path must go
    /// through the dispatch helpers instead, which swallow errors.
    pub async fn send_text(&self, raw_phone: &str, message: &str) -> Result<()> {
        let phone = normalize_phone(raw_phone)?;

        let api_url = match &self.api_url {
            Some(url) => url,
            None => {
                tracing::info!("Notifier disabled; skipping message to {}", phone);
                return Ok(());
            }
        };

        let response = self
            .client
            .post(api_url)
            .bearer_auth(&self.api_token)
            .json(&SendMessageRequest {
                phone: &phone,
                message,
            })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("WhatsApp API unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Internal(format!(
                "WhatsApp API returned {}",
                status
            )));
        }

        let body: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("WhatsApp API bad response: {}", e)))?;

        if !body.success {
            return Err(AppError::Internal(format!(
                "WhatsApp API reported failure: {}",
                body.error.unwrap_or_default()
            )));
        }

        Ok(())
    }
}

/// Order confirmation to the customer after the order is persisted.
/// Fire-and-forget: failure is logged, never raised.
pub fn dispatch_order_confirmation(notifier: Arc<Notifier>, order: &Order) {
    let phone = order.customer_phone.clone();
    let message = format!(
        "Olá, {}! Recebemos o seu pedido no valor de R$ {:.2}. Em breve ele estará em preparação.",
        order.customer_name,
        cents_to_amount(order.total_cents)
    );
    let order_id = order.id.clone();

    tokio::spawn(async move {
        if let Err(e) = notifier.send_text(&phone, &message).await {
            tracing::warn!("Order confirmation for {} not sent: {}", order_id, e);
        }
    });
}

/// Delivery-status change message to the customer.
pub fn delivery_status_message(
    customer_name: &str,
    old: DeliveryStatus,
    new: DeliveryStatus,
    reason: Option<&str>,
) -> String {
    let mut message = format!(
        "Olá, {}! O status do seu pedido mudou de \"{}\" para \"{}\".",
        customer_name,
        old.label(),
        new.label()
    );
    if let Some(reason) = reason {
        if !reason.trim().is_empty() {
            message.push_str(&format!(" Motivo: {}", reason.trim()));
        }
    }
    message
}

/// Fire-and-forget delivery-status notification.
pub fn dispatch_delivery_status_change(
    notifier: Arc<Notifier>,
    order: &Order,
    old: DeliveryStatus,
    new: DeliveryStatus,
    reason: Option<String>,
) {
    let phone = order.customer_phone.clone();
    let message = delivery_status_message(&order.customer_name, old, new, reason.as_deref());
    let order_id = order.id.clone();

    tokio::spawn(async move {
        if let Err(e) = notifier.send_text(&phone, &message).await {
            tracing::warn!(
                "Delivery status notification for {} not sent: {}",
                order_id,
                e
            );
        }
    });
}

/// Plan-change message to the subscribing user.
pub fn plan_change_message(user_name: &str, plan_name: &str, period: PeriodType) -> String {
    let period_label = match period {
        PeriodType::Monthly => "mensal",
        PeriodType::Annual => "anual",
    };
    format!(
        "Olá, {}! Sua assinatura do plano {} ({}) está ativa. Bom trabalho!",
        user_name, plan_name, period_label
    )
}
