use serde::{Deserialize, Serialize};

/// Gateway-owned payment status. The application only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    InProcess,
    Rejected,
    Error,
}

impl PaymentStatus {
    /// Parse a status string coming off the gateway wire.
    ///
    /// Unknown statuses are treated as still pending: the polling loop keeps
    /// going and no persistence happens.
    pub fn from_gateway(s: &str) -> Self {
        match s {
            "approved" => PaymentStatus::Approved,
            "rejected" => PaymentStatus::Rejected,
            "in_process" => PaymentStatus::InProcess,
            "error" => PaymentStatus::Error,
            _ => PaymentStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::InProcess => "in_process",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Error => "error",
        }
    }

    /// Terminal statuses stop the polling loop.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Approved | PaymentStatus::Rejected | PaymentStatus::Error
        )
    }
}

/// PIX QR data from the gateway (copy-paste string + base64 image).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PixQr {
    #[serde(default)]
    pub qr_code: String,
    #[serde(default)]
    pub qr_code_base64: String,
}

/// Point-in-time snapshot of a gateway payment. The gateway owns the object;
/// we hold the id plus whatever we last read for display.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: String,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    pub transaction_amount: f64,
    pub description: String,
    pub point_of_interaction: PixQr,
}

impl Payment {
    /// Synthetic approved payment for zero-amount checkouts (free plan
    /// activation). Never touches the gateway; QR fields stay empty.
    pub fn synthetic_approved(amount: f64, description: &str) -> Self {
        Payment {
            id: format!("manual_{}", uuid::Uuid::new_v4().as_simple()),
            status: PaymentStatus::Approved,
            status_detail: Some("accredited".to_string()),
            transaction_amount: amount,
            description: description.to_string(),
            point_of_interaction: PixQr::default(),
        }
    }
}

/// Customer identification for payment creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub cpf: String,
}

/// Request body for payment creation, shared by the storefront checkout and
/// the plan-subscription checkout. `period_type` is present only on the plan
/// flow and is validated as a string so invalid values produce the
/// user-facing Portuguese message rather than a deserialization error.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: f64,
    #[serde(rename = "customerData")]
    pub customer_data: CustomerData,
    #[serde(rename = "storeApiKey", default)]
    pub store_api_key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub period_type: Option<String>,
}
