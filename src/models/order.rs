use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

/// Payment/order status, set by the payment flow. Coarser than
/// `DeliveryStatus` and not mutated by the merchant UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pendente,
    Aprovado,
    Rejeitado,
    Cancelado,
    Finalizado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendente => "pendente",
            OrderStatus::Aprovado => "aprovado",
            OrderStatus::Rejeitado => "rejeitado",
            OrderStatus::Cancelado => "cancelado",
            OrderStatus::Finalizado => "finalizado",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(OrderStatus::Pendente),
            "aprovado" => Ok(OrderStatus::Aprovado),
            "rejeitado" => Ok(OrderStatus::Rejeitado),
            "cancelado" => Ok(OrderStatus::Cancelado),
            "finalizado" => Ok(OrderStatus::Finalizado),
            _ => Err(()),
        }
    }
}

/// Merchant-controlled fulfillment state, independent of payment status.
///
/// The handler validates membership in the five known values only; the UI
/// restricts which transitions are offered, but the server does not enforce
/// a transition graph (e.g. entregue -> entrega_pendente is accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    EntregaPendente,
    EmPreparacao,
    EmTransito,
    Entregue,
    Cancelado,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::EntregaPendente => "entrega_pendente",
            DeliveryStatus::EmPreparacao => "em_preparacao",
            DeliveryStatus::EmTransito => "em_transito",
            DeliveryStatus::Entregue => "entregue",
            DeliveryStatus::Cancelado => "cancelado",
        }
    }

    /// Human label used in customer notifications.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::EntregaPendente => "Entrega pendente",
            DeliveryStatus::EmPreparacao => "Em preparação",
            DeliveryStatus::EmTransito => "Em trânsito",
            DeliveryStatus::Entregue => "Entregue",
            DeliveryStatus::Cancelado => "Cancelado",
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "entrega_pendente" => Ok(DeliveryStatus::EntregaPendente),
            "em_preparacao" => Ok(DeliveryStatus::EmPreparacao),
            "em_transito" => Ok(DeliveryStatus::EmTransito),
            "entregue" => Ok(DeliveryStatus::Entregue),
            "cancelado" => Ok(DeliveryStatus::Cancelado),
            _ => Err(()),
        }
    }
}

/// One product line inside an order. Stored as JSON text on the order row;
/// prices are the decimal values shown to the customer at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Customer + cart data supplied by the storefront checkout, attached to the
/// reconciliation call and persisted once the payment is approved.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderData {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_cpf: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub customer_notes: Option<String>,
    pub total_amount: f64,
    #[serde(rename = "produtos")]
    pub items: Vec<OrderItem>,
}

impl OrderData {
    /// Data-integrity guard run right before order creation. The payment is
    /// already captured by the gateway at this point; this protects the
    /// order row, not the money.
    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.customer_name,
            &self.customer_email,
            &self.customer_phone,
            &self.customer_cpf,
            &self.customer_address,
        ];
        if required.iter().any(|f| f.trim().is_empty()) {
            return Err(AppError::Validation(msg::ORDER_DATA_INCOMPLETE.into()));
        }
        if self.items.is_empty() {
            return Err(AppError::Validation(msg::ORDER_DATA_INCOMPLETE.into()));
        }
        Ok(())
    }
}

/// Persisted order ("pedido"). Created at most once per approved payment;
/// never deleted, only status transitions.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    pub payment_id: String,
    pub store_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_cpf: String,
    pub customer_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
    pub total_cents: i64,
    #[serde(rename = "produtos")]
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub created_at: i64,
    pub updated_at: i64,
}
