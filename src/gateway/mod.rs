mod pix;

pub use pix::PixClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::Payment;

/// Fixed merchant address fields sent with every payment. The gateway
/// requires a payer address; the platform uses its registered address for
/// all stores.
pub const MERCHANT_ZIP_CODE: &str = "01310100";
pub const MERCHANT_STREET_NAME: &str = "Avenida Paulista";
pub const MERCHANT_STREET_NUMBER: &str = "1000";
pub const MERCHANT_NEIGHBORHOOD: &str = "Bela Vista";
pub const MERCHANT_CITY: &str = "São Paulo";
pub const MERCHANT_FEDERAL_UNIT: &str = "SP";

/// Payment-creation payload in the gateway's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayPaymentRequest {
    pub transaction_amount: f64,
    pub description: String,
    pub payment_method_id: &'static str,
    pub payer: GatewayPayer,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayPayer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub identification: GatewayIdentification,
    pub address: GatewayAddress,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayIdentification {
    #[serde(rename = "type")]
    pub id_type: &'static str,
    pub number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayAddress {
    pub zip_code: &'static str,
    pub street_name: &'static str,
    pub street_number: &'static str,
    pub neighborhood: &'static str,
    pub city: &'static str,
    pub federal_unit: &'static str,
}

impl GatewayAddress {
    pub fn merchant() -> Self {
        GatewayAddress {
            zip_code: MERCHANT_ZIP_CODE,
            street_name: MERCHANT_STREET_NAME,
            street_number: MERCHANT_STREET_NUMBER,
            neighborhood: MERCHANT_NEIGHBORHOOD,
            city: MERCHANT_CITY,
            federal_unit: MERCHANT_FEDERAL_UNIT,
        }
    }
}

/// Build the gateway payload from checkout data.
///
/// Deterministic field defaults: fixed merchant address, PIX as the payment
/// method, and the payer name split into first/last at the first space.
pub fn build_payment_request(
    amount: f64,
    name: &str,
    email: &str,
    cpf: &str,
    description: &str,
) -> GatewayPaymentRequest {
    let name = name.trim();
    let (first_name, last_name) = match name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (name.to_string(), String::new()),
    };
    let cpf_digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();

    GatewayPaymentRequest {
        transaction_amount: amount,
        description: description.to_string(),
        payment_method_id: "pix",
        payer: GatewayPayer {
            email: email.to_string(),
            first_name,
            last_name,
            identification: GatewayIdentification {
                id_type: "CPF",
                number: cpf_digits,
            },
            address: GatewayAddress::merchant(),
        },
    }
}

/// PIX payment gateway seam. One HTTP implementation in production; tests
/// substitute a programmable in-process gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment. Exactly one outbound call per invocation; the
    /// idempotency key lets the gateway collapse network-level retries.
    async fn create_payment(
        &self,
        api_key: &str,
        request: &GatewayPaymentRequest,
        idempotency_key: &str,
    ) -> Result<Payment>;

    /// Fetch the current status snapshot for a payment id.
    async fn get_payment(&self, api_key: &str, payment_id: &str) -> Result<Payment>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_split_at_first_space() {
        let req = build_payment_request(10.0, "Maria da Silva", "m@a.com", "111", "x");
        assert_eq!(req.payer.first_name, "Maria");
        assert_eq!(req.payer.last_name, "da Silva");
    }

    #[test]
    fn test_single_name_has_empty_last_name() {
        let req = build_payment_request(10.0, "Maria", "m@a.com", "111", "x");
        assert_eq!(req.payer.first_name, "Maria");
        assert_eq!(req.payer.last_name, "");
    }

    #[test]
    fn test_cpf_is_stripped_to_digits() {
        let req = build_payment_request(10.0, "A B", "a@b.com", "111.444.777-35", "x");
        assert_eq!(req.payer.identification.number, "11144477735");
    }

    #[test]
    fn test_fixed_defaults() {
        let req = build_payment_request(10.0, "A B", "a@b.com", "111", "x");
        assert_eq!(req.payment_method_id, "pix");
        assert_eq!(req.payer.address.city, MERCHANT_CITY);
        assert_eq!(req.payer.identification.id_type, "CPF");
    }
}
