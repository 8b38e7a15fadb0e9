use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User-displayable messages (Portuguese). Technical detail never goes in
/// these; it is logged server-side only.
pub mod msg {
    pub const AMOUNT_INVALID: &str = "Valor do pagamento inválido";
    pub const AMOUNT_TOO_PRECISE: &str =
        "Valor do pagamento deve ter no máximo duas casas decimais";
    pub const CUSTOMER_NAME_REQUIRED: &str = "Nome do cliente é obrigatório";
    pub const CUSTOMER_EMAIL_REQUIRED: &str = "E-mail do cliente é obrigatório";
    pub const CUSTOMER_CPF_REQUIRED: &str = "CPF do cliente é obrigatório";
    pub const STORE_API_KEY_REQUIRED: &str = "Chave de API da loja não informada";
    pub const PERIOD_TYPE_INVALID: &str = "Período de cobrança inválido";
    pub const INVALID_CPF: &str = "CPF inválido";
    pub const ORDER_DATA_INCOMPLETE: &str = "Dados do pedido incompletos";
    pub const ORDER_NOT_FOUND: &str = "Pedido não encontrado";
    pub const PROFILE_NOT_FOUND: &str = "Usuário não encontrado";
    pub const PLAN_NOT_FOUND: &str = "Plano não encontrado";
    pub const PRODUCT_NOT_FOUND: &str = "Produto não encontrado";
    pub const PAYMENT_NOT_APPROVED: &str = "Pagamento não aprovado";
    pub const SUBSCRIPTION_PAYMENT_REQUIRED: &str =
        "Nenhum pagamento aprovado encontrado para este usuário";
    pub const INVALID_DELIVERY_STATUS: &str = "Status de entrega inválido";
    pub const INVALID_SUBSCRIPTION_STATUS: &str = "Status de assinatura inválido";
    pub const PHONE_INVALID: &str = "Número de telefone inválido";
    pub const NOTIFICATION_FAILED: &str = "Falha ao enviar notificação";
    pub const GATEWAY_UNAVAILABLE: &str = "Falha ao comunicar com o gateway de pagamento";
    pub const INVALID_GATEWAY_RESPONSE: &str = "Resposta inválida do gateway de pagamento";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid CPF")]
    InvalidCpf,

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Gateway returned 2xx but an unusable payload (e.g. no `id`).
    #[error("Invalid payment response: {0}")]
    InvalidGatewayResponse(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(format!("JSON inválido: {}", rejection.body_text()))
    }
}

impl From<axum::extract::rejection::PathRejection> for AppError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        AppError::Validation(format!("Parâmetros inválidos: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, code) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone(), None),
            AppError::InvalidCpf => (
                StatusCode::BAD_REQUEST,
                msg::INVALID_CPF.to_string(),
                Some("INVALID_CPF"),
            ),
            AppError::Gateway(m) => {
                tracing::error!("Gateway error: {}", m);
                (StatusCode::BAD_GATEWAY, m.clone(), Some("PAYMENT_ERROR"))
            }
            AppError::InvalidGatewayResponse(m) => {
                tracing::error!("Invalid gateway response: {}", m);
                (
                    StatusCode::BAD_GATEWAY,
                    msg::INVALID_GATEWAY_RESPONSE.to_string(),
                    Some("PAYMENT_ERROR"),
                )
            }
            AppError::InsufficientStock(m) => (StatusCode::CONFLICT, m.clone(), None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone(), None),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Não autorizado".to_string(), None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro interno do servidor".to_string(),
                    None,
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro interno do servidor".to_string(),
                    None,
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "JSON inválido".to_string(), None)
            }
            AppError::Internal(m) => {
                tracing::error!("Internal error: {}", m);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro interno do servidor".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse { error, code };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Convenience for turning `None` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_not_found_passes_values_through() {
        let found = Some(7).or_not_found(msg::ORDER_NOT_FOUND);
        assert_eq!(found.unwrap(), 7);
    }

    #[test]
    fn test_or_not_found_maps_none_to_not_found() {
        let missing: Option<i32> = None;
        match missing.or_not_found(msg::ORDER_NOT_FOUND) {
            Err(AppError::NotFound(m)) => assert_eq!(m, msg::ORDER_NOT_FOUND),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
