//! Payment creation: validation, payload build, gateway call, response
//! normalization. Shared by the storefront checkout and the plan checkout.

use crate::cpf::is_valid_cpf;
use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::gateway::build_payment_request;
use crate::idempotency::new_idempotency_key;
use crate::models::{CreatePaymentRequest, Payment, PeriodType};
use crate::util::amount_to_cents;

/// Validated form of a payment-creation request.
pub struct ValidatedPayment {
    pub amount: f64,
    pub period_type: Option<PeriodType>,
}

/// Fail-fast validation; the first violation wins.
///
/// Order: amount, then customer fields, then the store API key, then (plan
/// flow only) period_type and CPF checksum. The storefront path checks CPF
/// presence but not checksum while the plan path checks both — observed
/// behavior, kept as-is pending product clarification.
pub fn validate_payment_request(request: &CreatePaymentRequest) -> Result<ValidatedPayment> {
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Err(AppError::Validation(msg::AMOUNT_INVALID.into()));
    }
    // Rejects sub-cent precision as well.
    amount_to_cents(request.amount)?;

    if request.customer_data.name.trim().is_empty() {
        return Err(AppError::Validation(msg::CUSTOMER_NAME_REQUIRED.into()));
    }
    if request.customer_data.email.trim().is_empty() {
        return Err(AppError::Validation(msg::CUSTOMER_EMAIL_REQUIRED.into()));
    }
    if request.customer_data.cpf.trim().is_empty() {
        return Err(AppError::Validation(msg::CUSTOMER_CPF_REQUIRED.into()));
    }
    if request.store_api_key.trim().is_empty() {
        return Err(AppError::Validation(msg::STORE_API_KEY_REQUIRED.into()));
    }

    let period_type = match &request.period_type {
        Some(raw) => {
            let period: PeriodType = raw
                .parse()
                .map_err(|_| AppError::Validation(msg::PERIOD_TYPE_INVALID.into()))?;
            if !is_valid_cpf(&request.customer_data.cpf) {
                return Err(AppError::InvalidCpf);
            }
            Some(period)
        }
        None => None,
    };

    Ok(ValidatedPayment {
        amount: request.amount,
        period_type,
    })
}

/// Create a payment at the gateway (or synthesize one for zero amounts).
///
/// Zero-amount requests, i.e. free-plan activation, short-circuit to a
/// synthetic approved payment with empty QR fields and make no gateway call.
/// Everything else goes out exactly once, under a fresh idempotency key.
/// Nothing is persisted here; persistence happens only on confirmed
/// approval during reconciliation.
///
/// Returns the payment together with the validated billing period so the
/// plan flow can echo it back.
pub async fn create_checkout_payment(
    state: &AppState,
    request: &CreatePaymentRequest,
) -> Result<(Payment, Option<PeriodType>)> {
    let validated = validate_payment_request(request)?;

    if validated.amount == 0.0 {
        let payment = Payment::synthetic_approved(0.0, &request.description);
        return Ok((payment, validated.period_type));
    }

    let payload = build_payment_request(
        validated.amount,
        &request.customer_data.name,
        &request.customer_data.email,
        &request.customer_data.cpf,
        &request.description,
    );

    let payment = state
        .gateway
        .create_payment(&request.store_api_key, &payload, &new_idempotency_key())
        .await?;

    Ok((payment, validated.period_type))
}
