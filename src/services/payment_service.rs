use crate::database::FundingStore;
use crate::models::{FundingRecord, Principal};
use crate::services::funding_service::validate_amount;
use crate::utils::error::AppError;
use async_trait::async_trait;
use mongodb::bson::DateTime;
use serde::Serialize;

/// What we ask the provider for when a donor starts a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub product_name: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CheckoutSessionCreated {
    pub id: String,
    pub url: String,
}

/// Provider view of a checkout session, reduced to what reconciliation needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckoutSession {
    pub id: String,
    pub payment_status: String,
    pub amount_total: Option<i64>,
    pub payment_intent: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub metadata_email: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSessionCreated, AppError>;

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, AppError>;
}

/// Settings the checkout flow needs besides the provider itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSettings {
    pub currency: String,
    pub product_name: String,
    pub client_url: String,
}

/// Amount in the smallest currency unit (cents).
pub fn to_minor_units(amount: f64) -> Result<i64, AppError> {
    let minor = (validate_amount(amount)? * 100.0).round();
    if minor < 1.0 || minor > i64::MAX as f64 {
        return Err(AppError::InvalidRequest("Amount is out of range".to_string()));
    }
    Ok(minor as i64)
}

pub async fn create_checkout_session(
    payments: &dyn PaymentProvider,
    settings: &CheckoutSettings,
    principal: &Principal,
    amount: f64,
) -> Result<CheckoutSessionCreated, AppError> {
    let request = CheckoutRequest {
        amount_minor: to_minor_units(amount)?,
        currency: settings.currency.clone(),
        product_name: settings.product_name.clone(),
        customer_email: principal.email.clone(),
        success_url: format!(
            "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
            settings.client_url
        ),
        cancel_url: format!("{}/funding", settings.client_url),
    };

    let session = payments.create_checkout_session(&request).await?;
    log::info!(
        "💳 Checkout session {} opened for {} ({} {})",
        session.id,
        principal.email,
        request.amount_minor,
        request.currency
    );
    Ok(session)
}

fn reconciliation(e: AppError) -> AppError {
    match e {
        AppError::PaymentProviderError(message) | AppError::DatabaseError(message) => {
            AppError::ReconciliationError(message)
        }
        other => other,
    }
}

fn first_present(candidates: [Option<String>; 2]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

/// Turns a paid session into exactly one funding record.
pub async fn verify_checkout_session(
    payments: &dyn PaymentProvider,
    funding: &dyn FundingStore,
    session_id: &str,
) -> Result<(FundingRecord, bool), AppError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::InvalidRequest("Session id is required".to_string()));
    }

    let session = payments
        .retrieve_checkout_session(session_id)
        .await
        .map_err(reconciliation)?;

    if session.payment_status != "paid" {
        return Err(AppError::PaymentNotCompleted(format!(
            "Payment not completed (status: {})",
            session.payment_status
        )));
    }

    let transaction_id = session.payment_intent.clone().ok_or_else(|| {
        AppError::ReconciliationError(format!("Session {} has no payment intent", session.id))
    })?;
    let amount_total = session.amount_total.ok_or_else(|| {
        AppError::ReconciliationError(format!("Session {} has no amount", session.id))
    })?;
    let email = first_present([session.customer_email.clone(), session.metadata_email.clone()])
        .ok_or_else(|| {
            AppError::ReconciliationError(format!("Session {} has no payer email", session.id))
        })?;

    let record = FundingRecord {
        id: None,
        transaction_id,
        amount: amount_total as f64 / 100.0,
        email,
        name: session.customer_name.filter(|name| !name.trim().is_empty()),
        tracking_id: session.id,
        created_at: DateTime::now(),
    };

    let (stored, inserted) = funding
        .insert_if_absent(&record)
        .await
        .map_err(reconciliation)?;

    if inserted {
        log::info!("✅ Payment {} reconciled for {}", stored.transaction_id, stored.email);
    } else {
        log::info!("↩️ Payment {} already reconciled", stored.transaction_id);
    }
    Ok((stored, inserted))
}
