use crate::config::PaymentSettings;
use crate::services::payment_service::{
    CheckoutRequest, CheckoutSession, CheckoutSessionCreated, PaymentProvider,
};
use crate::utils::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerDetails {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    #[serde(default)]
    payment_status: String,
    amount_total: Option<i64>,
    payment_intent: Option<String>,
    customer_email: Option<String>,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl From<StripeSession> for CheckoutSession {
    fn from(session: StripeSession) -> Self {
        let details = session.customer_details.unwrap_or_default();
        Self {
            id: session.id,
            payment_status: session.payment_status,
            amount_total: session.amount_total,
            payment_intent: session.payment_intent,
            customer_name: details.name,
            customer_email: details.email.or(session.customer_email),
            metadata_email: session.metadata.get("email").cloned(),
        }
    }
}

/// Stripe Checkout over the REST API (form-encoded, bearer secret key).
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(settings: &PaymentSettings) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone(),
        })
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, AppError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::PaymentProviderError(format!("Failed to read Stripe response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error.message)
                .unwrap_or_else(|| format!("Stripe returned {}", status));
            log::warn!("⚠️ Stripe error ({}): {}", status, message);
            return Err(AppError::PaymentProviderError(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::PaymentProviderError(format!("Failed to parse Stripe response: {}", e)))
    }
}

/// Stripe's bracketed form keys for a one-item checkout.
fn checkout_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "payment".to_string()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", request.currency.clone()),
        ("line_items[0][price_data][unit_amount]", request.amount_minor.to_string()),
        ("line_items[0][price_data][product_data][name]", request.product_name.clone()),
        ("customer_email", request.customer_email.clone()),
        ("metadata[email]", request.customer_email.clone()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
    ]
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSessionCreated, AppError> {
        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&checkout_form(request))
            .send()
            .await
            .map_err(|e| AppError::PaymentProviderError(format!("Request to Stripe failed: {}", e)))?;

        let session: StripeSession = Self::parse(response).await?;
        let url = session
            .url
            .ok_or_else(|| AppError::PaymentProviderError("Stripe session has no URL".to_string()))?;

        Ok(CheckoutSessionCreated { id: session.id, url })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/checkout/sessions/{}",
                self.api_base,
                urlencoding::encode(session_id)
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::PaymentProviderError(format!("Request to Stripe failed: {}", e)))?;

        let session: StripeSession = Self::parse(response).await?;
        Ok(session.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkout_form_fields() {
        let request = CheckoutRequest {
            amount_minor: 2500,
            currency: "usd".to_string(),
            product_name: "RedPulse Fund Donation".to_string(),
            customer_email: "rahim@example.com".to_string(),
            success_url: "https://app/payment-success?session_id={CHECKOUT_SESSION_ID}".to_string(),
            cancel_url: "https://app/funding".to_string(),
        };

        let form: HashMap<_, _> = checkout_form(&request).into_iter().collect();

        assert_eq!(form["line_items[0][price_data][unit_amount]"], "2500");
        assert_eq!(form["line_items[0][quantity]"], "1");
        assert_eq!(form["metadata[email]"], "rahim@example.com");
        assert_eq!(form["mode"], "payment");
    }

    #[test]
    fn test_session_mapping_prefers_customer_details() {
        let raw = json!({
            "id": "cs_test_1",
            "url": null,
            "payment_status": "paid",
            "amount_total": 2500,
            "payment_intent": "pi_1",
            "customer_email": "typed@example.com",
            "customer_details": { "name": "Rahim", "email": "card@example.com" },
            "metadata": { "email": "meta@example.com" }
        });

        let session: CheckoutSession = serde_json::from_value::<StripeSession>(raw).unwrap().into();

        assert_eq!(session.customer_email.as_deref(), Some("card@example.com"));
        assert_eq!(session.customer_name.as_deref(), Some("Rahim"));
        assert_eq!(session.metadata_email.as_deref(), Some("meta@example.com"));
        assert_eq!(session.amount_total, Some(2500));
    }

    #[test]
    fn test_session_mapping_without_details() {
        let raw = json!({
            "id": "cs_test_2",
            "payment_status": "unpaid",
            "customer_email": "typed@example.com",
            "customer_details": null,
            "metadata": {}
        });

        let session: CheckoutSession = serde_json::from_value::<StripeSession>(raw).unwrap().into();

        assert_eq!(session.customer_email.as_deref(), Some("typed@example.com"));
        assert_eq!(session.payment_intent, None);
    }
}
