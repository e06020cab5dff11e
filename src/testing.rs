// Test doubles shared by the unit and handler tests.

use crate::database::{MemoryStore, UserStore};
use crate::models::{Principal, Role, User};
use crate::services::payment_service::{
    CheckoutRequest, CheckoutSession, CheckoutSessionCreated, CheckoutSettings, PaymentProvider,
};
use crate::services::SharedSecretVerifier;
use crate::state::AppState;
use crate::utils::error::AppError;
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::{DateTime, Document};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "redpulse-test-secret";

pub fn principal(email: &str) -> Principal {
    Principal {
        uid: format!("uid-{}", email),
        email: email.to_string(),
    }
}

/// HS256 token accepted by `SharedSecretVerifier::new(TEST_SECRET)`.
pub fn sign_token(email: &str) -> String {
    let claims = serde_json::json!({
        "sub": format!("uid-{}", email),
        "email": email,
        "iat": chrono::Utc::now().timestamp(),
        "exp": chrono::Utc::now().timestamp() + 600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("test token")
}

pub fn bearer(email: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", sign_token(email)))
}

/// Stores a user with the given role, bypassing registration defaults.
pub async fn register(users: &dyn UserStore, email: &str, role: &str) {
    let user = User {
        id: None,
        email: email.to_string(),
        role: Role::parse(role),
        status: "active".to_string(),
        created_at: Some(DateTime::now()),
        profile: Document::new(),
    };
    users.insert_if_absent(&user).await.expect("seed user");
}

pub fn paid_session(id: &str, payment_intent: &str, amount_total: i64) -> CheckoutSession {
    CheckoutSession {
        id: id.to_string(),
        payment_status: "paid".to_string(),
        amount_total: Some(amount_total),
        payment_intent: Some(payment_intent.to_string()),
        customer_name: Some("Rahim".to_string()),
        customer_email: Some("rahim@example.com".to_string()),
        metadata_email: Some("rahim@example.com".to_string()),
    }
}

/// In-memory payment provider: serves preset sessions and records checkout requests.
#[derive(Default)]
pub struct FakePayments {
    sessions: HashMap<String, CheckoutSession>,
    requests: Mutex<Vec<CheckoutRequest>>,
    rejection: Option<String>,
}

impl FakePayments {
    pub fn with_session(session: CheckoutSession) -> Self {
        let mut fake = Self::default();
        fake.sessions.insert(session.id.clone(), session);
        fake
    }

    /// Provider that refuses every checkout with `message`.
    pub fn rejecting(message: &str) -> Self {
        Self {
            rejection: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn last_request(&self) -> Option<CheckoutRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSessionCreated, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.rejection {
            return Err(AppError::PaymentProviderError(message.clone()));
        }
        Ok(CheckoutSessionCreated {
            id: "cs_test_new".to_string(),
            url: "https://checkout.example/pay/cs_test_new".to_string(),
        })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, AppError> {
        self.sessions.get(session_id).cloned().ok_or_else(|| {
            AppError::PaymentProviderError(format!("No such checkout session: {}", session_id))
        })
    }
}

pub fn test_state(payments: FakePayments) -> AppState {
    AppState::with_store(
        Arc::new(MemoryStore::new()),
        Arc::new(SharedSecretVerifier::new(TEST_SECRET)),
        Arc::new(payments),
        CheckoutSettings {
            currency: "usd".to_string(),
            product_name: "RedPulse Fund Donation".to_string(),
            client_url: "https://redpulse.example".to_string(),
        },
        50,
    )
}

/// Initialised actix service with every route, the way `main` mounts them.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .wrap(crate::middleware::SecurityHeaders)
                .configure(crate::api::configure),
        )
    };
}

pub(crate) use test_app;
