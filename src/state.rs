use crate::database::{BlogStore, DonationRequestStore, FundingStore, UserStore};
use crate::services::{CheckoutSettings, IdentityVerifier, PaymentProvider};
use std::sync::Arc;

/// Everything a handler needs, built once at startup and shared through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub donation_requests: Arc<dyn DonationRequestStore>,
    pub blogs: Arc<dyn BlogStore>,
    pub funding: Arc<dyn FundingStore>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub payments: Arc<dyn PaymentProvider>,
    pub checkout: CheckoutSettings,
    pub max_page_limit: u64,
}

impl AppState {
    /// Wires every store to the same backend.
    pub fn with_store<S>(
        store: Arc<S>,
        identity: Arc<dyn IdentityVerifier>,
        payments: Arc<dyn PaymentProvider>,
        checkout: CheckoutSettings,
        max_page_limit: u64,
    ) -> Self
    where
        S: UserStore + DonationRequestStore + BlogStore + FundingStore + 'static,
    {
        Self {
            users: store.clone(),
            donation_requests: store.clone(),
            blogs: store.clone(),
            funding: store,
            identity,
            payments,
            checkout,
            max_page_limit,
        }
    }
}
