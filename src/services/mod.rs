pub mod authorization;
pub mod blog_service;
pub mod donation_request_service;
pub mod funding_service;
pub mod identity_service;
pub mod payment_service;
pub mod stripe_service;
pub mod user_service;

pub use identity_service::{FirebaseVerifier, IdentityVerifier, SharedSecretVerifier};
pub use payment_service::{CheckoutSettings, PaymentProvider};
pub use stripe_service::StripeClient;
