use base64::Engine;
use serde::Deserialize;
use std::env;

const DEFAULT_ORIGINS: &str =
    "http://localhost:5173,http://localhost:5174,http://localhost:5175,https://b12-m11-session.web.app";

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    MongoDB { uri: String, database: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthProvider {
    Firebase { project_id: String },
    SharedSecret { secret: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSettings {
    pub secret_key: String,
    pub api_base: String,
    pub currency: String,
    pub product_name: String,
    pub client_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub auth: AuthProvider,
    pub payments: PaymentSettings,
    pub allowed_origins: Vec<String>,
    pub max_page_limit: u64,
}

/// Only the field we need from the Firebase service-account JSON.
#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = or("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| format!("PORT is not a valid port: {}", e))?;

        let storage = match or("STORAGE_BACKEND", "mongodb").as_str() {
            "mongodb" => StorageBackend::MongoDB {
                uri: get("MONGODB_URI").ok_or("MONGODB_URI must be set")?,
                database: or("MONGODB_DATABASE", "RedPulseDB"),
            },
            "memory" => StorageBackend::Memory,
            other => return Err(format!("Unknown STORAGE_BACKEND: {}", other)),
        };

        let auth = match or("AUTH_PROVIDER", "firebase").as_str() {
            "firebase" => {
                let project_id = match get("FIREBASE_PROJECT_ID") {
                    Some(project_id) => project_id,
                    None => {
                        let encoded = get("FB_SERVICE_KEY")
                            .ok_or("FIREBASE_PROJECT_ID or FB_SERVICE_KEY must be set")?;
                        project_id_from_service_key(&encoded)?
                    }
                };
                AuthProvider::Firebase { project_id }
            }
            "shared-secret" => AuthProvider::SharedSecret {
                secret: get("JWT_SECRET").ok_or("JWT_SECRET must be set")?,
            },
            other => return Err(format!("Unknown AUTH_PROVIDER: {}", other)),
        };

        let payments = PaymentSettings {
            secret_key: get("STRIPE_SECRET_KEY").ok_or("STRIPE_SECRET_KEY must be set")?,
            api_base: or("STRIPE_API_BASE", "https://api.stripe.com/v1"),
            currency: or("PAYMENT_CURRENCY", "usd"),
            product_name: or("PAYMENT_PRODUCT_NAME", "RedPulse Fund Donation"),
            client_url: or("CLIENT_URL", "http://localhost:5173")
                .trim_end_matches('/')
                .to_string(),
        };

        let allowed_origins = or("CORS_ORIGINS", DEFAULT_ORIGINS)
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let max_page_limit = or("MAX_PAGE_LIMIT", "50")
            .parse::<u64>()
            .map_err(|e| format!("MAX_PAGE_LIMIT is not a number: {}", e))?
            .max(1);

        Ok(Self {
            host: or("HOST", "0.0.0.0"),
            port,
            storage,
            auth,
            payments,
            allowed_origins,
            max_page_limit,
        })
    }
}

/// `FB_SERVICE_KEY` is the base64-encoded service-account JSON.
fn project_id_from_service_key(encoded: &str) -> Result<String, String> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("FB_SERVICE_KEY is not valid base64: {}", e))?;
    let account: ServiceAccount = serde_json::from_slice(&decoded)
        .map_err(|e| format!("FB_SERVICE_KEY is not a service-account JSON: {}", e))?;
    Ok(account.project_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("FIREBASE_PROJECT_ID", "redpulse-app"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(
            config.storage,
            StorageBackend::MongoDB {
                uri: "mongodb://localhost:27017".to_string(),
                database: "RedPulseDB".to_string()
            }
        );
        assert_eq!(config.auth, AuthProvider::Firebase { project_id: "redpulse-app".to_string() });
        assert_eq!(config.allowed_origins.len(), 4);
        assert_eq!(config.max_page_limit, 50);
        assert_eq!(config.payments.currency, "usd");
    }

    #[test]
    fn test_project_id_from_service_key() {
        let json = r#"{"type":"service_account","project_id":"redpulse-prod"}"#;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);

        let config = AppConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("FB_SERVICE_KEY", encoded.as_str()),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("CLIENT_URL", "https://redpulse.example/"),
        ]))
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.auth, AuthProvider::Firebase { project_id: "redpulse-prod".to_string() });
        assert_eq!(config.payments.client_url, "https://redpulse.example");
    }

    #[test]
    fn test_missing_required_values() {
        let err = AppConfig::from_lookup(lookup(&[("STRIPE_SECRET_KEY", "sk")])).unwrap_err();
        assert!(err.contains("MONGODB_URI"));

        let err = AppConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("AUTH_PROVIDER", "shared-secret"),
            ("STRIPE_SECRET_KEY", "sk"),
        ]))
        .unwrap_err();
        assert!(err.contains("JWT_SECRET"));
    }
}
