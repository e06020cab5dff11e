use serde::{Deserialize, Serialize};

/// Identity proven by the bearer token, attached to the request by `AuthMiddleware`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}
