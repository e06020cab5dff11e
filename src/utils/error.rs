use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    InvalidRequest(String),
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    PaymentNotCompleted(String),
    PaymentProviderError(String),
    ReconciliationError(String),
    DatabaseError(String),
    ConfigError(String),
}

impl AppError {
    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthenticated(_) => "Unauthorized Access!".to_string(),
            AppError::Forbidden(_) => "Forbidden!".to_string(),
            AppError::DatabaseError(_) => "Database error".to_string(),
            AppError::InvalidRequest(msg)
            | AppError::NotFound(msg)
            | AppError::PaymentNotCompleted(msg)
            | AppError::PaymentProviderError(msg)
            | AppError::ReconciliationError(msg)
            | AppError::ConfigError(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::PaymentNotCompleted(msg) => write!(f, "Payment not completed: {}", msg),
            AppError::PaymentProviderError(msg) => write!(f, "Payment provider error: {}", msg),
            AppError::ReconciliationError(msg) => write!(f, "Reconciliation error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::PaymentNotCompleted(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PaymentProviderError(_)
            | AppError::ReconciliationError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("❌ {}", self);
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.public_message()
        }))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AppError::DatabaseError(format!("Failed to encode document: {}", e))
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        AppError::DatabaseError(format!("Failed to decode document: {}", e))
    }
}
