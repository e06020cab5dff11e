use crate::models::json_to_document;
use crate::utils::error::AppError;
use mongodb::bson::Document;

/// A validated partial update, applied with `$set`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPatch(Document);

impl FieldPatch {
    /// Rejects empty patches, operator keys and any key listed in `protected`.
    pub fn from_json(
        body: serde_json::Map<String, serde_json::Value>,
        protected: &[&str],
    ) -> Result<Self, AppError> {
        if body.is_empty() {
            return Err(AppError::InvalidRequest("No fields to update".to_string()));
        }

        for key in body.keys() {
            if key.starts_with('$') || key.contains('.') {
                return Err(AppError::InvalidRequest(format!("Invalid field name: {}", key)));
            }
            if protected.contains(&key.as_str()) {
                return Err(AppError::InvalidRequest(format!("Field '{}' cannot be updated", key)));
            }
        }

        Ok(Self(json_to_document(body)?))
    }

    pub fn touches(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }
}
