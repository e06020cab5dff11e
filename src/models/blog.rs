use crate::models::document_to_json;
use crate::utils::error::AppError;
use mongodb::bson::{oid::ObjectId, Bson, DateTime, Document};

pub const BLOGS_COLLECTION: &str = "blogs";

/// Document of the "blogs" collection (title, thumbnail, content, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Blog {
    pub id: Option<ObjectId>,
    pub created_at: DateTime,
    pub content: Document,
}

impl Blog {
    pub fn from_document(mut doc: Document) -> Result<Self, AppError> {
        let id = match doc.remove("_id") {
            Some(Bson::ObjectId(oid)) => Some(oid),
            _ => None,
        };
        let created_at = match doc.remove("createdAt") {
            Some(Bson::DateTime(dt)) => dt,
            _ => DateTime::from_millis(0),
        };

        Ok(Self {
            id,
            created_at,
            content: doc,
        })
    }

    pub fn to_document(&self) -> Document {
        let mut doc = self.content.clone();
        if let Some(id) = self.id {
            doc.insert("_id", id);
        }
        doc.insert("createdAt", self.created_at);
        doc
    }

    pub fn to_json(&self) -> serde_json::Value {
        document_to_json(&self.to_document())
    }
}
