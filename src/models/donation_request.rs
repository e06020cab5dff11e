use crate::models::{document_to_json, take_string};
use crate::utils::error::AppError;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};

pub const DONATION_REQUESTS_COLLECTION: &str = "donationRequests";
pub const DEFAULT_DONATION_STATUS: &str = "pending";

/// Ownership and bookkeeping fields that a patch must not touch.
pub const PROTECTED_DONATION_FIELDS: &[&str] = &["_id", "requesterEmail", "createdAt"];

/// Document of the "donationRequests" collection. Recipient, hospital, blood group,
/// date and the rest of the form are carried untouched in `details`.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationRequest {
    pub id: Option<ObjectId>,
    pub requester_email: String,
    pub status: String,
    pub created_at: DateTime,
    pub details: Document,
}

impl DonationRequest {
    pub fn from_document(mut doc: Document) -> Result<Self, AppError> {
        let id = match doc.remove("_id") {
            Some(Bson::ObjectId(oid)) => Some(oid),
            _ => None,
        };
        let requester_email = take_string(&mut doc, "requesterEmail").unwrap_or_default();
        let status = take_string(&mut doc, "status")
            .unwrap_or_else(|| DEFAULT_DONATION_STATUS.to_string());
        let created_at = match doc.remove("createdAt") {
            Some(Bson::DateTime(dt)) => dt,
            _ => DateTime::from_millis(0),
        };

        Ok(Self {
            id,
            requester_email,
            status,
            created_at,
            details: doc,
        })
    }

    pub fn to_document(&self) -> Document {
        let mut doc = doc! {
            "requesterEmail": self.requester_email.as_str(),
            "status": self.status.as_str(),
            "createdAt": self.created_at,
        };
        if let Some(id) = self.id {
            doc.insert("_id", id);
        }
        for (key, value) in self.details.iter() {
            doc.insert(key.clone(), value.clone());
        }
        doc
    }

    pub fn to_json(&self) -> serde_json::Value {
        document_to_json(&self.to_document())
    }
}
