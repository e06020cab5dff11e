use crate::models::{document_to_json, json_to_document, take_string};
use crate::utils::error::AppError;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const USERS_COLLECTION: &str = "users";
pub const DEFAULT_USER_STATUS: &str = "active";

/// Fields a user may never change on their own document.
pub const PROTECTED_USER_FIELDS: &[&str] = &["_id", "email", "createdAt"];
/// Fields only an admin may change.
pub const ADMIN_ONLY_USER_FIELDS: &[&str] = &["role", "status"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Donor,
    Volunteer,
    Admin,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "donor" => Role::Donor,
            "volunteer" => Role::Volunteer,
            "admin" => Role::Admin,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Donor => "donor",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
            Role::Other(other) => other,
        }
    }

    /// Admins and volunteers manage donation requests they do not own.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Volunteer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document of the "users" collection. Profile fields (bloodGroup, district,
/// upazila, name, avatar, ...) are kept as-is in `profile`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Option<ObjectId>,
    pub email: String,
    pub role: Role,
    pub status: String,
    pub created_at: Option<DateTime>,
    pub profile: Document,
}

impl User {
    /// Builds a new donor from a registration body. Client-sent role and status are ignored.
    pub fn from_registration(
        body: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, AppError> {
        let mut profile = json_to_document(body)?;
        for key in ["_id", "createdAt", "role", "status"] {
            profile.remove(key);
        }

        let email = take_string(&mut profile, "email")
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("Email is required".to_string()))?;

        Ok(Self {
            id: None,
            email,
            role: Role::Donor,
            status: DEFAULT_USER_STATUS.to_string(),
            created_at: Some(DateTime::now()),
            profile,
        })
    }

    pub fn from_document(mut doc: Document) -> Result<Self, AppError> {
        let id = match doc.remove("_id") {
            Some(Bson::ObjectId(oid)) => Some(oid),
            _ => None,
        };
        let email = take_string(&mut doc, "email")
            .ok_or_else(|| AppError::DatabaseError("User document without email".to_string()))?;
        let role = take_string(&mut doc, "role").map(|r| Role::parse(&r)).unwrap_or_default();
        let status = take_string(&mut doc, "status")
            .unwrap_or_else(|| DEFAULT_USER_STATUS.to_string());
        let created_at = match doc.remove("createdAt") {
            Some(Bson::DateTime(dt)) => Some(dt),
            _ => None,
        };

        Ok(Self {
            id,
            email,
            role,
            status,
            created_at,
            profile: doc,
        })
    }

    pub fn to_document(&self) -> Document {
        let mut doc = doc! {
            "email": self.email.as_str(),
            "role": self.role.as_str(),
            "status": self.status.as_str(),
        };
        if let Some(id) = self.id {
            doc.insert("_id", id);
        }
        if let Some(created_at) = self.created_at {
            doc.insert("createdAt", created_at);
        }
        for (key, value) in self.profile.iter() {
            doc.insert(key.clone(), value.clone());
        }
        doc
    }

    pub fn to_json(&self) -> serde_json::Value {
        document_to_json(&self.to_document())
    }
}

/// `?bloodGroup=&district=&upazila=`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSearch {
    pub blood_group: Option<String>,
    pub district: Option<String>,
    pub upazila: Option<String>,
}

impl DonorSearch {
    /// Exact-match filter over donors. At least one criterion is required.
    pub fn to_filter(&self) -> Result<Document, AppError> {
        let mut filter = doc! { "role": Role::Donor.as_str() };
        let criteria = [
            ("bloodGroup", &self.blood_group),
            ("district", &self.district),
            ("upazila", &self.upazila),
        ];

        let mut given = 0;
        for (field, value) in criteria {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                filter.insert(field, value);
                given += 1;
            }
        }

        if given == 0 {
            return Err(AppError::InvalidRequest(
                "At least one of bloodGroup, district or upazila is required".to_string(),
            ));
        }

        Ok(filter)
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserResponse {
    pub success: bool,
    pub inserted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub email: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_defaults() {
        let body = json!({ "email": "rahim@example.com", "name": "Rahim", "bloodGroup": "B+", "role": "admin" });
        let user = User::from_registration(body.as_object().cloned().unwrap()).unwrap();

        assert_eq!(user.email, "rahim@example.com");
        assert_eq!(user.role, Role::Donor);
        assert_eq!(user.status, "active");
        assert_eq!(user.profile.get_str("bloodGroup").unwrap(), "B+");
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_registration_requires_email() {
        let body = json!({ "name": "No Mail" });
        let err = User::from_registration(body.as_object().cloned().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_document_roundtrip_keeps_profile() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "email": "a@b.c",
            "role": "volunteer",
            "status": "blocked",
            "district": "Dhaka",
        };
        let user = User::from_document(doc).unwrap();
        assert_eq!(user.role, Role::Volunteer);
        assert!(user.role.is_staff());
        assert_eq!(user.to_json()["district"], "Dhaka");
    }

    #[test]
    fn test_unknown_role_is_kept() {
        assert_eq!(Role::parse("moderator").as_str(), "moderator");
        assert!(!Role::parse("moderator").is_staff());
    }

    #[test]
    fn test_donor_search_filter() {
        assert!(DonorSearch::default().to_filter().is_err());

        let blank = DonorSearch { district: Some("  ".into()), ..Default::default() };
        assert!(blank.to_filter().is_err());

        let search = DonorSearch { blood_group: Some("O-".into()), ..Default::default() };
        let filter = search.to_filter().unwrap();
        assert_eq!(filter, doc! { "role": "donor", "bloodGroup": "O-" });
    }
}
