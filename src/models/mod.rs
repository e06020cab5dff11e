pub mod blog;
pub mod donation_request;
pub mod funding;
pub mod pagination;
pub mod patch;
pub mod principal;
pub mod user;

pub use blog::*;
pub use donation_request::*;
pub use funding::*;
pub use pagination::*;
pub use patch::*;
pub use principal::*;
pub use user::*;

use crate::utils::{error::AppError, time::to_iso_string};
use mongodb::bson::{oid::ObjectId, Bson, Document};

/// Converts a JSON request body into a BSON document.
pub fn json_to_document(map: serde_json::Map<String, serde_json::Value>) -> Result<Document, AppError> {
    mongodb::bson::to_document(&map)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid document: {}", e)))
}

/// JSON view of a stored document: ObjectIds as hex strings, dates as ISO strings.
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    serde_json::Value::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), bson_to_json(value)))
            .collect(),
    )
}

fn bson_to_json(value: &Bson) -> serde_json::Value {
    match value {
        Bson::ObjectId(oid) => serde_json::Value::String(oid.to_hex()),
        Bson::DateTime(dt) => serde_json::Value::String(to_iso_string(*dt)),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => serde_json::Value::Array(items.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Parses a path id, rejecting anything that is not a 24-char hex ObjectId.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::InvalidRequest(format!("Invalid id: {}", raw)))
}

pub(crate) fn take_string(doc: &mut Document, key: &str) -> Option<String> {
    match doc.remove(key) {
        Some(Bson::String(s)) => Some(s),
        Some(other) => {
            doc.insert(key, other);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime};

    #[test]
    fn test_document_to_json_renders_ids_and_dates() {
        let oid = ObjectId::parse_str("65a1b2c3d4e5f6a7b8c9d0e1").unwrap();
        let doc = doc! {
            "_id": oid,
            "createdAt": DateTime::from_millis(1_704_067_200_000),
            "units": 2_i32,
            "nested": { "tags": ["a", "b"] },
        };

        let json = document_to_json(&doc);

        assert_eq!(json["_id"], "65a1b2c3d4e5f6a7b8c9d0e1");
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(json["units"], 2);
        assert_eq!(json["nested"]["tags"][1], "b");
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("65a1b2c3d4e5f6a7b8c9d0e1").is_ok());
        assert!(matches!(parse_object_id("nope"), Err(AppError::InvalidRequest(_))));
    }
}
