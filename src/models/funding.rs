use crate::utils::time::to_iso_string;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

pub const FUNDING_COLLECTION: &str = "funding";

/// Document of the "funding" collection. `transaction_id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub transaction_id: String,
    pub amount: f64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    pub tracking_id: String,
    pub created_at: DateTime,
}

/// POST /funding
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFundingRequest {
    pub transaction_id: String,
    pub amount: f64,
    pub name: Option<String>,
    pub tracking_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FundingResponse {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub transaction_id: String,
    pub amount: f64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub tracking_id: String,
    pub created_at: String,
}

impl From<FundingRecord> for FundingResponse {
    fn from(record: FundingRecord) -> Self {
        Self {
            id: record.id.map(|id| id.to_hex()),
            transaction_id: record.transaction_id,
            amount: record.amount,
            email: record.email,
            name: record.name,
            tracking_id: record.tracking_id,
            created_at: to_iso_string(record.created_at),
        }
    }
}

/// Result of an idempotent funding write.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FundingWriteResponse {
    pub success: bool,
    pub inserted: bool,
    pub record: FundingResponse,
}
