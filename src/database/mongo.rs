// Store implementations over MongoDB collections.

use super::{BlogStore, DonationRequestStore, FundingStore, MongoDB, UpdateOutcome, UserStore};
use crate::models::{
    Blog, DonationRequest, FieldPatch, FundingRecord, PageRequest, User, BLOGS_COLLECTION,
    DONATION_REQUESTS_COLLECTION, FUNDING_COLLECTION, USERS_COLLECTION,
};
use crate::utils::error::AppError;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::Collection;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Two concurrent upserts on a unique key: the loser gets E11000.
fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl MongoDB {
    fn documents(&self, name: &str) -> Collection<Document> {
        self.collection::<Document>(name)
    }

    async fn page_of(
        &self,
        name: &str,
        sort: Document,
        page: PageRequest,
    ) -> Result<(Vec<Document>, u64), AppError> {
        let collection = self.documents(name);
        let total = collection.count_documents(doc! {}).await?;
        let docs: Vec<Document> = collection
            .find(doc! {})
            .sort(sort)
            .skip(page.skip())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((docs, total))
    }
}

#[async_trait]
impl UserStore for MongoDB {
    async fn insert_if_absent(&self, user: &User) -> Result<Option<ObjectId>, AppError> {
        let mut fields = user.to_document();
        fields.remove("_id");

        let result = self
            .documents(USERS_COLLECTION)
            .update_one(doc! { "email": user.email.as_str() }, doc! { "$setOnInsert": fields })
            .upsert(true)
            .await;

        match result {
            Ok(outcome) => Ok(outcome.upserted_id.and_then(|id| id.as_object_id())),
            Err(e) if is_duplicate_key(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.documents(USERS_COLLECTION)
            .find_one(doc! { "email": email })
            .await?
            .map(User::from_document)
            .transpose()
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64), AppError> {
        let (docs, total) = self.page_of(USERS_COLLECTION, doc! { "_id": 1 }, page).await?;
        let users = docs
            .into_iter()
            .map(User::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total))
    }

    async fn update_by_email(&self, email: &str, patch: &FieldPatch) -> Result<UpdateOutcome, AppError> {
        let result = self
            .documents(USERS_COLLECTION)
            .update_one(doc! { "email": email }, doc! { "$set": patch.as_document().clone() })
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn find_matching(&self, filter: Document) -> Result<Vec<User>, AppError> {
        let docs: Vec<Document> = self
            .documents(USERS_COLLECTION)
            .find(filter)
            .await?
            .try_collect()
            .await?;

        docs.into_iter().map(User::from_document).collect()
    }
}

#[async_trait]
impl DonationRequestStore for MongoDB {
    async fn insert(&self, request: &DonationRequest) -> Result<ObjectId, AppError> {
        let mut document = request.to_document();
        document.remove("_id");

        let result = self
            .documents(DONATION_REQUESTS_COLLECTION)
            .insert_one(document)
            .await?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::DatabaseError("Inserted id is not an ObjectId".to_string()))
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<DonationRequest>, u64), AppError> {
        let (docs, total) = self
            .page_of(DONATION_REQUESTS_COLLECTION, doc! { "createdAt": -1 }, page)
            .await?;
        let requests = docs
            .into_iter()
            .map(DonationRequest::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((requests, total))
    }

    async fn find_newest_first(&self, filter: Document) -> Result<Vec<DonationRequest>, AppError> {
        let docs: Vec<Document> = self
            .documents(DONATION_REQUESTS_COLLECTION)
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;

        docs.into_iter().map(DonationRequest::from_document).collect()
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<DonationRequest>, AppError> {
        self.documents(DONATION_REQUESTS_COLLECTION)
            .find_one(doc! { "_id": id })
            .await?
            .map(DonationRequest::from_document)
            .transpose()
    }

    async fn update_by_id(&self, id: ObjectId, patch: &FieldPatch) -> Result<UpdateOutcome, AppError> {
        let result = self
            .documents(DONATION_REQUESTS_COLLECTION)
            .update_one(doc! { "_id": id }, doc! { "$set": patch.as_document().clone() })
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<u64, AppError> {
        let result = self
            .documents(DONATION_REQUESTS_COLLECTION)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl BlogStore for MongoDB {
    async fn insert(&self, blog: &Blog) -> Result<ObjectId, AppError> {
        let mut document = blog.to_document();
        document.remove("_id");

        let result = self.documents(BLOGS_COLLECTION).insert_one(document).await?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::DatabaseError("Inserted id is not an ObjectId".to_string()))
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<Blog>, u64), AppError> {
        let (docs, total) = self
            .page_of(BLOGS_COLLECTION, doc! { "createdAt": -1 }, page)
            .await?;
        let blogs = docs
            .into_iter()
            .map(Blog::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((blogs, total))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, AppError> {
        self.documents(BLOGS_COLLECTION)
            .find_one(doc! { "_id": id })
            .await?
            .map(Blog::from_document)
            .transpose()
    }
}

#[async_trait]
impl FundingStore for MongoDB {
    async fn insert_if_absent(&self, record: &FundingRecord) -> Result<(FundingRecord, bool), AppError> {
        let mut fields = mongodb::bson::to_document(record)?;
        fields.remove("_id");
        let key = doc! { "transactionId": record.transaction_id.as_str() };

        let result = self
            .documents(FUNDING_COLLECTION)
            .update_one(key.clone(), doc! { "$setOnInsert": fields })
            .upsert(true)
            .await;

        match result {
            Ok(outcome) => {
                if let Some(id) = outcome.upserted_id.and_then(|id| id.as_object_id()) {
                    let mut stored = record.clone();
                    stored.id = Some(id);
                    return Ok((stored, true));
                }
            }
            Err(e) if is_duplicate_key(&e) => {
                log::debug!("Concurrent insert for transaction {}", record.transaction_id);
            }
            Err(e) => return Err(e.into()),
        }

        let existing = self
            .collection::<FundingRecord>(FUNDING_COLLECTION)
            .find_one(key)
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError(format!(
                    "Funding record {} vanished after upsert",
                    record.transaction_id
                ))
            })?;

        Ok((existing, false))
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<FundingRecord>, u64), AppError> {
        let collection = self.collection::<FundingRecord>(FUNDING_COLLECTION);
        let total = collection.count_documents(doc! {}).await?;
        let records: Vec<FundingRecord> = collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((records, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_registration_against_mongodb() {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db = MongoDB::new(&uri, "redpulse_test").await.unwrap();

        let email = format!("{}@example.com", ObjectId::new().to_hex());
        let body = serde_json::json!({ "email": email });
        let user = User::from_registration(body.as_object().cloned().unwrap()).unwrap();

        assert!(UserStore::insert_if_absent(&db, &user).await.unwrap().is_some());
        assert!(UserStore::insert_if_absent(&db, &user).await.unwrap().is_none());
    }
}
