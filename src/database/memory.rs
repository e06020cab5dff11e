// In-process backend for local runs (STORAGE_BACKEND=memory) and tests.
// Mirrors the MongoDB semantics the services rely on: exact-match filters,
// `$set` modified counts, unique email / transactionId keys.

use super::{BlogStore, DonationRequestStore, FundingStore, UpdateOutcome, UserStore};
use crate::models::{Blog, DonationRequest, FieldPatch, FundingRecord, PageRequest, User};
use crate::utils::error::AppError;
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::cmp::Reverse;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<Document>>,
    donation_requests: RwLock<Vec<Document>>,
    blogs: RwLock<Vec<Document>>,
    funding: RwLock<Vec<FundingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

/// Applies `$set` and reports whether anything changed.
fn apply_set(doc: &mut Document, patch: &Document) -> bool {
    let mut changed = false;
    for (key, value) in patch.iter() {
        if doc.get(key) != Some(value) {
            doc.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

fn created_at_millis(doc: &Document) -> i64 {
    doc.get_datetime("createdAt")
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn has_id(doc: &Document, id: ObjectId) -> bool {
    doc.get("_id") == Some(&Bson::ObjectId(id))
}

fn page_slice<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(page.skip() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

fn newest_first(mut docs: Vec<Document>) -> Vec<Document> {
    docs.sort_by_key(|doc| Reverse(created_at_millis(doc)));
    docs
}

fn with_new_id(mut doc: Document) -> (ObjectId, Document) {
    let id = ObjectId::new();
    doc.insert("_id", id);
    (id, doc)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_if_absent(&self, user: &User) -> Result<Option<ObjectId>, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|doc| doc.get_str("email").ok() == Some(user.email.as_str())) {
            return Ok(None);
        }

        let (id, doc) = with_new_id(user.to_document());
        users.push(doc);
        Ok(Some(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        users
            .iter()
            .find(|doc| doc.get_str("email").ok() == Some(email))
            .cloned()
            .map(User::from_document)
            .transpose()
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64), AppError> {
        let users = self.users.read().await;
        let slice = page_slice(&users, page)
            .into_iter()
            .map(User::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((slice, users.len() as u64))
    }

    async fn update_by_email(&self, email: &str, patch: &FieldPatch) -> Result<UpdateOutcome, AppError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|doc| doc.get_str("email").ok() == Some(email)) {
            Some(doc) => {
                let modified = apply_set(doc, patch.as_document());
                Ok(UpdateOutcome { matched: 1, modified: modified as u64 })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    async fn find_matching(&self, filter: Document) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        users
            .iter()
            .filter(|doc| matches(doc, &filter))
            .cloned()
            .map(User::from_document)
            .collect()
    }
}

#[async_trait]
impl DonationRequestStore for MemoryStore {
    async fn insert(&self, request: &DonationRequest) -> Result<ObjectId, AppError> {
        let (id, doc) = with_new_id(request.to_document());
        self.donation_requests.write().await.push(doc);
        Ok(id)
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<DonationRequest>, u64), AppError> {
        let requests = self.donation_requests.read().await;
        let sorted = newest_first(requests.clone());
        let slice = page_slice(&sorted, page)
            .into_iter()
            .map(DonationRequest::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((slice, requests.len() as u64))
    }

    async fn find_newest_first(&self, filter: Document) -> Result<Vec<DonationRequest>, AppError> {
        let requests = self.donation_requests.read().await;
        let matching = requests
            .iter()
            .filter(|doc| matches(doc, &filter))
            .cloned()
            .collect();
        newest_first(matching)
            .into_iter()
            .map(DonationRequest::from_document)
            .collect()
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<DonationRequest>, AppError> {
        let requests = self.donation_requests.read().await;
        requests
            .iter()
            .find(|doc| has_id(doc, id))
            .cloned()
            .map(DonationRequest::from_document)
            .transpose()
    }

    async fn update_by_id(&self, id: ObjectId, patch: &FieldPatch) -> Result<UpdateOutcome, AppError> {
        let mut requests = self.donation_requests.write().await;
        match requests.iter_mut().find(|doc| has_id(doc, id)) {
            Some(doc) => {
                let modified = apply_set(doc, patch.as_document());
                Ok(UpdateOutcome { matched: 1, modified: modified as u64 })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<u64, AppError> {
        let mut requests = self.donation_requests.write().await;
        let before = requests.len();
        requests.retain(|doc| !has_id(doc, id));
        Ok((before - requests.len()) as u64)
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn insert(&self, blog: &Blog) -> Result<ObjectId, AppError> {
        let (id, doc) = with_new_id(blog.to_document());
        self.blogs.write().await.push(doc);
        Ok(id)
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<Blog>, u64), AppError> {
        let blogs = self.blogs.read().await;
        let sorted = newest_first(blogs.clone());
        let slice = page_slice(&sorted, page)
            .into_iter()
            .map(Blog::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((slice, blogs.len() as u64))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, AppError> {
        let blogs = self.blogs.read().await;
        blogs
            .iter()
            .find(|doc| has_id(doc, id))
            .cloned()
            .map(Blog::from_document)
            .transpose()
    }
}

#[async_trait]
impl FundingStore for MemoryStore {
    async fn insert_if_absent(&self, record: &FundingRecord) -> Result<(FundingRecord, bool), AppError> {
        let mut funding = self.funding.write().await;
        if let Some(existing) = funding
            .iter()
            .find(|stored| stored.transaction_id == record.transaction_id)
        {
            return Ok((existing.clone(), false));
        }

        let mut stored = record.clone();
        stored.id = Some(ObjectId::new());
        funding.push(stored.clone());
        Ok((stored, true))
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<FundingRecord>, u64), AppError> {
        let funding = self.funding.read().await;
        let mut sorted = funding.clone();
        sorted.sort_by_key(|record| Reverse(record.created_at.timestamp_millis()));
        Ok((page_slice(&sorted, page), funding.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime};

    fn request(email: &str, status: &str, created_at: i64) -> DonationRequest {
        DonationRequest {
            id: None,
            requester_email: email.to_string(),
            status: status.to_string(),
            created_at: DateTime::from_millis(created_at),
            details: Document::new(),
        }
    }

    #[tokio::test]
    async fn test_set_reports_unchanged_fields() {
        let store = MemoryStore::new();
        let id = DonationRequestStore::insert(&store, &request("a@b.c", "pending", 1))
            .await
            .unwrap();

        let body = serde_json::json!({ "status": "pending" });
        let patch = FieldPatch::from_json(body.as_object().cloned().unwrap(), &[]).unwrap();
        let outcome = store.update_by_id(id, &patch).await.unwrap();

        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 0 });
    }

    #[tokio::test]
    async fn test_filter_and_order() {
        let store = MemoryStore::new();
        for (status, at) in [("done", 1), ("pending", 2), ("done", 3)] {
            DonationRequestStore::insert(&store, &request("a@b.c", status, at))
                .await
                .unwrap();
        }

        let done = store.find_newest_first(doc! { "status": "done" }).await.unwrap();
        let times: Vec<i64> = done.iter().map(|r| r.created_at.timestamp_millis()).collect();
        assert_eq!(times, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_delete_missing_reports_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.delete_by_id(ObjectId::new()).await.unwrap(), 0);
    }
}
