pub mod memory;
mod mongo;

pub use memory::MemoryStore;

use crate::models::{Blog, DonationRequest, FieldPatch, FundingRecord, PageRequest, User};
use crate::utils::error::AppError;
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use mongodb::{Client, Collection, Database};

/// Matched/modified counts of a `$set` update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts unless a user with the same email exists. Returns the new id when inserted.
    async fn insert_if_absent(&self, user: &User) -> Result<Option<ObjectId>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64), AppError>;
    async fn update_by_email(&self, email: &str, patch: &FieldPatch) -> Result<UpdateOutcome, AppError>;
    async fn find_matching(&self, filter: Document) -> Result<Vec<User>, AppError>;
}

#[async_trait]
pub trait DonationRequestStore: Send + Sync {
    async fn insert(&self, request: &DonationRequest) -> Result<ObjectId, AppError>;
    async fn list(&self, page: PageRequest) -> Result<(Vec<DonationRequest>, u64), AppError>;
    /// All documents matching `filter`, sorted by `createdAt` descending.
    async fn find_newest_first(&self, filter: Document) -> Result<Vec<DonationRequest>, AppError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<DonationRequest>, AppError>;
    async fn update_by_id(&self, id: ObjectId, patch: &FieldPatch) -> Result<UpdateOutcome, AppError>;
    async fn delete_by_id(&self, id: ObjectId) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn insert(&self, blog: &Blog) -> Result<ObjectId, AppError>;
    async fn list(&self, page: PageRequest) -> Result<(Vec<Blog>, u64), AppError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, AppError>;
}

#[async_trait]
pub trait FundingStore: Send + Sync {
    /// Atomic insert keyed by transaction id. Returns the stored record and whether it is new.
    async fn insert_if_absent(&self, record: &FundingRecord) -> Result<(FundingRecord, bool), AppError>;
    async fn list(&self, page: PageRequest) -> Result<(Vec<FundingRecord>, u64), AppError>;
}

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));
        client_options.app_name = Some("redpulse-server".to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.run_command(mongodb::bson::doc! { "ping": 1 }).await?;
        log::info!("✅ Pinged MongoDB database: {}", db_name);

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Unique keys back the idempotent inserts; the rest serve the sorted listings.
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        use crate::models::{
            BLOGS_COLLECTION, DONATION_REQUESTS_COLLECTION, FUNDING_COLLECTION, USERS_COLLECTION,
        };
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();
        let indexes = [
            (USERS_COLLECTION, doc! { "email": 1 }, Some(unique())),
            (FUNDING_COLLECTION, doc! { "transactionId": 1 }, Some(unique())),
            (FUNDING_COLLECTION, doc! { "createdAt": -1 }, None),
            (DONATION_REQUESTS_COLLECTION, doc! { "requesterEmail": 1, "createdAt": -1 }, None),
            (DONATION_REQUESTS_COLLECTION, doc! { "status": 1, "createdAt": -1 }, None),
            (DONATION_REQUESTS_COLLECTION, doc! { "createdAt": -1 }, None),
            (BLOGS_COLLECTION, doc! { "createdAt": -1 }, None),
        ];

        for (collection, keys, options) in indexes {
            let description = format!("{}({:?})", collection, keys.keys().collect::<Vec<_>>());
            let model = match options {
                Some(options) => IndexModel::builder().keys(keys).options(options).build(),
                None => IndexModel::builder().keys(keys).build(),
            };

            match self.collection::<Document>(collection).create_index(model).await {
                Ok(_) => log::info!("   ✅ Index ready: {}", description),
                // A duplicate key here means existing data already violates uniqueness.
                Err(e) => {
                    log::error!("   ❌ Index {} failed: {}", description, e);
                    return Err(e.into());
                }
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
