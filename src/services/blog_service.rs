use crate::database::BlogStore;
use crate::models::{json_to_document, parse_object_id, Blog, Page, PageRequest};
use crate::utils::error::AppError;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde_json::{Map, Value};

pub async fn create(blogs: &dyn BlogStore, body: Map<String, Value>) -> Result<ObjectId, AppError> {
    if body.is_empty() {
        return Err(AppError::InvalidRequest("Invalid data".to_string()));
    }

    let mut content = json_to_document(body)?;
    content.remove("_id");
    content.remove("createdAt");

    let blog = Blog {
        id: None,
        created_at: DateTime::now(),
        content,
    };

    let id = blogs.insert(&blog).await?;
    log::info!("📝 Blog {} published", id);
    Ok(id)
}

pub async fn list(blogs: &dyn BlogStore, page: PageRequest) -> Result<Page<Blog>, AppError> {
    let (data, total) = blogs.list(page).await?;
    Ok(Page::new(data, page, total))
}

pub async fn get_by_id(blogs: &dyn BlogStore, raw_id: &str) -> Result<Blog, AppError> {
    let id = parse_object_id(raw_id)?;
    blogs
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))
}
