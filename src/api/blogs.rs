use crate::models::{PageQuery, PageRequest, DEFAULT_PAGE_LIMIT};
use crate::services::blog_service;
use crate::state::AppState;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use serde_json::{json, Map, Value};

pub async fn create_blog(
    state: web::Data<AppState>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let id = blog_service::create(state.blogs.as_ref(), body.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "insertedId": id.to_hex()
    })))
}

pub async fn list_blogs(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::resolve(&query, DEFAULT_PAGE_LIMIT, state.max_page_limit);
    let blogs = blog_service::list(state.blogs.as_ref(), page).await?;
    Ok(HttpResponse::Ok().json(blogs.map(|blog| blog.to_json())))
}

pub async fn get_blog(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let blog = blog_service::get_by_id(state.blogs.as_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(blog.to_json()))
}
