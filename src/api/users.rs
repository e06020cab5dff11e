use crate::api::EmailQuery;
use crate::models::{
    DonorSearch, PageQuery, PageRequest, Principal, RegisterUserResponse, User, DEFAULT_PAGE_LIMIT,
};
use crate::services::user_service;
use crate::state::AppState;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use serde_json::{json, Map, Value};

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = Object,
    responses(
        (status = 200, description = "User created, or already registered", body = RegisterUserResponse),
        (status = 400, description = "Email is missing")
    )
)]
pub async fn register_user(
    state: web::Data<AppState>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let response = user_service::register(state.users.as_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn list_users(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::resolve(&query, DEFAULT_PAGE_LIMIT, state.max_page_limit);
    let users = user_service::list_users(state.users.as_ref(), &principal, page).await?;
    Ok(HttpResponse::Ok().json(users.map(|user| user.to_json())))
}

pub async fn get_user_by_email(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::find_by_email(state.users.as_ref(), &principal, query.email.as_deref()).await?;
    Ok(HttpResponse::Ok().json(user.to_json()))
}

pub async fn get_user_role(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let role = user_service::find_role(state.users.as_ref(), &principal, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(role))
}

pub async fn update_user(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    query: web::Query<EmailQuery>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    user_service::update_by_email(
        state.users.as_ref(),
        &principal,
        query.email.as_deref(),
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User updated successfully"
    })))
}

pub async fn search_donors(
    state: web::Data<AppState>,
    query: web::Query<DonorSearch>,
) -> Result<HttpResponse, AppError> {
    let donors = user_service::search_donors(state.users.as_ref(), &query).await?;
    let donors: Vec<Value> = donors.iter().map(User::to_json).collect();
    Ok(HttpResponse::Ok().json(donors))
}
