use crate::api::{EmailQuery, StatusQuery};
use crate::models::{DonationRequest, PageQuery, PageRequest, Principal, DEFAULT_PAGE_LIMIT};
use crate::services::donation_request_service;
use crate::state::AppState;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use serde_json::{json, Map, Value};

fn to_json_list(requests: Vec<DonationRequest>) -> Vec<Value> {
    requests.iter().map(DonationRequest::to_json).collect()
}

pub async fn create_donation_request(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let id = donation_request_service::create(
        state.donation_requests.as_ref(),
        &principal,
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "insertedId": id.to_hex()
    })))
}

pub async fn list_donation_requests(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::resolve(&query, DEFAULT_PAGE_LIMIT, state.max_page_limit);
    let requests = donation_request_service::list_all(
        state.donation_requests.as_ref(),
        state.users.as_ref(),
        &principal,
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(requests.map(|request| request.to_json())))
}

pub async fn list_my_donation_requests(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, AppError> {
    let requests = donation_request_service::list_by_owner(
        state.donation_requests.as_ref(),
        &principal,
        query.email.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(to_json_list(requests)))
}

pub async fn list_donation_requests_by_status(
    state: web::Data<AppState>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let requests = donation_request_service::list_by_status(
        state.donation_requests.as_ref(),
        query.status.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(to_json_list(requests)))
}

pub async fn get_donation_request(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let request = donation_request_service::get_by_id(
        state.donation_requests.as_ref(),
        state.users.as_ref(),
        &principal,
        &path,
    )
    .await?;

    Ok(HttpResponse::Ok().json(request.to_json()))
}

pub async fn update_donation_request(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    donation_request_service::update(
        state.donation_requests.as_ref(),
        state.users.as_ref(),
        &principal,
        &path,
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Donation request updated successfully"
    })))
}

pub async fn delete_donation_request(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    donation_request_service::delete(
        state.donation_requests.as_ref(),
        state.users.as_ref(),
        &principal,
        &path,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Donation request deleted successfully"
    })))
}
