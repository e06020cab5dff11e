use crate::models::{
    CreateFundingRequest, FundingResponse, FundingWriteResponse, PageQuery, PageRequest, Principal,
    DEFAULT_FUNDING_PAGE_LIMIT,
};
use crate::services::funding_service;
use crate::state::AppState;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/funding",
    tag = "Funding",
    request_body = CreateFundingRequest,
    responses(
        (status = 200, description = "Record stored, or the existing one returned", body = FundingWriteResponse),
        (status = 400, description = "Missing transactionId or non-positive amount"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_funding(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    body: web::Json<CreateFundingRequest>,
) -> Result<HttpResponse, AppError> {
    let (record, inserted) =
        funding_service::create(state.funding.as_ref(), &principal, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(FundingWriteResponse {
        success: true,
        inserted,
        record: record.into(),
    }))
}

pub async fn list_funding(
    state: web::Data<AppState>,
    _principal: web::ReqData<Principal>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::resolve(&query, DEFAULT_FUNDING_PAGE_LIMIT, state.max_page_limit);
    let records = funding_service::list(state.funding.as_ref(), page).await?;
    Ok(HttpResponse::Ok().json(records.map(FundingResponse::from)))
}
