use crate::models::{FundingWriteResponse, Principal};
use crate::services::payment_service::{self, CheckoutSessionCreated};
use crate::state::AppState;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CheckoutSessionRequest {
    pub amount: f64,
}

#[utoipa::path(
    post,
    path = "/create-checkout-session",
    tag = "Payments",
    request_body = CheckoutSessionRequest,
    responses(
        (status = 200, description = "Checkout session opened", body = CheckoutSessionCreated),
        (status = 400, description = "Amount is not a positive number"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Payment provider rejected the request")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_checkout_session(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    body: web::Json<CheckoutSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let session = payment_service::create_checkout_session(
        state.payments.as_ref(),
        &state.checkout,
        &principal,
        body.amount,
    )
    .await?;

    Ok(HttpResponse::Ok().json(session))
}

#[utoipa::path(
    get,
    path = "/verify-checkout-session/{session_id}",
    tag = "Payments",
    params(
        ("session_id" = String, Path, description = "Checkout session id issued by the provider")
    ),
    responses(
        (status = 200, description = "Payment reconciled", body = FundingWriteResponse),
        (status = 400, description = "Payment not completed"),
        (status = 500, description = "Reconciliation failed")
    )
)]
pub async fn verify_checkout_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let (record, inserted) = payment_service::verify_checkout_session(
        state.payments.as_ref(),
        state.funding.as_ref(),
        &path,
    )
    .await?;

    Ok(HttpResponse::Ok().json(FundingWriteResponse {
        success: true,
        inserted,
        record: record.into(),
    }))
}
