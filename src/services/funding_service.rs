use crate::database::FundingStore;
use crate::models::{CreateFundingRequest, FundingRecord, Page, PageRequest, Principal};
use crate::utils::error::AppError;
use mongodb::bson::DateTime;

pub fn validate_amount(amount: f64) -> Result<f64, AppError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(AppError::InvalidRequest("Amount must be a positive number".to_string()))
    }
}

/// Records a contribution for the principal. Idempotent on `transactionId`.
pub async fn create(
    funding: &dyn FundingStore,
    principal: &Principal,
    request: CreateFundingRequest,
) -> Result<(FundingRecord, bool), AppError> {
    let transaction_id = request.transaction_id.trim().to_string();
    if transaction_id.is_empty() {
        return Err(AppError::InvalidRequest("transactionId is required".to_string()));
    }
    let amount = validate_amount(request.amount)?;

    let record = FundingRecord {
        id: None,
        tracking_id: request
            .tracking_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| transaction_id.clone()),
        transaction_id,
        amount,
        email: principal.email.clone(),
        name: request.name,
        created_at: DateTime::now(),
    };

    let (stored, inserted) = funding.insert_if_absent(&record).await?;
    if inserted {
        log::info!("💰 Funding {} recorded for {}", stored.transaction_id, stored.email);
    }
    Ok((stored, inserted))
}

pub async fn list(funding: &dyn FundingStore, page: PageRequest) -> Result<Page<FundingRecord>, AppError> {
    let (data, total) = funding.list(page).await?;
    Ok(Page::new(data, page, total))
}
