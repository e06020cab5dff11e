use crate::database::{DonationRequestStore, UserStore};
use crate::models::{
    json_to_document, parse_object_id, take_string, DonationRequest, FieldPatch, Page,
    PageRequest, Principal, DEFAULT_DONATION_STATUS, PROTECTED_DONATION_FIELDS,
};
use crate::services::authorization::{authorize_owner_or_staff, ensure_role, ensure_self, STAFF_ROLES};
use crate::utils::error::AppError;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use serde_json::{Map, Value};

/// Creates a request owned by the principal.
pub async fn create(
    requests: &dyn DonationRequestStore,
    principal: &Principal,
    body: Map<String, Value>,
) -> Result<ObjectId, AppError> {
    if body.is_empty() {
        return Err(AppError::InvalidRequest("Invalid data".to_string()));
    }

    let mut details = json_to_document(body)?;
    details.remove("_id");
    details.remove("createdAt");

    let requester_email = match take_string(&mut details, "requesterEmail") {
        Some(email) if email != principal.email => {
            return Err(AppError::Forbidden(format!(
                "{} cannot create a request for {}",
                principal.email, email
            )));
        }
        _ => principal.email.clone(),
    };
    let status = take_string(&mut details, "status")
        .unwrap_or_else(|| DEFAULT_DONATION_STATUS.to_string());

    // take_string puts back non-string values
    for field in ["requesterEmail", "status"] {
        if details.contains_key(field) {
            return Err(AppError::InvalidRequest(format!("Field '{}' must be a string", field)));
        }
    }

    let request = DonationRequest {
        id: None,
        requester_email,
        status,
        created_at: DateTime::now(),
        details,
    };

    let id = requests.insert(&request).await?;
    log::info!("🩸 Donation request {} created by {}", id, principal.email);
    Ok(id)
}

/// Staff-only paginated listing, newest first.
pub async fn list_all(
    requests: &dyn DonationRequestStore,
    users: &dyn UserStore,
    principal: &Principal,
    page: PageRequest,
) -> Result<Page<DonationRequest>, AppError> {
    ensure_role(users, principal, STAFF_ROLES).await?;

    let (data, total) = requests.list(page).await?;
    Ok(Page::new(data, page, total))
}

pub async fn list_by_owner(
    requests: &dyn DonationRequestStore,
    principal: &Principal,
    email: Option<&str>,
) -> Result<Vec<DonationRequest>, AppError> {
    let email = email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Email is required".to_string()))?;
    ensure_self(principal, email)?;

    requests
        .find_newest_first(doc! { "requesterEmail": email })
        .await
}

pub async fn list_by_status(
    requests: &dyn DonationRequestStore,
    status: Option<&str>,
) -> Result<Vec<DonationRequest>, AppError> {
    let status = status
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Status is required".to_string()))?;

    requests.find_newest_first(doc! { "status": status }).await
}

async fn load_authorized(
    requests: &dyn DonationRequestStore,
    users: &dyn UserStore,
    principal: &Principal,
    raw_id: &str,
) -> Result<(ObjectId, DonationRequest), AppError> {
    let id = parse_object_id(raw_id)?;
    let request = requests
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Donation request not found".to_string()))?;

    authorize_owner_or_staff(users, principal, &request.requester_email).await?;
    Ok((id, request))
}

pub async fn get_by_id(
    requests: &dyn DonationRequestStore,
    users: &dyn UserStore,
    principal: &Principal,
    raw_id: &str,
) -> Result<DonationRequest, AppError> {
    let (_, request) = load_authorized(requests, users, principal, raw_id).await?;
    Ok(request)
}

pub async fn update(
    requests: &dyn DonationRequestStore,
    users: &dyn UserStore,
    principal: &Principal,
    raw_id: &str,
    body: Map<String, Value>,
) -> Result<(), AppError> {
    let (id, _) = load_authorized(requests, users, principal, raw_id).await?;
    let patch = FieldPatch::from_json(body, PROTECTED_DONATION_FIELDS)?;

    let outcome = requests.update_by_id(id, &patch).await?;
    if outcome.matched == 0 || outcome.modified == 0 {
        return Err(AppError::NotFound(
            "Donation request not found or no changes made".to_string(),
        ));
    }

    log::info!("✏️ Donation request {} updated by {}", id, principal.email);
    Ok(())
}

pub async fn delete(
    requests: &dyn DonationRequestStore,
    users: &dyn UserStore,
    principal: &Principal,
    raw_id: &str,
) -> Result<(), AppError> {
    let (id, _) = load_authorized(requests, users, principal, raw_id).await?;

    if requests.delete_by_id(id).await? == 0 {
        return Err(AppError::NotFound("Donation request not found".to_string()));
    }

    log::info!("🗑️ Donation request {} deleted by {}", id, principal.email);
    Ok(())
}
