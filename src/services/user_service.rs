use crate::database::UserStore;
use crate::models::{
    DonorSearch, FieldPatch, Page, PageRequest, Principal, RegisterUserResponse, RoleResponse,
    User, ADMIN_ONLY_USER_FIELDS, PROTECTED_USER_FIELDS,
};
use crate::services::authorization::{ensure_role, ensure_self, ADMIN_ROLES};
use crate::utils::error::AppError;
use serde_json::{Map, Value};

fn required_email(email: Option<&str>) -> Result<&str, AppError> {
    email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Email is required".to_string()))
}

/// Idempotent registration keyed by email.
pub async fn register(
    users: &dyn UserStore,
    body: Map<String, Value>,
) -> Result<RegisterUserResponse, AppError> {
    let user = User::from_registration(body)?;

    match users.insert_if_absent(&user).await? {
        Some(id) => {
            log::info!("👤 Registered user {}", user.email);
            Ok(RegisterUserResponse {
                success: true,
                inserted: true,
                inserted_id: Some(id.to_hex()),
                message: "User created".to_string(),
            })
        }
        None => {
            log::debug!("User {} already registered", user.email);
            Ok(RegisterUserResponse {
                success: true,
                inserted: false,
                inserted_id: None,
                message: "User already exists".to_string(),
            })
        }
    }
}

/// Admin-only paginated listing.
pub async fn list_users(
    users: &dyn UserStore,
    principal: &Principal,
    page: PageRequest,
) -> Result<Page<User>, AppError> {
    ensure_role(users, principal, ADMIN_ROLES).await?;

    let (data, total) = users.list(page).await?;
    Ok(Page::new(data, page, total))
}

pub async fn find_by_email(
    users: &dyn UserStore,
    principal: &Principal,
    email: Option<&str>,
) -> Result<User, AppError> {
    let email = required_email(email)?;
    ensure_self(principal, email)?;

    users
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn find_role(
    users: &dyn UserStore,
    principal: &Principal,
    email: &str,
) -> Result<RoleResponse, AppError> {
    let user = find_by_email(users, principal, Some(email)).await?;

    Ok(RoleResponse {
        email: user.email,
        role: user.role.to_string(),
    })
}

/// `$set` on the user's document. Users may edit their own profile;
/// touching another user or the role/status fields takes an admin.
pub async fn update_by_email(
    users: &dyn UserStore,
    principal: &Principal,
    email: Option<&str>,
    body: Map<String, Value>,
) -> Result<(), AppError> {
    let email = required_email(email)?;
    let patch = FieldPatch::from_json(body, PROTECTED_USER_FIELDS)?;

    let needs_admin = principal.email != email
        || ADMIN_ONLY_USER_FIELDS.iter().any(|field| patch.touches(field));
    if needs_admin {
        ensure_role(users, principal, ADMIN_ROLES).await?;
    }

    let outcome = users.update_by_email(email, &patch).await?;
    if outcome.matched == 0 || outcome.modified == 0 {
        return Err(AppError::NotFound("User not found or no changes made".to_string()));
    }

    log::info!("✏️ {} updated user {}", principal.email, email);
    Ok(())
}

pub async fn search_donors(users: &dyn UserStore, search: &DonorSearch) -> Result<Vec<User>, AppError> {
    let filter = search.to_filter()?;
    users.find_matching(filter).await
}
