use crate::database::UserStore;
use crate::models::{Principal, Role};
use crate::utils::error::AppError;

fn forbidden(reason: impl Into<String>) -> AppError {
    AppError::Forbidden(reason.into())
}

/// Allows only the principal whose verified email equals `email`.
pub fn ensure_self(principal: &Principal, email: &str) -> Result<(), AppError> {
    if principal.email == email {
        Ok(())
    } else {
        Err(forbidden(format!("{} may not access data of {}", principal.email, email)))
    }
}

/// Stored role of the principal, `None` when they never registered.
pub async fn principal_role(
    users: &dyn UserStore,
    principal: &Principal,
) -> Result<Option<Role>, AppError> {
    Ok(users
        .find_by_email(&principal.email)
        .await?
        .map(|user| user.role))
}

/// Allows the owner of a resource or any staff member.
pub fn ensure_owner_or_staff(
    principal: &Principal,
    owner_email: &str,
    role: Option<&Role>,
) -> Result<(), AppError> {
    if principal.email == owner_email || role.is_some_and(Role::is_staff) {
        Ok(())
    } else {
        Err(forbidden(format!("{} is neither owner nor staff", principal.email)))
    }
}

/// Owner check that only consults the role when the principal is not the owner.
pub async fn authorize_owner_or_staff(
    users: &dyn UserStore,
    principal: &Principal,
    owner_email: &str,
) -> Result<(), AppError> {
    if principal.email == owner_email {
        return Ok(());
    }
    let role = principal_role(users, principal).await?;
    ensure_owner_or_staff(principal, owner_email, role.as_ref())
}

/// Allows the principal iff their stored role is one of `allowed`. Returns that role.
pub async fn ensure_role(
    users: &dyn UserStore,
    principal: &Principal,
    allowed: &[Role],
) -> Result<Role, AppError> {
    match principal_role(users, principal).await? {
        Some(role) if allowed.contains(&role) => Ok(role),
        Some(role) => Err(forbidden(format!("Role '{}' is not allowed", role))),
        None => Err(forbidden(format!("{} has no user record", principal.email))),
    }
}

pub const STAFF_ROLES: &[Role] = &[Role::Admin, Role::Volunteer];
pub const ADMIN_ROLES: &[Role] = &[Role::Admin];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::{principal, register};

    #[test]
    fn test_ensure_self() {
        let rahim = principal("rahim@example.com");
        assert!(ensure_self(&rahim, "rahim@example.com").is_ok());
        assert!(matches!(
            ensure_self(&rahim, "karim@example.com"),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_self(&rahim, "Rahim@example.com").is_err());
    }

    #[test]
    fn test_owner_or_staff() {
        let rahim = principal("rahim@example.com");
        assert!(ensure_owner_or_staff(&rahim, "rahim@example.com", None).is_ok());
        assert!(ensure_owner_or_staff(&rahim, "x@example.com", Some(&Role::Volunteer)).is_ok());
        assert!(ensure_owner_or_staff(&rahim, "x@example.com", Some(&Role::Admin)).is_ok());
        assert!(ensure_owner_or_staff(&rahim, "x@example.com", Some(&Role::Donor)).is_err());
        assert!(ensure_owner_or_staff(&rahim, "x@example.com", None).is_err());
    }

    #[tokio::test]
    async fn test_ensure_role_reads_stored_role() {
        let store = MemoryStore::new();
        register(&store, "admin@example.com", "admin").await;
        register(&store, "donor@example.com", "donor").await;

        let role = ensure_role(&store, &principal("admin@example.com"), ADMIN_ROLES)
            .await
            .unwrap();
        assert_eq!(role, Role::Admin);

        let err = ensure_role(&store, &principal("donor@example.com"), STAFF_ROLES)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = ensure_role(&store, &principal("ghost@example.com"), STAFF_ROLES)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
