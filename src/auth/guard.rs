//! Authorization gate for protected operations.
//!
//! Every protected handler calls [`require_role`] before touching any mutable
//! state. The employee's role is read back from storage on each request
//! rather than trusted from the token claim, so a demotion or deletion takes
//! effect on the very next request even while older tokens are outstanding.

use sqlx::PgPool;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{Employee, Role};

/// Allow-list membership check.
pub fn role_allowed(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// Permit the request if the live role of the token's subject is in
/// `allowed`, returning the employee row for further checks (gym scope).
/// Denies with a generic message whether the subject is missing, deleted or
/// merely under-privileged.
pub async fn require_role(
    pool: &PgPool,
    auth: &AuthUser,
    allowed: &[Role],
) -> Result<Employee, ApiError> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT employee_id, gym_id, first_name, last_name, role, password_hash
         FROM employee WHERE employee_id = $1",
    )
    .bind(auth.employee_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        tracing::warn!("token subject {} no longer exists", auth.employee_id);
        ApiError::forbidden("Access denied")
    })?;

    if !role_allowed(employee.role, allowed) {
        tracing::warn!(
            "employee {} ({}) denied, requires one of {:?}",
            employee.employee_id,
            employee.role,
            allowed
        );
        return Err(ApiError::forbidden("Access denied"));
    }

    Ok(employee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_check() {
        assert!(role_allowed(Role::Manager, &[Role::Manager]));
        assert!(role_allowed(
            Role::Receptionist,
            &[Role::Manager, Role::Receptionist]
        ));
        assert!(!role_allowed(Role::Coach, &[Role::Manager]));
        assert!(!role_allowed(Role::Manager, &[]));
    }

    #[test]
    fn all_roles_pass_the_open_list() {
        for role in Role::ALL {
            assert!(role_allowed(role, &Role::ALL));
        }
    }
}
