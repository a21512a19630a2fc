//! Employee record management. Creation goes through the registration
//! handlers in `handlers::auth`.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{guard, password};
use crate::error::ApiError;
use crate::handlers::auth::{fetch_employee, validate_password};
use crate::middleware::auth::AuthUser;
use crate::models::Role;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmployeeUpdate {
    pub password: Option<String>,
    pub gym_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

/// GET /get_employee/:employee_id
pub async fn get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let employee = fetch_employee(&state.pool, employee_id).await?.ok_or_else(|| {
        tracing::warn!("employee with ID {} does not exist", employee_id);
        ApiError::not_found("Employee does not exist")
    })?;

    Ok(Json(json!({ "success": true, "data": employee })))
}

/// PUT /update_employee/:employee_id
///
/// Role changes made here take effect on the target's next request: the
/// authorization gate reads the live row, not the token claim.
pub async fn update_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<EmployeeUpdate>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let current = fetch_employee(&state.pool, employee_id).await?.ok_or_else(|| {
        tracing::warn!("employee with ID {} does not exist", employee_id);
        ApiError::not_found("Employee does not exist")
    })?;

    let role = match payload.role {
        Some(raw) => raw.parse::<Role>().map_err(ApiError::bad_request)?,
        None => current.role,
    };

    let password_hash = match payload.password {
        Some(plaintext) => {
            validate_password(&plaintext)?;
            password::hash_password(&plaintext, state.config.security.bcrypt_cost)?
        }
        None => current.password_hash,
    };

    let employee = sqlx::query_as::<_, crate::models::Employee>(
        "UPDATE employee
         SET gym_id = $1, first_name = $2, last_name = $3, role = $4, password_hash = $5
         WHERE employee_id = $6
         RETURNING employee_id, gym_id, first_name, last_name, role, password_hash",
    )
    .bind(payload.gym_id.or(current.gym_id))
    .bind(payload.first_name.unwrap_or(current.first_name))
    .bind(payload.last_name.unwrap_or(current.last_name))
    .bind(role.as_str())
    .bind(&password_hash)
    .bind(employee_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("employee updated successfully: ID {}", employee_id);
    Ok(Json(json!({ "success": true, "data": employee })))
}

/// DELETE /delete_employee/:employee_id
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let deleted = sqlx::query("DELETE FROM employee WHERE employee_id = $1")
        .bind(employee_id)
        .execute(&state.pool)
        .await?;
    if deleted.rows_affected() == 0 {
        tracing::warn!("employee with ID {} does not exist", employee_id);
        return Err(ApiError::not_found("Employee does not exist"));
    }

    tracing::info!("employee deleted successfully: ID {}", employee_id);
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Employee deleted successfully" }
    })))
}
