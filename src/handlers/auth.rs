//! Login, bootstrap registration and gated employee registration.

use axum::{extract::State, http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, Transaction};

use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::auth::{self, guard, password, Claims};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{Employee, Role};
use crate::AppState;

// Advisory lock key serializing bootstrap registration.
const BOOTSTRAP_LOCK_KEY: i64 = 0x67796d_1;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub employee_id: i64,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub password: String,
    pub gym_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// POST /login - verify credentials and issue a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let employee = fetch_employee(&state.pool, payload.employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee does not exist"))?;

    if !password::verify_password(&payload.password, &employee.password_hash)? {
        tracing::warn!("failed login attempt for employee {}", employee.employee_id);
        return Err(ApiError::unauthorized("Login Failed"));
    }

    let security = &state.config.security;
    let claims = Claims::new(
        employee.employee_id,
        employee.role,
        employee.gym_id,
        security.jwt_expiry_hours,
    );
    let access_token = auth::issue_token(&security.jwt_secret, &claims)?;

    tracing::info!("employee {} logged in", employee.employee_id);
    Ok(Json(json!({
        "success": true,
        "data": {
            "message": "Login Success",
            "access_token": access_token,
            "expires_in": security.jwt_expiry_hours * 3600
        }
    })))
}

/// POST /first_register - one-time bootstrap of the very first manager.
///
/// Open only while no manager exists anywhere; once one does, this path is
/// permanently closed and employees are created through /register.
pub async fn first_register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let role: Role = payload
        .role
        .parse()
        .map_err(|_| ApiError::bad_request("Bootstrap registration requires the manager role"))?;
    if role != Role::Manager {
        return Err(ApiError::bad_request(
            "Bootstrap registration requires the manager role",
        ));
    }
    validate_password(&payload.password)?;

    let password_hash = password::hash_password(&payload.password, state.config.security.bcrypt_cost)?;

    let mut tx = state.pool.begin().await?;

    // Serializes concurrent bootstrap attempts; without the lock two
    // no-manager checks could both pass.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(BOOTSTRAP_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let manager_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM employee WHERE role = 'manager')")
            .fetch_one(&mut *tx)
            .await?;
    if manager_exists {
        return Err(ApiError::forbidden("Bootstrap registration is closed"));
    }

    let employee = insert_employee(&mut tx, &payload, Role::Manager, &password_hash).await?;
    tx.commit().await?;

    tracing::info!("bootstrap manager created: ID {}", employee.employee_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": employee })),
    ))
}

/// POST /register - create an employee, gated by the configured role set.
pub async fn register(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.register_roles).await?;

    let role: Role = payload.role.parse().map_err(ApiError::bad_request)?;
    validate_password(&payload.password)?;

    let password_hash = password::hash_password(&payload.password, state.config.security.bcrypt_cost)?;

    let mut tx = state.pool.begin().await?;
    let employee = insert_employee(&mut tx, &payload, role, &password_hash).await?;
    tx.commit().await?;

    tracing::info!(
        "employee registered: ID {} role {}",
        employee.employee_id,
        employee.role
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": employee })),
    ))
}

pub(crate) async fn fetch_employee(
    pool: &PgPool,
    employee_id: i64,
) -> Result<Option<Employee>, ApiError> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT employee_id, gym_id, first_name, last_name, role, password_hash
         FROM employee WHERE employee_id = $1",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;
    Ok(employee)
}

async fn insert_employee(
    tx: &mut Transaction<'_, Postgres>,
    payload: &RegisterRequest,
    role: Role,
    password_hash: &str,
) -> Result<Employee, ApiError> {
    let employee = sqlx::query_as::<_, Employee>(
        "INSERT INTO employee (gym_id, first_name, last_name, role, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING employee_id, gym_id, first_name, last_name, role, password_hash",
    )
    .bind(payload.gym_id)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(role.as_str())
    .bind(password_hash)
    .fetch_one(&mut **tx)
    .await?;
    Ok(employee)
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters long",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_passwords() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn bootstrap_role_must_parse_to_manager() {
        // Case-insensitive acceptance is handled by Role::from_str.
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert_ne!("coach".parse::<Role>().unwrap(), Role::Manager);
    }
}
