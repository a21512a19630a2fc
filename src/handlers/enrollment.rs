//! Class enrollment ledger.
//!
//! The enrollment table is the source of truth; `gym_class.signed_people` is
//! a denormalized mirror of it. These two handlers are the only writers of
//! the counter, and every write happens inside one transaction holding a
//! `FOR UPDATE` lock on the class row, so concurrent enrollments into the
//! last free seat serialize instead of both passing the capacity check.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, Transaction};

use crate::auth::guard;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{Employee, Enrollment, GymClass};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EnrollmentRequest {
    pub customer_id: i64,
}

/// POST /enroll_customer/:gymclass_id
pub async fn enroll_customer(
    State(state): State<AppState>,
    Path(gymclass_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<EnrollmentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let acting =
        guard::require_role(&state.pool, &auth_user, &state.config.security.enroll_roles).await?;

    let mut tx = state.pool.begin().await?;

    ensure_customer_exists(&mut tx, payload.customer_id).await?;
    let class = lock_gym_class(&mut tx, gymclass_id).await?;
    ensure_gym_scope(
        state.config.security.enforce_gym_scope,
        &acting,
        class.gym_id,
    )?;
    ensure_capacity(class.signed_people, class.max_people)?;

    let already_enrolled: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM enrollment WHERE customer_id = $1 AND gymclass_id = $2)",
    )
    .bind(payload.customer_id)
    .bind(gymclass_id)
    .fetch_one(&mut *tx)
    .await?;
    if already_enrolled {
        return Err(ApiError::conflict(
            "Customer is already enrolled in this class",
        ));
    }

    let enrollment = sqlx::query_as::<_, Enrollment>(
        "INSERT INTO enrollment (customer_id, gymclass_id) VALUES ($1, $2)
         RETURNING customer_id, gymclass_id, enrolled_at",
    )
    .bind(payload.customer_id)
    .bind(gymclass_id)
    .fetch_one(&mut *tx)
    .await?;
    let signed_people: i32 = sqlx::query_scalar(
        "UPDATE gym_class SET signed_people = signed_people + 1
         WHERE gymclass_id = $1 RETURNING signed_people",
    )
    .bind(gymclass_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "customer {} enrolled in class {} ({}/{})",
        payload.customer_id,
        gymclass_id,
        signed_people,
        class.max_people
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "message": "Customer enrolled successfully",
                "customer_id": enrollment.customer_id,
                "gymclass_id": enrollment.gymclass_id,
                "enrolled_at": enrollment.enrolled_at,
                "signed_people": signed_people
            }
        })),
    ))
}

/// POST /unenroll_customer/:gymclass_id
pub async fn unenroll_customer(
    State(state): State<AppState>,
    Path(gymclass_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<EnrollmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let acting =
        guard::require_role(&state.pool, &auth_user, &state.config.security.enroll_roles).await?;

    let mut tx = state.pool.begin().await?;

    let class = lock_gym_class(&mut tx, gymclass_id).await?;
    ensure_gym_scope(
        state.config.security.enforce_gym_scope,
        &acting,
        class.gym_id,
    )?;

    let deleted = sqlx::query("DELETE FROM enrollment WHERE customer_id = $1 AND gymclass_id = $2")
        .bind(payload.customer_id)
        .bind(gymclass_id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Enrollment does not exist"));
    }

    // A ledger row existed, so a zero counter means the mirror has already
    // diverged; roll back rather than clamp.
    let next = next_occupancy_after_unenroll(gymclass_id, class.signed_people)?;
    sqlx::query("UPDATE gym_class SET signed_people = $1 WHERE gymclass_id = $2")
        .bind(next)
        .bind(gymclass_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "customer {} unenrolled from class {} ({}/{})",
        payload.customer_id,
        gymclass_id,
        next,
        class.max_people
    );
    Ok(Json(json!({
        "success": true,
        "data": {
            "message": "Customer unenrolled successfully",
            "customer_id": payload.customer_id,
            "gymclass_id": gymclass_id,
            "signed_people": next
        }
    })))
}

/// Fetch the class row with a row-level lock, serializing concurrent
/// enroll/unenroll calls against the same class for the transaction's
/// lifetime.
async fn lock_gym_class(
    tx: &mut Transaction<'_, Postgres>,
    gymclass_id: i64,
) -> Result<GymClass, ApiError> {
    sqlx::query_as::<_, GymClass>(
        "SELECT gymclass_id, employee_id, gym_id, name, max_people, time, day_otw, signed_people
         FROM gym_class WHERE gymclass_id = $1 FOR UPDATE",
    )
    .bind(gymclass_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Gym class does not exist"))
}

async fn ensure_customer_exists(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: i64,
) -> Result<(), ApiError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customer WHERE customer_id = $1)")
            .bind(customer_id)
            .fetch_one(&mut **tx)
            .await?;
    if !exists {
        return Err(ApiError::not_found("Customer does not exist"));
    }
    Ok(())
}

/// Tenant check: with gym scoping on, staff may only manage enrollment for
/// classes at their own gym.
fn ensure_gym_scope(enforce: bool, acting: &Employee, class_gym_id: i64) -> Result<(), ApiError> {
    if enforce && acting.gym_id != Some(class_gym_id) {
        tracing::warn!(
            "employee {} (gym {:?}) denied for class at gym {}",
            acting.employee_id,
            acting.gym_id,
            class_gym_id
        );
        return Err(ApiError::forbidden("Access denied"));
    }
    Ok(())
}

fn ensure_capacity(signed_people: i32, max_people: i32) -> Result<(), ApiError> {
    if signed_people >= max_people {
        return Err(ApiError::conflict("Gym class is full"));
    }
    Ok(())
}

fn next_occupancy_after_unenroll(gymclass_id: i64, signed_people: i32) -> Result<i32, ApiError> {
    if signed_people <= 0 {
        return Err(ApiError::integrity_violation(format!(
            "class {}: signed_people would drop below zero (was {})",
            gymclass_id, signed_people
        )));
    }
    Ok(signed_people - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn employee_at(gym_id: Option<i64>) -> Employee {
        Employee {
            employee_id: 1,
            gym_id,
            first_name: "Jan".to_string(),
            last_name: "Nowak".to_string(),
            role: Role::Receptionist,
            password_hash: String::new(),
        }
    }

    #[test]
    fn capacity_check_is_strict() {
        assert!(ensure_capacity(0, 1).is_ok());
        assert!(ensure_capacity(9, 10).is_ok());
        assert!(ensure_capacity(1, 1).is_err());
        assert!(ensure_capacity(10, 10).is_err());
    }

    #[test]
    fn overfull_class_cannot_accept_more() {
        // Should never happen given the CHECK constraint, but the handler
        // must still refuse.
        assert!(ensure_capacity(11, 10).is_err());
    }

    #[test]
    fn unenroll_decrements_by_exactly_one() {
        assert_eq!(next_occupancy_after_unenroll(5, 3).unwrap(), 2);
        assert_eq!(next_occupancy_after_unenroll(5, 1).unwrap(), 0);
    }

    #[test]
    fn zero_occupancy_unenroll_is_an_integrity_error() {
        let err = next_occupancy_after_unenroll(5, 0).unwrap_err();
        assert_eq!(err.status_code(), 500);
        // The divergence detail must not reach the client.
        assert_eq!(err.message(), "An internal error occurred");
    }

    #[test]
    fn gym_scope_disabled_allows_everything() {
        assert!(ensure_gym_scope(false, &employee_at(None), 3).is_ok());
        assert!(ensure_gym_scope(false, &employee_at(Some(1)), 3).is_ok());
    }

    #[test]
    fn gym_scope_enforced_requires_matching_gym() {
        assert!(ensure_gym_scope(true, &employee_at(Some(3)), 3).is_ok());
        assert!(ensure_gym_scope(true, &employee_at(Some(1)), 3).is_err());
        // Unaffiliated staff have no gym to match.
        assert!(ensure_gym_scope(true, &employee_at(None), 3).is_err());
    }
}
