//! Gym class CRUD.
//!
//! `signed_people` is deliberately absent from the add/update payloads; the
//! counter belongs to the enrollment ledger (`handlers::enrollment`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::NaiveTime;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::guard;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{GymClass, Role};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewGymClass {
    pub gymclass_id: i64,
    pub employee_id: Option<i64>,
    pub gym_id: i64,
    pub name: String,
    pub max_people: i32,
    pub time: NaiveTime,
    pub day_otw: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GymClassUpdate {
    pub employee_id: Option<i64>,
    pub gym_id: Option<i64>,
    pub name: Option<String>,
    pub max_people: Option<i32>,
    pub time: Option<NaiveTime>,
    pub day_otw: Option<String>,
}

/// POST /add_gymclass
pub async fn add_gymclass(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NewGymClass>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    if payload.max_people <= 0 {
        return Err(ApiError::bad_request("max_people must be a positive integer"));
    }

    if let Some(employee_id) = payload.employee_id {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM employee WHERE employee_id = $1)")
                .bind(employee_id)
                .fetch_one(&state.pool)
                .await?;
        if !exists {
            return Err(ApiError::not_found("Employee does not exist"));
        }
    }

    let gym_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM gym WHERE gym_id = $1)")
        .bind(payload.gym_id)
        .fetch_one(&state.pool)
        .await?;
    if !gym_exists {
        return Err(ApiError::not_found("Gym does not exist"));
    }

    if fetch_gymclass(&state.pool, payload.gymclass_id).await?.is_some() {
        return Err(ApiError::conflict("Gym class already exists"));
    }

    // New classes always open empty; occupancy only moves through the
    // enrollment ledger.
    let gymclass = sqlx::query_as::<_, GymClass>(
        "INSERT INTO gym_class (gymclass_id, employee_id, gym_id, name, max_people, time,
                                day_otw, signed_people)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 0)
         RETURNING gymclass_id, employee_id, gym_id, name, max_people, time, day_otw,
                   signed_people",
    )
    .bind(payload.gymclass_id)
    .bind(payload.employee_id)
    .bind(payload.gym_id)
    .bind(&payload.name)
    .bind(payload.max_people)
    .bind(payload.time)
    .bind(&payload.day_otw)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("gym class added: ID {}", gymclass.gymclass_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": gymclass })),
    ))
}

/// GET /get_gymclass/:gymclass_id
pub async fn get_gymclass(
    State(state): State<AppState>,
    Path(gymclass_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &Role::ALL).await?;

    let gymclass = fetch_gymclass(&state.pool, gymclass_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Gym class does not exist"))?;

    Ok(Json(json!({ "success": true, "data": gymclass })))
}

/// PUT /update_gymclass/:gymclass_id
pub async fn update_gymclass(
    State(state): State<AppState>,
    Path(gymclass_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<GymClassUpdate>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let current = fetch_gymclass(&state.pool, gymclass_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Gym class does not exist"))?;

    let max_people = payload.max_people.unwrap_or(current.max_people);
    if max_people <= 0 {
        return Err(ApiError::bad_request("max_people must be a positive integer"));
    }
    // Shrinking below the current occupancy would break the capacity
    // invariant for everyone already signed up.
    if max_people < current.signed_people {
        return Err(ApiError::bad_request(
            "max_people cannot be lower than the current number of signed up people",
        ));
    }

    let gymclass = sqlx::query_as::<_, GymClass>(
        "UPDATE gym_class
         SET employee_id = $1, gym_id = $2, name = $3, max_people = $4, time = $5, day_otw = $6
         WHERE gymclass_id = $7
         RETURNING gymclass_id, employee_id, gym_id, name, max_people, time, day_otw,
                   signed_people",
    )
    .bind(payload.employee_id.or(current.employee_id))
    .bind(payload.gym_id.unwrap_or(current.gym_id))
    .bind(payload.name.unwrap_or(current.name))
    .bind(max_people)
    .bind(payload.time.unwrap_or(current.time))
    .bind(payload.day_otw.unwrap_or(current.day_otw))
    .bind(gymclass_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("gym class updated: ID {}", gymclass_id);
    Ok(Json(json!({ "success": true, "data": gymclass })))
}

/// DELETE /delete_gymclass/:gymclass_id
pub async fn delete_gymclass(
    State(state): State<AppState>,
    Path(gymclass_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    // Enrollment rows cascade with the class; the counter disappears with
    // the row it mirrors.
    let deleted = sqlx::query("DELETE FROM gym_class WHERE gymclass_id = $1")
        .bind(gymclass_id)
        .execute(&state.pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Gym class does not exist"));
    }

    tracing::info!("gym class deleted: ID {}", gymclass_id);
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Gym class deleted successfully" }
    })))
}

async fn fetch_gymclass(
    pool: &sqlx::PgPool,
    gymclass_id: i64,
) -> Result<Option<GymClass>, ApiError> {
    let gymclass = sqlx::query_as::<_, GymClass>(
        "SELECT gymclass_id, employee_id, gym_id, name, max_people, time, day_otw, signed_people
         FROM gym_class WHERE gymclass_id = $1",
    )
    .bind(gymclass_id)
    .fetch_optional(pool)
    .await?;
    Ok(gymclass)
}
