//! Weekly schedule CRUD. A schedule entry is either a class slot or a staff
//! shift (`entry_type`).

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
use crate::models::{Role, Schedule};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewSchedule {
    pub schedule_id: i64,
    pub gymclass_id: Option<i64>,
    pub gym_id: i64,
    pub employee_id: Option<i64>,
    pub entry_type: String,
    pub day_otw: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleUpdate {
    pub gymclass_id: Option<i64>,
    pub gym_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub entry_type: Option<String>,
    pub day_otw: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

fn validate_entry_type(entry_type: &str) -> Result<(), ApiError> {
    match entry_type {
        "class" | "shift" => Ok(()),
        _ => Err(ApiError::bad_request(
            "entry_type must be 'class' or 'shift'",
        )),
    }
}

fn validate_positive(field: &str, value: i64) -> Result<(), ApiError> {
    if value <= 0 {
        return Err(ApiError::bad_request(format!(
            "{} must be a positive integer",
            field
        )));
    }
    Ok(())
}

/// POST /add_schedule
pub async fn add_schedule(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NewSchedule>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    validate_positive("schedule_id", payload.schedule_id)?;
    validate_positive("gym_id", payload.gym_id)?;
    if let Some(gymclass_id) = payload.gymclass_id {
        validate_positive("gymclass_id", gymclass_id)?;
    }
    if let Some(employee_id) = payload.employee_id {
        validate_positive("employee_id", employee_id)?;
    }
    validate_entry_type(&payload.entry_type)?;

    if fetch_schedule(&state.pool, payload.schedule_id).await?.is_some() {
        return Err(ApiError::conflict("Schedule already exists"));
    }

    let schedule = sqlx::query_as::<_, Schedule>(
        "INSERT INTO schedule (schedule_id, gymclass_id, gym_id, employee_id, entry_type,
                               day_otw, start_time, end_time)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING schedule_id, gymclass_id, gym_id, employee_id, entry_type, day_otw,
                   start_time, end_time",
    )
    .bind(payload.schedule_id)
    .bind(payload.gymclass_id)
    .bind(payload.gym_id)
    .bind(payload.employee_id)
    .bind(&payload.entry_type)
    .bind(&payload.day_otw)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("schedule added: ID {}", schedule.schedule_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": schedule })),
    ))
}

/// GET /get_schedule/:schedule_id
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &Role::ALL).await?;

    let schedule = fetch_schedule(&state.pool, schedule_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Schedule does not exist"))?;

    Ok(Json(json!({ "success": true, "data": schedule })))
}

/// PUT /update_schedule/:schedule_id
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<ScheduleUpdate>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let current = fetch_schedule(&state.pool, schedule_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Schedule does not exist"))?;

    let entry_type = payload.entry_type.unwrap_or(current.entry_type);
    validate_entry_type(&entry_type)?;

    let schedule = sqlx::query_as::<_, Schedule>(
        "UPDATE schedule
         SET gymclass_id = $1, gym_id = $2, employee_id = $3, entry_type = $4, day_otw = $5,
             start_time = $6, end_time = $7
         WHERE schedule_id = $8
         RETURNING schedule_id, gymclass_id, gym_id, employee_id, entry_type, day_otw,
                   start_time, end_time",
    )
    .bind(payload.gymclass_id.or(current.gymclass_id))
    .bind(payload.gym_id.unwrap_or(current.gym_id))
    .bind(payload.employee_id.or(current.employee_id))
    .bind(&entry_type)
    .bind(payload.day_otw.unwrap_or(current.day_otw))
    .bind(payload.start_time.unwrap_or(current.start_time))
    .bind(payload.end_time.unwrap_or(current.end_time))
    .bind(schedule_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("schedule updated: ID {}", schedule_id);
    Ok(Json(json!({ "success": true, "data": schedule })))
}

/// DELETE /delete_schedule/:schedule_id
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let deleted = sqlx::query("DELETE FROM schedule WHERE schedule_id = $1")
        .bind(schedule_id)
        .execute(&state.pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Schedule does not exist"));
    }

    tracing::info!("schedule deleted: ID {}", schedule_id);
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Schedule deleted successfully" }
    })))
}

async fn fetch_schedule(
    pool: &sqlx::PgPool,
    schedule_id: i64,
) -> Result<Option<Schedule>, ApiError> {
    let schedule = sqlx::query_as::<_, Schedule>(
        "SELECT schedule_id, gymclass_id, gym_id, employee_id, entry_type, day_otw, start_time,
                end_time
         FROM schedule WHERE schedule_id = $1",
    )
    .bind(schedule_id)
    .fetch_optional(pool)
    .await?;
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_is_a_closed_set() {
        assert!(validate_entry_type("class").is_ok());
        assert!(validate_entry_type("shift").is_ok());
        assert!(validate_entry_type("party").is_err());
        assert!(validate_entry_type("").is_err());
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(validate_positive("schedule_id", 1).is_ok());
        assert!(validate_positive("schedule_id", 0).is_err());
        assert!(validate_positive("schedule_id", -5).is_err());
    }
}
