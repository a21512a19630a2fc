//! Gym location CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::guard;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{Gym, Role};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewGym {
    pub gym_id: i64,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GymUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// POST /add_gym
pub async fn add_gym(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NewGym>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    if fetch_gym(&state.pool, payload.gym_id).await?.is_some() {
        return Err(ApiError::conflict("Gym already exists"));
    }

    let gym = sqlx::query_as::<_, Gym>(
        "INSERT INTO gym (gym_id, name, address) VALUES ($1, $2, $3)
         RETURNING gym_id, name, address",
    )
    .bind(payload.gym_id)
    .bind(&payload.name)
    .bind(&payload.address)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("gym added: ID {}", gym.gym_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": gym })),
    ))
}

/// GET /get_gym/:gym_id
pub async fn get_gym(
    State(state): State<AppState>,
    Path(gym_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &Role::ALL).await?;

    let gym = fetch_gym(&state.pool, gym_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Gym does not exist"))?;

    Ok(Json(json!({ "success": true, "data": gym })))
}

/// PUT /update_gym/:gym_id
pub async fn update_gym(
    State(state): State<AppState>,
    Path(gym_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<GymUpdate>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let current = fetch_gym(&state.pool, gym_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Gym does not exist"))?;

    let gym = sqlx::query_as::<_, Gym>(
        "UPDATE gym SET name = $1, address = $2 WHERE gym_id = $3
         RETURNING gym_id, name, address",
    )
    .bind(payload.name.unwrap_or(current.name))
    .bind(payload.address.unwrap_or(current.address))
    .bind(gym_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("gym updated: ID {}", gym_id);
    Ok(Json(json!({ "success": true, "data": gym })))
}

/// DELETE /delete_gym/:gym_id
pub async fn delete_gym(
    State(state): State<AppState>,
    Path(gym_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let deleted = sqlx::query("DELETE FROM gym WHERE gym_id = $1")
        .bind(gym_id)
        .execute(&state.pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Gym does not exist"));
    }

    tracing::info!("gym deleted: ID {}", gym_id);
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Gym deleted successfully" }
    })))
}

async fn fetch_gym(pool: &sqlx::PgPool, gym_id: i64) -> Result<Option<Gym>, ApiError> {
    let gym = sqlx::query_as::<_, Gym>("SELECT gym_id, name, address FROM gym WHERE gym_id = $1")
        .bind(gym_id)
        .fetch_optional(pool)
        .await?;
    Ok(gym)
}
