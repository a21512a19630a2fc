//! Customer CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::guard;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{Customer, Role};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewCustomer {
    pub customer_id: i64,
    pub subscription_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub sub_purchase_date: Option<NaiveDate>,
}

// Unknown fields are rejected rather than ignored, mirroring the
// allowed-fields update policy.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerUpdate {
    pub subscription_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub sub_purchase_date: Option<NaiveDate>,
}

/// POST /add_customer
pub async fn add_customer(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.enroll_roles).await?;

    if fetch_customer(&state.pool, payload.customer_id).await?.is_some() {
        return Err(ApiError::conflict("Customer already exists"));
    }

    let customer = sqlx::query_as::<_, Customer>(
        "INSERT INTO customer (customer_id, subscription_id, first_name, last_name, address,
                               phone_number, sub_purchase_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING customer_id, subscription_id, first_name, last_name, address, phone_number,
                   sub_purchase_date",
    )
    .bind(payload.customer_id)
    .bind(payload.subscription_id)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.address)
    .bind(&payload.phone_number)
    .bind(payload.sub_purchase_date)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("customer added: ID {}", customer.customer_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": customer })),
    ))
}

/// GET /get_customer/:customer_id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &Role::ALL).await?;

    let customer = fetch_customer(&state.pool, customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer does not exist"))?;

    Ok(Json(json!({ "success": true, "data": customer })))
}

/// PUT /update_customer/:customer_id
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CustomerUpdate>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.enroll_roles).await?;

    let current = fetch_customer(&state.pool, customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer does not exist"))?;

    let customer = sqlx::query_as::<_, Customer>(
        "UPDATE customer
         SET subscription_id = $1, first_name = $2, last_name = $3, address = $4,
             phone_number = $5, sub_purchase_date = $6
         WHERE customer_id = $7
         RETURNING customer_id, subscription_id, first_name, last_name, address, phone_number,
                   sub_purchase_date",
    )
    .bind(payload.subscription_id.or(current.subscription_id))
    .bind(payload.first_name.unwrap_or(current.first_name))
    .bind(payload.last_name.unwrap_or(current.last_name))
    .bind(payload.address.or(current.address))
    .bind(payload.phone_number.or(current.phone_number))
    .bind(payload.sub_purchase_date.or(current.sub_purchase_date))
    .bind(customer_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("customer updated: ID {}", customer_id);
    Ok(Json(json!({ "success": true, "data": customer })))
}

/// DELETE /delete_customer/:customer_id
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.enroll_roles).await?;

    // Removing an enrolled customer behind the ledger's back would strand
    // the occupancy counters. The check and the delete share a transaction;
    // an enroll committing in between still trips the foreign key, which
    // reports as a conflict.
    let mut tx = state.pool.begin().await?;

    let enrolled: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM enrollment WHERE customer_id = $1)")
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;
    if enrolled {
        return Err(ApiError::conflict(
            "Customer still has active class enrollments",
        ));
    }

    let deleted = sqlx::query("DELETE FROM customer WHERE customer_id = $1")
        .bind(customer_id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Customer does not exist"));
    }

    tx.commit().await?;

    tracing::info!("customer deleted: ID {}", customer_id);
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Customer deleted successfully" }
    })))
}

async fn fetch_customer(
    pool: &sqlx::PgPool,
    customer_id: i64,
) -> Result<Option<Customer>, ApiError> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT customer_id, subscription_id, first_name, last_name, address, phone_number,
                sub_purchase_date
         FROM customer WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;
    Ok(customer)
}
