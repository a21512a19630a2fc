//! Subscription CRUD and the on-demand validity check.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::guard;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{Customer, Role, Subscription};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewSubscription {
    pub subscription_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: Decimal,
    pub period: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionUpdate {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub price: Option<Decimal>,
    pub period: Option<i32>,
}

/// Whether a subscription bought on `purchase_date` is still active on
/// `today`. The boundary day (purchase + period) is inclusive. This is a
/// pure function of its inputs, recomputed on every request - there is no
/// stored "active" flag to drift out of sync.
pub fn subscription_active(purchase_date: NaiveDate, period_days: i32, today: NaiveDate) -> bool {
    today <= purchase_date + Duration::days(i64::from(period_days))
}

/// GET /check_sub_validity/:customer_id
pub async fn check_sub_validity(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.enroll_roles).await?;

    let customer = sqlx::query_as::<_, Customer>(
        "SELECT customer_id, subscription_id, first_name, last_name, address, phone_number,
                sub_purchase_date
         FROM customer WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Customer does not exist"))?;

    let subscription_id = customer
        .subscription_id
        .ok_or_else(|| ApiError::not_found("Customer has no subscription"))?;
    let purchase_date = customer
        .sub_purchase_date
        .ok_or_else(|| ApiError::not_found("Customer has no subscription purchase date"))?;

    let subscription = fetch_subscription(&state.pool, subscription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Subscription does not exist"))?;

    let today = Utc::now().date_naive();
    let expires_on = purchase_date + Duration::days(i64::from(subscription.period));

    if subscription_active(purchase_date, subscription.period, today) {
        Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "customer_id": customer_id,
                    "active": true,
                    "expires_on": expires_on
                }
            })),
        ))
    } else {
        Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "error": "Subscription expired",
                "data": {
                    "customer_id": customer_id,
                    "active": false,
                    "expired_on": expires_on
                }
            })),
        ))
    }
}

/// POST /add_subscription
pub async fn add_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NewSubscription>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    if payload.period < 0 {
        return Err(ApiError::bad_request("period must be a non-negative integer"));
    }
    if payload.price < Decimal::ZERO {
        return Err(ApiError::bad_request("price must be a non-negative number"));
    }

    if fetch_subscription(&state.pool, payload.subscription_id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("Subscription already exists"));
    }

    let subscription = sqlx::query_as::<_, Subscription>(
        "INSERT INTO subscription (subscription_id, type, price, period)
         VALUES ($1, $2, $3, $4)
         RETURNING subscription_id, type, price, period",
    )
    .bind(payload.subscription_id)
    .bind(&payload.kind)
    .bind(payload.price)
    .bind(payload.period)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("subscription added: ID {}", subscription.subscription_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": subscription })),
    ))
}

/// GET /get_subscription/:subscription_id
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &Role::ALL).await?;

    let subscription = fetch_subscription(&state.pool, subscription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Subscription does not exist"))?;

    Ok(Json(json!({ "success": true, "data": subscription })))
}

/// PUT /update_subscription/:subscription_id
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SubscriptionUpdate>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let current = fetch_subscription(&state.pool, subscription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Subscription does not exist"))?;

    let kind = payload.kind.unwrap_or(current.kind);
    let price = payload.price.unwrap_or(current.price);
    let period = payload.period.unwrap_or(current.period);
    if period < 0 {
        return Err(ApiError::bad_request("period must be a non-negative integer"));
    }

    let subscription = sqlx::query_as::<_, Subscription>(
        "UPDATE subscription SET type = $1, price = $2, period = $3
         WHERE subscription_id = $4
         RETURNING subscription_id, type, price, period",
    )
    .bind(&kind)
    .bind(price)
    .bind(period)
    .bind(subscription_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("subscription updated: ID {}", subscription_id);
    Ok(Json(json!({ "success": true, "data": subscription })))
}

/// DELETE /delete_subscription/:subscription_id
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let deleted = sqlx::query("DELETE FROM subscription WHERE subscription_id = $1")
        .bind(subscription_id)
        .execute(&state.pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Subscription does not exist"));
    }

    tracing::info!("subscription deleted: ID {}", subscription_id);
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Subscription deleted successfully" }
    })))
}

async fn fetch_subscription(
    pool: &sqlx::PgPool,
    subscription_id: i64,
) -> Result<Option<Subscription>, ApiError> {
    let subscription = sqlx::query_as::<_, Subscription>(
        "SELECT subscription_id, type, price, period FROM subscription WHERE subscription_id = $1",
    )
    .bind(subscription_id)
    .fetch_optional(pool)
    .await?;
    Ok(subscription)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn active_within_period() {
        let purchase = date(2025, 1, 1);
        assert!(subscription_active(purchase, 30, date(2025, 1, 1)));
        assert!(subscription_active(purchase, 30, date(2025, 1, 15)));
    }

    #[test]
    fn boundary_day_is_inclusive() {
        let purchase = date(2025, 1, 1);
        // Expires on Jan 31 (1 + 30 days); still active that day.
        assert!(subscription_active(purchase, 30, date(2025, 1, 31)));
        // One day later it is expired.
        assert!(!subscription_active(purchase, 30, date(2025, 2, 1)));
    }

    #[test]
    fn zero_period_is_active_only_on_purchase_day() {
        let purchase = date(2025, 6, 10);
        assert!(subscription_active(purchase, 0, date(2025, 6, 10)));
        assert!(!subscription_active(purchase, 0, date(2025, 6, 11)));
    }

    #[test]
    fn period_spans_month_and_year_boundaries() {
        let purchase = date(2024, 12, 20);
        assert!(subscription_active(purchase, 31, date(2025, 1, 20)));
        assert!(!subscription_active(purchase, 31, date(2025, 1, 21)));
    }
}
