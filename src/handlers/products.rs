//! Pro-shop product CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::guard;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::models::{Product, Role};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub product_id: i64,
    pub gym_id: i64,
    pub name: String,
    pub quantity_in_stock: i32,
    pub quantity_sold: i32,
    pub price: Decimal,
    #[serde(default)]
    pub total_revenue: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    pub gym_id: Option<i64>,
    pub name: Option<String>,
    pub quantity_in_stock: Option<i32>,
    pub quantity_sold: Option<i32>,
    pub price: Option<Decimal>,
    pub total_revenue: Option<Decimal>,
}

fn validate_quantities(
    quantity_in_stock: i32,
    quantity_sold: i32,
    price: Decimal,
) -> Result<(), ApiError> {
    if quantity_in_stock < 0 {
        return Err(ApiError::bad_request(
            "quantity_in_stock must be a non-negative integer",
        ));
    }
    if quantity_sold < 0 {
        return Err(ApiError::bad_request(
            "quantity_sold must be a non-negative integer",
        ));
    }
    if price < Decimal::ZERO {
        return Err(ApiError::bad_request("price must be a non-negative number"));
    }
    Ok(())
}

/// POST /add_product
pub async fn add_product(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NewProduct>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    if payload.product_id <= 0 {
        return Err(ApiError::bad_request("product_id must be a positive integer"));
    }
    if payload.gym_id <= 0 {
        return Err(ApiError::bad_request("gym_id must be a positive integer"));
    }
    validate_quantities(payload.quantity_in_stock, payload.quantity_sold, payload.price)?;

    if fetch_product(&state.pool, payload.product_id).await?.is_some() {
        return Err(ApiError::conflict("Product already exists"));
    }

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO product (product_id, gym_id, name, quantity_in_stock, quantity_sold,
                              price, total_revenue)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING product_id, gym_id, name, quantity_in_stock, quantity_sold, price,
                   total_revenue",
    )
    .bind(payload.product_id)
    .bind(payload.gym_id)
    .bind(&payload.name)
    .bind(payload.quantity_in_stock)
    .bind(payload.quantity_sold)
    .bind(payload.price)
    .bind(payload.total_revenue)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("product added: ID {}", product.product_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": product })),
    ))
}

/// GET /get_product/:product_id
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &Role::ALL).await?;

    let product = fetch_product(&state.pool, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product does not exist"))?;

    Ok(Json(json!({ "success": true, "data": product })))
}

/// PUT /update_product/:product_id
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<ProductUpdate>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let current = fetch_product(&state.pool, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product does not exist"))?;

    let quantity_in_stock = payload.quantity_in_stock.unwrap_or(current.quantity_in_stock);
    let quantity_sold = payload.quantity_sold.unwrap_or(current.quantity_sold);
    let price = payload.price.unwrap_or(current.price);
    validate_quantities(quantity_in_stock, quantity_sold, price)?;

    let product = sqlx::query_as::<_, Product>(
        "UPDATE product
         SET gym_id = $1, name = $2, quantity_in_stock = $3, quantity_sold = $4, price = $5,
             total_revenue = $6
         WHERE product_id = $7
         RETURNING product_id, gym_id, name, quantity_in_stock, quantity_sold, price,
                   total_revenue",
    )
    .bind(payload.gym_id.unwrap_or(current.gym_id))
    .bind(payload.name.unwrap_or(current.name))
    .bind(quantity_in_stock)
    .bind(quantity_sold)
    .bind(price)
    .bind(payload.total_revenue.unwrap_or(current.total_revenue))
    .bind(product_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!("product updated: ID {}", product_id);
    Ok(Json(json!({ "success": true, "data": product })))
}

/// DELETE /delete_product/:product_id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    guard::require_role(&state.pool, &auth_user, &state.config.security.admin_roles).await?;

    let deleted = sqlx::query("DELETE FROM product WHERE product_id = $1")
        .bind(product_id)
        .execute(&state.pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Product does not exist"));
    }

    tracing::info!("product deleted: ID {}", product_id);
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Product deleted successfully" }
    })))
}

async fn fetch_product(pool: &sqlx::PgPool, product_id: i64) -> Result<Option<Product>, ApiError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT product_id, gym_id, name, quantity_in_stock, quantity_sold, price, total_revenue
         FROM product WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_quantities_rejected() {
        assert!(validate_quantities(0, 0, Decimal::ZERO).is_ok());
        assert!(validate_quantities(-1, 0, Decimal::ZERO).is_err());
        assert!(validate_quantities(0, -1, Decimal::ZERO).is_err());
        assert!(validate_quantities(0, 0, Decimal::NEGATIVE_ONE).is_err());
    }
}
