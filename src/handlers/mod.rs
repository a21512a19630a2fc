use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::AppState;

pub mod auth;
pub mod customers;
pub mod employees;
pub mod enrollment;
pub mod gymclasses;
pub mod gyms;
pub mod products;
pub mod schedules;
pub mod subscriptions;

/// GET / - service card
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let prefix = &state.config.api.route_prefix;

    Json(json!({
        "success": true,
        "data": {
            "name": "Gym API",
            "version": version,
            "description": "Gym chain management backend (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": format!("{}/login (public - token acquisition)", prefix),
                "first_register": format!("{}/first_register (public - one-time bootstrap)", prefix),
                "register": format!("{}/register (protected)", prefix),
                "employees": format!("{}/get_employee/:id, update, delete (protected)", prefix),
                "customers": format!("{}/add_customer, get, update, delete (protected)", prefix),
                "gyms": format!("{}/add_gym, get, update, delete (protected)", prefix),
                "gym_classes": format!("{}/add_gymclass, get, update, delete (protected)", prefix),
                "enrollment": format!("{}/enroll_customer/:gymclass_id, unenroll_customer/:gymclass_id (protected)", prefix),
                "subscriptions": format!("{}/add_subscription, get, update, delete, check_sub_validity/:customer_id (protected)", prefix),
                "schedules": format!("{}/add_schedule, get, update, delete (protected)", prefix),
                "products": format!("{}/add_product, get, update, delete (protected)", prefix),
            }
        }
    }))
}

/// GET /health - liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
