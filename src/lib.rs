use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

/// Shared application state. The pool is the only shared mutable resource;
/// handlers receive it here instead of through a module-level singleton.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<config::AppConfig>,
}

pub fn app(state: AppState) -> Router {
    let prefix = state.config.api.route_prefix.clone();

    let api = public_routes().merge(
        protected_routes()
            .layer(from_fn_with_state(state.clone(), middleware::auth::jwt_auth_middleware)),
    );

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health));

    // An empty prefix mounts the API at the bare root.
    let mut router = if prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(&prefix, api)
    };

    if state.config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/login", post(auth::login))
        .route("/first_register", post(auth::first_register))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .merge(employee_routes())
        .merge(customer_routes())
        .merge(gym_routes())
        .merge(gymclass_routes())
        .merge(enrollment_routes())
        .merge(subscription_routes())
        .merge(schedule_routes())
        .merge(product_routes())
}

fn employee_routes() -> Router<AppState> {
    use handlers::employees;

    Router::new()
        .route("/get_employee/:employee_id", get(employees::get_employee))
        .route("/update_employee/:employee_id", put(employees::update_employee))
        .route("/delete_employee/:employee_id", delete(employees::delete_employee))
}

fn customer_routes() -> Router<AppState> {
    use handlers::customers;

    Router::new()
        .route("/add_customer", post(customers::add_customer))
        .route("/get_customer/:customer_id", get(customers::get_customer))
        .route("/update_customer/:customer_id", put(customers::update_customer))
        .route("/delete_customer/:customer_id", delete(customers::delete_customer))
}

fn gym_routes() -> Router<AppState> {
    use handlers::gyms;

    Router::new()
        .route("/add_gym", post(gyms::add_gym))
        .route("/get_gym/:gym_id", get(gyms::get_gym))
        .route("/update_gym/:gym_id", put(gyms::update_gym))
        .route("/delete_gym/:gym_id", delete(gyms::delete_gym))
}

fn gymclass_routes() -> Router<AppState> {
    use handlers::gymclasses;

    Router::new()
        .route("/add_gymclass", post(gymclasses::add_gymclass))
        .route("/get_gymclass/:gymclass_id", get(gymclasses::get_gymclass))
        .route("/update_gymclass/:gymclass_id", put(gymclasses::update_gymclass))
        .route("/delete_gymclass/:gymclass_id", delete(gymclasses::delete_gymclass))
}

fn enrollment_routes() -> Router<AppState> {
    use handlers::enrollment;

    Router::new()
        .route("/enroll_customer/:gymclass_id", post(enrollment::enroll_customer))
        .route("/unenroll_customer/:gymclass_id", post(enrollment::unenroll_customer))
}

fn subscription_routes() -> Router<AppState> {
    use handlers::subscriptions;

    Router::new()
        .route("/add_subscription", post(subscriptions::add_subscription))
        .route("/get_subscription/:subscription_id", get(subscriptions::get_subscription))
        .route("/update_subscription/:subscription_id", put(subscriptions::update_subscription))
        .route("/delete_subscription/:subscription_id", delete(subscriptions::delete_subscription))
        .route("/check_sub_validity/:customer_id", get(subscriptions::check_sub_validity))
}

fn schedule_routes() -> Router<AppState> {
    use handlers::schedules;

    Router::new()
        .route("/add_schedule", post(schedules::add_schedule))
        .route("/get_schedule/:schedule_id", get(schedules::get_schedule))
        .route("/update_schedule/:schedule_id", put(schedules::update_schedule))
        .route("/delete_schedule/:schedule_id", delete(schedules::delete_schedule))
}

fn product_routes() -> Router<AppState> {
    use handlers::products;

    Router::new()
        .route("/add_product", post(products::add_product))
        .route("/get_product/:product_id", get(products::get_product))
        .route("/update_product/:product_id", put(products::update_product))
        .route("/delete_product/:product_id", delete(products::delete_product))
}
