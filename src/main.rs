use std::sync::Arc;

use gym_api::{app, config, database, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gym_api=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(config::config().clone());
    tracing::info!("starting gym-api ({:?} mode)", config.environment);

    let pool = database::connect(&config.database)?;

    // Migrations run in the background so the server can bind immediately;
    // a failure here means the database is unreachable and /health reports it.
    let migration_pool = pool.clone();
    tokio::spawn(async move {
        if let Err(e) = database::migrate(&migration_pool).await {
            tracing::warn!("migrations not applied: {}", e);
        }
    });

    let state = AppState { pool, config: config.clone() };

    let port: u16 = std::env::var("GYM_API_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
