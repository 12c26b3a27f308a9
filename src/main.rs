use std::net::SocketAddr;

use mimalloc::MiMalloc;
use smsledger::config::AppConfig;
use smsledger::{db, routes, AppState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smsledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(host = %addr, "Starting smsledger API server");

    let state = AppState { db: pool, config };
    let app = routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
