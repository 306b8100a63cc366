use leadstack_api::app::{build_router, AppState};
use leadstack_api::{config, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadstack_api=info,tower_http=info".into()),
        )
        .init();

    let config = config::config();
    tracing::info!("starting leadstack-api in {:?} mode", config.environment);

    let pool = database::connect_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app = build_router(AppState { db: pool });

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
