// src/main.rs
use tcp_club::{config::Config, db, services::upload_service, state::AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tcp_club=debug,tower_http=info,sqlx=warn".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Starting TCP club server...");

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // --- Database ---
    let db_pool = match db::create_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Database initialization failed: {}", e);
            return Err(anyhow::anyhow!("Failed to connect/migrate DB: {}", e));
        }
    };
    db::ensure_admin(&db_pool, &config).await?;

    upload_service::ensure_upload_dirs(&config.upload_dir).await?;
    tracing::info!("📁 Uploads stored under {}", config.upload_dir.display());

    let addr = config.bind_addr;
    let app_state = AppState::new(db_pool, config);

    tracing::info!("🛠️ Building router and middlewares...");
    let app = tcp_club::build_app(app_state)?;

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Could not bind {}: {}", addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Fatal server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
