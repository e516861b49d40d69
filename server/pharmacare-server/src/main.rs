use anyhow::{Context, Result};
use pharmacare_server::{create_app, PharmacareServer, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmacare_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let bind_address = config.bind_address.clone();

    let server = PharmacareServer::new(config).await?;
    sqlx::migrate!("./migrations")
        .run(&server.db_pool)
        .await
        .context("database migration failed")?;

    let app = create_app(server);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!(%bind_address, "pharmacare server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
