use anyhow::Context;

use partyhub_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    partyhub_observability::tracing::init(&config.tracing());

    let app = partyhub_api::app::build_app(&config)
        .await
        .context("failed to wire party services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
