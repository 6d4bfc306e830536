use anyhow::{Context, Result};
use std::fs;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use master::{config::MasterConfig, handlers, state::AppState, HttpInvoker};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("master=debug,tower_http=info")),
        )
        .init();

    let config = MasterConfig::from_env();
    fs::create_dir_all(&config.work_dir).with_context(|| {
        format!("no se pudo crear el directorio de trabajo {}", config.work_dir.display())
    })?;

    let invoker = HttpInvoker::new(config.rpc_timeout).context("cliente HTTP")?;
    let state = AppState::new(invoker, config.work_dir.clone());

    // router HTTP
    let app = handlers::build_router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.bind))?;
    info!(
        "master escuchando en {} (work_dir={})",
        listener.local_addr()?,
        config.work_dir.display()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
