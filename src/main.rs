use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dhanrakshak_backend::{
    chain::EthereumLedger,
    create_router,
    identity::GoogleVerifier,
    middleware::spawn_limiter_sweeper,
    open_database,
    rag::{Assistant, OpenAiCompatibleModel},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dhanrakshak_backend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DhanRakshak backend...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    let db = open_database(&config.database_path)?;
    tracing::info!("Database opened at {}", config.database_path);

    let mut state = AppState::new(db, config.clone())?;

    // The server still starts without a ledger; chain routes answer 503
    if let Some(chain) = &config.chain {
        match EthereumLedger::connect(chain).await {
            Ok(ledger) => state = state.with_ledger(Arc::new(ledger)),
            Err(e) => tracing::error!("Blockchain initialization failed: {}", e),
        }
    }

    if let Some(client_id) = &config.google_client_id {
        state = state.with_identity(Arc::new(GoogleVerifier::new(client_id.clone())));
    }

    if let Some(assistant) = &config.assistant {
        let model = OpenAiCompatibleModel::new(assistant)?;
        state = state.with_assistant(Arc::new(Assistant::new(
            Arc::new(model),
            assistant.knowledge_base_path.clone(),
        )));
    } else {
        tracing::warn!("LLM_API_KEY not set - chat assistant disabled");
    }

    spawn_limiter_sweeper(state.limiter.clone(), config.rate_limit_window_secs);

    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
