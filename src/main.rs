//! Application entry point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use chain_connector::api::{RateLimitConfig, create_router, create_router_with_rate_limit};
use chain_connector::app::{AlgoService, AppState, Dispatcher, MultiTokenService, PreparationTable};
use chain_connector::domain::{KmsStore, NodeProvider};
use chain_connector::infra::{
    AlgoNodeClient, EnvNodeProvider, HttpRpcConnector, HttpTransactionPreparer, NodeBroadcaster,
    NodeConfig, PostgresClient, PostgresConfig,
};

/// Application configuration
struct Config {
    database_url: String,
    /// Base URL of the transaction preparation service
    sdk_url: String,
    host: String,
    port: u16,
    /// Timeout of every outbound HTTP call
    request_timeout: Duration,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
    nodes: NodeConfig,
}

impl Config {
    fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;
        let sdk_url = env::var("SDK_URL").context("SDK_URL not set")?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let enable_rate_limiting = env::var("ENABLE_RATE_LIMITING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let nodes = NodeConfig::from_env().context("Invalid node configuration")?;

        Ok(Self {
            database_url,
            sdk_url,
            host,
            port,
            request_timeout,
            enable_rate_limiting,
            rate_limit_config: RateLimitConfig::from_env(),
            nodes,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("Chain connector v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(testnet = config.nodes.testnet, "Initializing infrastructure");

    let postgres_client = PostgresClient::new(&config.database_url, PostgresConfig::default()).await?;
    postgres_client.run_migrations().await?;
    info!("Database connected and migrations applied");
    let kms: Arc<dyn KmsStore> = Arc::new(postgres_client);

    let nodes: Arc<dyn NodeProvider> = Arc::new(EnvNodeProvider::new(config.nodes));
    let rpc = Arc::new(HttpRpcConnector::new(config.request_timeout)?);
    let algod = AlgoNodeClient::new(config.request_timeout)?;

    let preparer = HttpTransactionPreparer::new(&config.sdk_url, config.request_timeout)?;
    let table = PreparationTable::connector(preparer.factory());
    info!(entries = table.len(), sdk_url = %config.sdk_url, "Preparation table registered");

    let broadcaster = Arc::new(NodeBroadcaster::new(
        Arc::clone(&nodes),
        rpc.clone(),
        algod.clone(),
        Arc::clone(&kms),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        table,
        Arc::clone(&nodes),
        Arc::clone(&kms),
        broadcaster.clone(),
    ));

    let multi_token = Arc::new(MultiTokenService::new(
        Arc::clone(&dispatcher),
        Arc::clone(&nodes),
        rpc,
    ));
    let algo = Arc::new(AlgoService::new(
        dispatcher,
        Arc::clone(&nodes),
        Arc::new(algod),
        broadcaster,
    ));
    let app_state = Arc::new(AppState::new(multi_token, algo, kms, nodes));

    let router = if config.enable_rate_limiting {
        create_router_with_rate_limit(app_state, config.rate_limit_config)
    } else {
        info!("Rate limiting disabled");
        create_router(app_state)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server starting on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
