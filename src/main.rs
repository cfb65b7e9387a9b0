//! Token wallet server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ api (axum) ──▶ orchestrator ──▶ token encoder
//!                                  │
//!                                  ├──▶ ledger client ──▶ Quorum node (JSON-RPC)
//!                                  │
//!                                  └──▶ history store ──▶ sled database
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use token_wallet::config::{load_bytecode, load_config, WalletConfig};
use token_wallet::history::{HistoryStore, SledStore};
use token_wallet::ledger::RpcLedgerClient;
use token_wallet::lifecycle::{signals, Shutdown};
use token_wallet::observability::{logging, metrics};
use token_wallet::orchestrator::{OrchestratorSettings, TransactionOrchestrator};
use token_wallet::token::ContractEncoder;
use token_wallet::HttpServer;

#[derive(Parser)]
#[command(name = "token-wallet", version, about = "Token wallet backend for Quorum")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "WALLET_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WalletConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "token-wallet starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.node.rpc_url,
        chain_id = config.node.chain_id,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let bytecode = match &config.token.bytecode_path {
        Some(path) => Some(load_bytecode(std::path::Path::new(path))?),
        None => {
            tracing::warn!("No token bytecode configured, deploy is disabled");
            None
        }
    };

    let ledger = Arc::new(RpcLedgerClient::new(config.node.clone()).await?);

    let history = Arc::new(match &config.history.db_path {
        Some(path) => SledStore::open(path)?,
        None => {
            tracing::warn!("No history database configured, history is discarded on exit");
            SledStore::temporary()?
        }
    });
    let unresolved = history.find_unresolved()?;
    if !unresolved.is_empty() {
        tracing::warn!(
            count = unresolved.len(),
            "Transactions with unknown outcome; see GET /transactions/pending"
        );
    }

    let settings = OrchestratorSettings::from_config(&config.node, &config.retries)?;
    let orchestrator = Arc::new(TransactionOrchestrator::new(
        ledger,
        ContractEncoder::new(bytecode),
        history.clone(),
        settings,
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, orchestrator);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_signal().await;
    shutdown.trigger();

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server error"),
        Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
    }

    if let Err(e) = history.flush() {
        tracing::error!(error = %e, "Failed to flush transaction history");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
