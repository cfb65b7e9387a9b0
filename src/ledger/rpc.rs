//! JSON-RPC ledger client with timeout, failover and confirmation polling.
//!
//! # Responsibilities
//! - Connect to the node's JSON-RPC endpoint (primary + failovers)
//! - Submit transactions through the node's unlocked account, optionally private
//! - Poll receipts until included and deep enough, or the deadline passes
//! - Execute read-only calls
//!
//! Submission only falls through to the next provider when the previous one
//! could not be reached at all. After a timeout or an error response the
//! payload may have been accepted, so it is never re-sent elsewhere.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use tokio::time::{interval, timeout};

use crate::ledger::client::LedgerClient;
use crate::ledger::types::{
    CallRequest, ChainId, LedgerError, LedgerReceipt, LedgerResult, NodeConfig,
    PreparedTransaction, PrivacyGroup, SendTransactionParams,
};
use crate::observability::metrics;

/// Ledger client backed by one or more JSON-RPC providers.
#[derive(Clone)]
pub struct RpcLedgerClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    config: NodeConfig,
    /// Per-request timeout.
    timeout_duration: Duration,
}

impl RpcLedgerClient {
    /// Create a new client.
    ///
    /// An unreachable node does not fail construction; the chain ID check is
    /// logged and the service starts degraded.
    pub async fn new(config: NodeConfig) -> LedgerResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Ledger client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Ledger client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> LedgerResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> LedgerResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(LedgerError::Rpc("All RPC providers failed".to_string()))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> LedgerResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("All providers failed to get block number".to_string()))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> LedgerResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("All providers failed to get receipt".to_string()))
    }

}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn submit(
        &self,
        tx: PreparedTransaction,
        privacy: Option<&PrivacyGroup>,
    ) -> LedgerResult<TxHash> {
        let params = SendTransactionParams::new(tx, privacy);

        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider
                .client()
                .request::<_, TxHash>("eth_sendTransaction", (params.clone(),));
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(tx_hash)) => {
                    tracing::debug!(provider_idx = i, tx_hash = %tx_hash, "Transaction accepted by node");
                    return Ok(tx_hash);
                }
                Ok(Err(RpcError::ErrorResp(payload))) => {
                    return Err(LedgerError::Submission(payload.message.to_string()));
                }
                Ok(Err(RpcError::Transport(TransportErrorKind::Custom(e)))) => {
                    tracing::warn!(provider_idx = i, error = %e, "Node unreachable, trying next provider");
                }
                Ok(Err(e)) => {
                    return Err(LedgerError::Submission(e.to_string()));
                }
                Err(_) => {
                    return Err(LedgerError::Submission(format!(
                        "no answer from provider {} within {}s, submission state unknown",
                        i,
                        self.timeout_duration.as_secs()
                    )));
                }
            }
        }
        Err(LedgerError::Rpc("All providers unreachable for submission".to_string()))
    }

    async fn await_receipt(&self, tx_hash: TxHash, wait: Duration) -> LedgerResult<LedgerReceipt> {
        let required_confirmations = self.config.confirmation_blocks;
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        let result = timeout(wait, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                // Reverts are final; depth only matters for successful inclusion
                if receipt.status() && required_confirmations > 0 {
                    let current_block = self.get_block_number().await?;
                    let tx_block = receipt.block_number.unwrap_or(current_block);
                    let confirmations = current_block.saturating_sub(tx_block) as u32;

                    if confirmations < required_confirmations {
                        tracing::debug!(
                            tx_hash = %tx_hash,
                            confirmations = confirmations,
                            required = required_confirmations,
                            "Waiting for confirmations"
                        );
                        continue;
                    }
                }

                return Ok(LedgerReceipt::from(receipt));
            }
        })
        .await;

        match result {
            Ok(receipt) => receipt,
            Err(_) => Err(LedgerError::ConfirmationTimeout {
                tx_hash,
                waited_secs: wait.as_secs(),
            }),
        }
    }

    async fn call(&self, request: CallRequest) -> LedgerResult<Bytes> {
        let mut tx = TransactionRequest::default()
            .with_to(request.to)
            .with_input(request.input);
        if let Some(from) = request.from {
            tx = tx.with_from(from);
        }

        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.call(tx.clone());
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(output)) => return Ok(output),
                Ok(Err(RpcError::ErrorResp(payload))) => {
                    return Err(LedgerError::CallFailed(payload.message.to_string()));
                }
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("All providers failed to execute call".to_string()))
    }

    async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_ledger_health(healthy);
        healthy
    }
}

impl From<TransactionReceipt> for LedgerReceipt {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            contract_address: receipt.contract_address,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }
    }
}

impl std::fmt::Debug for RpcLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedgerClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
