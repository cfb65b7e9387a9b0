//! Transaction orchestrator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, TxHash, U256};

use crate::config::{NodeConfig, RetryConfig};
use crate::history::{HistoryStore, StatusUpdate, StoreResult, Transaction};
use crate::ledger::{CallRequest, LedgerClient, LedgerError, LedgerReceipt, PreparedTransaction, PrivacyGroup};
use crate::observability::metrics;
use crate::orchestrator::error::{WalletError, WalletResult};
use crate::orchestrator::state::{InvalidTransition, RequestLifecycle, TxState};
use crate::resilience::retry_with_backoff;
use crate::token::{
    ApproveRequest, ContractEncoder, ContractSpecification, DeployReceipt, EncodedOperation,
    ReadField, ReturnDecoder, TokenEvent, TokenOperation, TokenValue, TransferResult,
};

/// Fixed parameters applied to every request.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Node-managed account that signs every transaction.
    pub from_address: Address,
    pub gas_limit: u64,
    pub confirmation_timeout: Duration,
    pub retries: RetryConfig,
}

impl OrchestratorSettings {
    pub fn from_config(node: &NodeConfig, retries: &RetryConfig) -> WalletResult<Self> {
        let from_address = node.from_address.parse::<Address>().map_err(|e| {
            WalletError::Validation(vec![format!("node.from_address: {}", e)])
        })?;
        Ok(Self {
            from_address,
            gas_limit: node.gas_limit,
            confirmation_timeout: Duration::from_secs(node.confirmation_timeout_secs),
            retries: retries.clone(),
        })
    }
}

/// Resolved outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed {
        tx_id: TxHash,
        block_number: Option<u64>,
        contract_address: Option<Address>,
        event: Option<TokenEvent>,
    },
    Reverted {
        tx_id: TxHash,
        block_number: Option<u64>,
    },
    /// No receipt within the deadline. The record stays resolvable.
    TimedOut { tx_id: TxHash, waited: Duration },
}

impl TxOutcome {
    pub fn tx_id(&self) -> TxHash {
        match self {
            TxOutcome::Confirmed { tx_id, .. }
            | TxOutcome::Reverted { tx_id, .. }
            | TxOutcome::TimedOut { tx_id, .. } => *tx_id,
        }
    }

    pub fn state(&self) -> TxState {
        match self {
            TxOutcome::Confirmed { .. } => TxState::Confirmed,
            TxOutcome::Reverted { .. } => TxState::Reverted,
            TxOutcome::TimedOut { .. } => TxState::TimedOut,
        }
    }

    fn into_error(self) -> WalletError {
        match self {
            TxOutcome::Confirmed { tx_id, block_number, .. }
            | TxOutcome::Reverted { tx_id, block_number } => {
                WalletError::Reverted { tx_id, block_number }
            }
            TxOutcome::TimedOut { tx_id, waited } => WalletError::ConfirmationTimeout {
                tx_id,
                waited_secs: waited.as_secs(),
            },
        }
    }
}

/// Turns token requests into ledger transactions and tracks them to a
/// resolved outcome.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct TransactionOrchestrator {
    ledger: Arc<dyn LedgerClient>,
    encoder: ContractEncoder,
    history: Arc<dyn HistoryStore>,
    settings: OrchestratorSettings,
}

impl TransactionOrchestrator {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        encoder: ContractEncoder,
        history: Arc<dyn HistoryStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            ledger,
            encoder,
            history,
            settings,
        }
    }

    /// Deploy a token contract and return its address.
    pub async fn deploy(
        &self,
        spec: ContractSpecification,
        privacy: Option<&PrivacyGroup>,
        timeout: Option<Duration>,
    ) -> WalletResult<DeployReceipt> {
        match self
            .execute(None, TokenOperation::Deploy(spec), privacy, timeout)
            .await?
        {
            TxOutcome::Confirmed {
                tx_id,
                contract_address: Some(contract_address),
                event,
                ..
            } => Ok(DeployReceipt {
                contract_address,
                tx_id,
                event,
            }),
            other => Err(other.into_error()),
        }
    }

    /// Approve `request.spender` on `contract`.
    pub async fn approve(
        &self,
        contract: Address,
        request: ApproveRequest,
        privacy: Option<&PrivacyGroup>,
        timeout: Option<Duration>,
    ) -> WalletResult<TransferResult> {
        match self
            .execute(Some(contract), TokenOperation::Approve(request), privacy, timeout)
            .await?
        {
            TxOutcome::Confirmed {
                tx_id,
                event: Some(event),
                ..
            } => Ok(TransferResult { tx_id, event }),
            other => Err(other.into_error()),
        }
    }

    /// Submit a state-changing operation and wait for it to resolve.
    ///
    /// Only failures before a transaction id exists are `Err`; everything
    /// after submission is reported as a [`TxOutcome`] and persisted.
    pub async fn execute(
        &self,
        contract: Option<Address>,
        operation: TokenOperation,
        privacy: Option<&PrivacyGroup>,
        timeout: Option<Duration>,
    ) -> WalletResult<TxOutcome> {
        let kind = operation.kind();
        let mut lifecycle = RequestLifecycle::new(kind);

        if operation.is_read_only() {
            lifecycle.advance(TxState::Rejected)?;
            return Err(WalletError::Unsupported(format!(
                "{} is read-only and cannot be submitted",
                kind
            )));
        }
        let is_deploy = matches!(operation, TokenOperation::Deploy(_));
        if !is_deploy && contract.is_none() {
            lifecycle.advance(TxState::Rejected)?;
            return Err(WalletError::Validation(vec![
                "contractAddress: required".to_string(),
            ]));
        }

        let encoded = match self.encoder.encode(&operation) {
            Ok(encoded) => encoded,
            Err(e) => {
                lifecycle.advance(TxState::Rejected)?;
                metrics::record_transaction(kind, "rejected");
                return Err(e.into());
            }
        };
        let EncodedOperation { input, decoder } = encoded;

        let tx = PreparedTransaction {
            from: self.settings.from_address,
            to: contract,
            input,
            gas: Some(self.settings.gas_limit),
        };

        let tx_id = match self.ledger.submit(tx, privacy).await {
            Ok(tx_id) => tx_id,
            Err(e) => {
                lifecycle.advance(TxState::Rejected)?;
                metrics::record_transaction(kind, "rejected");
                tracing::error!(operation = kind, error = %e, "Transaction submission failed");
                return Err(e.into());
            }
        };
        lifecycle.submitted(tx_id)?;
        let submitted_at = Instant::now();

        let record = Transaction::submitted(
            tx_id,
            self.settings.from_address,
            contract,
            transaction_value(&operation),
            operation.summary(),
        );
        if let Err(e) = self.with_history(move |history| history.insert(record)).await {
            tracing::error!(tx_id = %tx_id, error = %e, "Failed to record submitted transaction");
            return Err(e);
        }
        tracing::info!(
            operation = kind,
            tx_id = %tx_id,
            private = privacy.is_some(),
            "Transaction submitted"
        );

        let deadline = timeout.unwrap_or(self.settings.confirmation_timeout);
        let outcome = match self.wait_for_receipt(tx_id, deadline).await {
            Ok(receipt) => self.classify_receipt(tx_id, receipt, contract, decoder),
            Err(LedgerError::ConfirmationTimeout { .. }) => TxOutcome::TimedOut {
                tx_id,
                waited: deadline,
            },
            Err(e) => {
                tracing::warn!(
                    tx_id = %tx_id,
                    error = %e,
                    "Receipt lookup failed, outcome unknown"
                );
                TxOutcome::TimedOut {
                    tx_id,
                    waited: submitted_at.elapsed(),
                }
            }
        };

        lifecycle.advance(outcome.state())?;
        self.record_outcome(kind, &outcome, submitted_at).await?;
        Ok(outcome)
    }

    /// Read a zero-argument token field.
    pub async fn read(&self, contract: Address, field: ReadField) -> WalletResult<TokenValue> {
        self.query(contract, TokenOperation::Read(field)).await
    }

    /// Current allowance of `spender` over `owner`'s tokens.
    pub async fn allowance(
        &self,
        contract: Address,
        owner: Address,
        spender: Address,
    ) -> WalletResult<U256> {
        let value = self
            .query(contract, TokenOperation::Allowance { owner, spender })
            .await?;
        value
            .as_integer()
            .ok_or_else(|| WalletError::CallFailed("allowance returned a non-integer".to_string()))
    }

    /// Transactions where `address` is sender or receiver.
    pub async fn history(&self, address: Address) -> WalletResult<Vec<Transaction>> {
        self.with_history(move |history| history.find_by_address(&address)).await
    }

    /// Transactions whose outcome is not yet known.
    pub async fn unresolved(&self) -> WalletResult<Vec<Transaction>> {
        self.with_history(|history| history.find_unresolved()).await
    }

    /// Run a blocking store call off the async workers.
    async fn with_history<T, F>(&self, op: F) -> WalletResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn HistoryStore) -> StoreResult<T> + Send + 'static,
    {
        let history = self.history.clone();
        Ok(tokio::task::spawn_blocking(move || op(history.as_ref())).await??)
    }

    pub async fn ledger_healthy(&self) -> bool {
        self.ledger.is_healthy().await
    }

    async fn query(&self, contract: Address, operation: TokenOperation) -> WalletResult<TokenValue> {
        let method = operation.kind();
        let EncodedOperation { input, decoder } = self.encoder.encode(&operation)?;
        let request = CallRequest {
            from: Some(self.settings.from_address),
            to: contract,
            input,
        };

        let output = retry_with_backoff(&self.settings.retries, method, LedgerError::is_transient, || {
            self.ledger.call(request.clone())
        })
        .await;

        match output {
            Ok(data) => {
                metrics::record_ledger_call(method, "ok");
                Ok(decoder.decode_return(&data)?)
            }
            Err(e) => {
                metrics::record_ledger_call(method, "error");
                tracing::warn!(method = method, contract = %contract, error = %e, "Contract call failed");
                Err(e.into())
            }
        }
    }

    /// A receipt counts as confirmed only if the ledger applied what was asked:
    /// a deploy must yield a contract address, an approval its `Approval` event.
    fn classify_receipt(
        &self,
        tx_id: TxHash,
        receipt: LedgerReceipt,
        contract: Option<Address>,
        decoder: ReturnDecoder,
    ) -> TxOutcome {
        let emitter = receipt.contract_address.or(contract);
        let event = match (receipt.success, emitter) {
            (true, Some(emitter)) => decoder.decode_event(emitter, self.settings.from_address, &receipt.logs),
            _ => None,
        };

        let applied = receipt.success && emitter.is_some() && (event.is_some() || !decoder.expects_event());
        if receipt.success && !applied {
            tracing::warn!(
                tx_id = %tx_id,
                contract = ?emitter,
                "Receipt succeeded without the expected effect, treating as revert"
            );
        }
        if applied {
            TxOutcome::Confirmed {
                tx_id,
                block_number: receipt.block_number,
                contract_address: receipt.contract_address,
                event,
            }
        } else {
            TxOutcome::Reverted {
                tx_id,
                block_number: receipt.block_number,
            }
        }
    }

    /// Poll for the receipt until `deadline`, retrying transient RPC errors.
    async fn wait_for_receipt(&self, tx_id: TxHash, deadline: Duration) -> Result<LedgerReceipt, LedgerError> {
        let started = Instant::now();
        retry_with_backoff(&self.settings.retries, "await_receipt", LedgerError::is_transient, || {
            let remaining = deadline.saturating_sub(started.elapsed());
            self.ledger.await_receipt(tx_id, remaining)
        })
        .await
    }

    async fn record_outcome(&self, kind: &'static str, outcome: &TxOutcome, submitted_at: Instant) -> WalletResult<()> {
        let state = outcome.state();
        let status = state.persisted_status().ok_or(InvalidTransition {
            from: TxState::Submitted,
            to: state,
        })?;
        let update = match outcome {
            TxOutcome::Confirmed {
                tx_id,
                block_number,
                contract_address,
                ..
            } => {
                metrics::record_transaction(kind, "confirmed");
                metrics::record_confirmation_latency(kind, submitted_at);
                tracing::info!(operation = kind, tx_id = %tx_id, block = ?block_number, "Transaction confirmed");
                StatusUpdate {
                    status,
                    block_number: *block_number,
                    to_address: *contract_address,
                }
            }
            TxOutcome::Reverted { tx_id, block_number } => {
                metrics::record_transaction(kind, "reverted");
                tracing::warn!(operation = kind, tx_id = %tx_id, block = ?block_number, "Transaction reverted");
                StatusUpdate {
                    status,
                    block_number: *block_number,
                    to_address: None,
                }
            }
            TxOutcome::TimedOut { tx_id, waited } => {
                metrics::record_transaction(kind, "timed_out");
                tracing::warn!(
                    operation = kind,
                    tx_id = %tx_id,
                    waited_secs = waited.as_secs(),
                    "Transaction not confirmed in time"
                );
                StatusUpdate {
                    status,
                    block_number: None,
                    to_address: None,
                }
            }
        };

        let tx_id = outcome.tx_id();
        self.with_history(move |history| history.resolve(&tx_id, update))
            .await
            .inspect_err(|e| {
                tracing::error!(tx_id = %tx_id, error = %e, "Failed to record transaction outcome");
            })?;
        Ok(())
    }
}

fn transaction_value(operation: &TokenOperation) -> U256 {
    match operation {
        TokenOperation::Deploy(spec) => spec.initial_amount,
        TokenOperation::Approve(req) => req.value,
        TokenOperation::Read(_) | TokenOperation::Allowance { .. } => U256::ZERO,
    }
}
