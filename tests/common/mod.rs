//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, Log, TxHash, U256};
use alloy::sol_types::{SolEvent, SolInterface, SolValue};
use async_trait::async_trait;
use tokio::net::TcpListener;

use token_wallet::config::{RetryConfig, WalletConfig};
use token_wallet::history::SledStore;
use token_wallet::ledger::{
    CallRequest, LedgerClient, LedgerError, LedgerReceipt, LedgerResult, PreparedTransaction,
    PrivacyGroup,
};
use token_wallet::orchestrator::{OrchestratorSettings, TransactionOrchestrator};
use token_wallet::token::abi::IHumanStandardToken::{self, IHumanStandardTokenCalls};
use token_wallet::token::ContractEncoder;
use token_wallet::{HttpServer, Shutdown};

/// Node account that signs everything.
pub const SENDER: &str = "0xed9d02e382b34818e88b88a309c7fe71e65f419d";
/// Second account, used as spender.
pub const OTHER_ACCOUNT: &str = "ca843569e3427144cead5e4d5999a3d0ccf92b8e";
/// Transaction manager public key of the second node.
pub const PRIVATE_FOR: &str = "QfeDAys9MPDs2XHExtc84jKGHxZg/aj52DTh0vtA3Xc=";
/// Stand-in creation code; the simulator recognises it as the token.
pub const TOKEN_BYTECODE: [u8; 5] = [0x60, 0x80, 0x60, 0x40, 0x52];

pub fn sender() -> Address {
    SENDER.parse().unwrap()
}

pub fn other_account() -> Address {
    OTHER_ACCOUNT.parse().unwrap()
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub to: Option<Address>,
    pub privacy: Option<PrivacyGroup>,
}

#[derive(Debug, Default)]
struct TokenContract {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

#[derive(Debug, Default)]
struct Chain {
    block: u64,
    nonce: u64,
    contracts: HashMap<Address, TokenContract>,
    receipts: HashMap<TxHash, LedgerReceipt>,
}

/// In-process ledger executing HumanStandardToken semantics.
#[derive(Default)]
pub struct SimulatedLedger {
    chain: Mutex<Chain>,
    submissions: Mutex<Vec<Submission>>,
    never_confirm: AtomicBool,
    submit_delay_ms: AtomicU64,
}

impl SimulatedLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Accept submissions but never include them.
    pub fn set_never_confirm(&self, value: bool) {
        self.never_confirm.store(value, Ordering::SeqCst);
    }

    /// Hold every submission for `delay` before accepting it.
    pub fn set_submit_delay(&self, delay: Duration) {
        self.submit_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    fn execute(chain: &mut Chain, tx: &PreparedTransaction, tx_hash: TxHash, nonce: u64) -> LedgerReceipt {
        chain.block += 1;
        let mut receipt = LedgerReceipt {
            tx_hash,
            block_number: Some(chain.block),
            success: false,
            contract_address: None,
            logs: Vec::new(),
        };

        match tx.to {
            None => {
                let Some(args) = tx.input.strip_prefix(TOKEN_BYTECODE.as_slice()) else {
                    return receipt;
                };
                let Ok((initial, name, decimals, symbol)) =
                    <(U256, String, U256, String)>::abi_decode_params(args)
                else {
                    return receipt;
                };
                let Ok(decimals) = u8::try_from(decimals) else {
                    return receipt;
                };
                let address = tx.from.create(nonce);
                let mut contract = TokenContract {
                    name,
                    symbol,
                    decimals,
                    total_supply: initial,
                    ..TokenContract::default()
                };
                contract.balances.insert(tx.from, initial);
                chain.contracts.insert(address, contract);
                receipt.success = true;
                receipt.contract_address = Some(address);
            }
            Some(to) => {
                let Some(contract) = chain.contracts.get_mut(&to) else {
                    return receipt;
                };
                match IHumanStandardTokenCalls::abi_decode(&tx.input) {
                    Ok(IHumanStandardTokenCalls::approve(call)) => {
                        contract.allowances.insert((tx.from, call.spender), call.value);
                        receipt.logs.push(Log {
                            address: to,
                            data: IHumanStandardToken::Approval {
                                owner: tx.from,
                                spender: call.spender,
                                value: call.value,
                            }
                            .encode_log_data(),
                        });
                        receipt.success = true;
                    }
                    Ok(IHumanStandardTokenCalls::transfer(call)) => {
                        let balance = contract.balances.get(&tx.from).copied().unwrap_or_default();
                        if balance >= call.value {
                            contract.balances.insert(tx.from, balance - call.value);
                            *contract.balances.entry(call.to).or_default() += call.value;
                            receipt.logs.push(Log {
                                address: to,
                                data: IHumanStandardToken::Transfer {
                                    from: tx.from,
                                    to: call.to,
                                    value: call.value,
                                }
                                .encode_log_data(),
                            });
                            receipt.success = true;
                        }
                    }
                    _ => {}
                }
            }
        }
        receipt
    }
}

#[async_trait]
impl LedgerClient for SimulatedLedger {
    async fn submit(
        &self,
        tx: PreparedTransaction,
        privacy: Option<&PrivacyGroup>,
    ) -> LedgerResult<TxHash> {
        let delay = self.submit_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.submissions.lock().unwrap().push(Submission {
            to: tx.to,
            privacy: privacy.cloned(),
        });

        let mut chain = self.chain.lock().unwrap();
        let nonce = chain.nonce;
        chain.nonce += 1;
        let mut preimage = nonce.to_be_bytes().to_vec();
        preimage.extend_from_slice(&tx.input);
        let tx_hash = keccak256(&preimage);

        if !self.never_confirm.load(Ordering::SeqCst) {
            let receipt = Self::execute(&mut chain, &tx, tx_hash, nonce);
            chain.receipts.insert(tx_hash, receipt);
        }
        Ok(tx_hash)
    }

    async fn await_receipt(&self, tx_hash: TxHash, timeout: Duration) -> LedgerResult<LedgerReceipt> {
        let found = self.chain.lock().unwrap().receipts.get(&tx_hash).cloned();
        match found {
            Some(receipt) => Ok(receipt),
            None => {
                tokio::time::sleep(timeout).await;
                Err(LedgerError::ConfirmationTimeout {
                    tx_hash,
                    waited_secs: timeout.as_secs(),
                })
            }
        }
    }

    async fn call(&self, request: CallRequest) -> LedgerResult<Bytes> {
        let chain = self.chain.lock().unwrap();
        let Some(contract) = chain.contracts.get(&request.to) else {
            // Calling an account without code returns nothing.
            return Ok(Bytes::new());
        };

        let output = match IHumanStandardTokenCalls::abi_decode(&request.input) {
            Ok(IHumanStandardTokenCalls::name(_)) => (contract.name.clone(),).abi_encode_params(),
            Ok(IHumanStandardTokenCalls::symbol(_)) => (contract.symbol.clone(),).abi_encode_params(),
            Ok(IHumanStandardTokenCalls::version(_)) => ("H0.1".to_string(),).abi_encode_params(),
            Ok(IHumanStandardTokenCalls::decimals(_)) => (U256::from(contract.decimals),).abi_encode_params(),
            Ok(IHumanStandardTokenCalls::totalSupply(_)) => (contract.total_supply,).abi_encode_params(),
            Ok(IHumanStandardTokenCalls::balanceOf(call)) => {
                (contract.balances.get(&call.owner).copied().unwrap_or_default(),).abi_encode_params()
            }
            Ok(IHumanStandardTokenCalls::allowance(call)) => (contract
                .allowances
                .get(&(call.owner, call.spender))
                .copied()
                .unwrap_or_default(),)
                .abi_encode_params(),
            _ => return Err(LedgerError::CallFailed("execution reverted".to_string())),
        };
        Ok(Bytes::from(output))
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Config tuned for fast tests.
pub fn test_config() -> WalletConfig {
    let mut config = WalletConfig::default();
    config.node.from_address = SENDER.to_string();
    config.node.confirmation_timeout_secs = 5;
    config.timeouts.request_secs = 30;
    config.retries = RetryConfig {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 10,
    };
    config.history.db_path = None;
    config
}

/// Fresh throwaway history database.
pub fn history() -> Arc<SledStore> {
    Arc::new(SledStore::temporary().unwrap())
}

pub fn orchestrator(
    config: &WalletConfig,
    ledger: Arc<SimulatedLedger>,
    history: Arc<SledStore>,
) -> Arc<TransactionOrchestrator> {
    let settings = OrchestratorSettings::from_config(&config.node, &config.retries).unwrap();
    Arc::new(TransactionOrchestrator::new(
        ledger,
        ContractEncoder::new(Some(Bytes::from(TOKEN_BYTECODE.to_vec()))),
        history,
        settings,
    ))
}

/// Serve the wallet on an ephemeral port. Keep the `Shutdown` alive for the test.
pub async fn start_server(
    config: &WalletConfig,
    orchestrator: Arc<TransactionOrchestrator>,
) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, orchestrator);
    tokio::spawn(server.run(listener, shutdown.subscribe()));
    (format!("http://{}", addr), shutdown)
}
