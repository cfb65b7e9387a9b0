//! Scripted ledger double for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Bytes, TxHash};
use async_trait::async_trait;

use crate::ledger::client::LedgerClient;
use crate::ledger::types::{
    CallRequest, LedgerError, LedgerReceipt, LedgerResult, PreparedTransaction, PrivacyGroup,
};

/// Replays queued results in order and records what it was asked to do.
#[derive(Default)]
pub(crate) struct ScriptedLedger {
    submits: Mutex<VecDeque<LedgerResult<TxHash>>>,
    receipts: Mutex<VecDeque<LedgerResult<LedgerReceipt>>>,
    calls: Mutex<VecDeque<LedgerResult<Bytes>>>,
    pub submitted: Mutex<Vec<(PreparedTransaction, Option<PrivacyGroup>)>>,
    pub receipt_waits: Mutex<Vec<Duration>>,
    pub call_count: Mutex<u32>,
}

impl ScriptedLedger {
    pub fn push_submit(&self, result: LedgerResult<TxHash>) {
        self.submits.lock().unwrap().push_back(result);
    }

    pub fn push_receipt(&self, result: LedgerResult<LedgerReceipt>) {
        self.receipts.lock().unwrap().push_back(result);
    }

    pub fn push_call(&self, result: LedgerResult<Bytes>) {
        self.calls.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn submit(
        &self,
        tx: PreparedTransaction,
        privacy: Option<&PrivacyGroup>,
    ) -> LedgerResult<TxHash> {
        self.submitted.lock().unwrap().push((tx, privacy.cloned()));
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LedgerError::Rpc("no scripted submit".into())))
    }

    async fn await_receipt(&self, tx_hash: TxHash, timeout: Duration) -> LedgerResult<LedgerReceipt> {
        self.receipt_waits.lock().unwrap().push(timeout);
        let next = self.receipts.lock().unwrap().pop_front();
        next.unwrap_or(Err(LedgerError::ConfirmationTimeout {
            tx_hash,
            waited_secs: timeout.as_secs(),
        }))
    }

    async fn call(&self, _request: CallRequest) -> LedgerResult<Bytes> {
        *self.call_count.lock().unwrap() += 1;
        self.calls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LedgerError::Rpc("no scripted call".into())))
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
