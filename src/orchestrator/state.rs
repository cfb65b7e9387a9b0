//! Per-request transaction state machine.

use std::fmt;

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::history::TransactionStatus;

/// Where a state-changing request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxState {
    Building,
    Submitted,
    Confirmed,
    Reverted,
    TimedOut,
    Rejected,
}

impl TxState {
    /// Allowed transitions:
    /// `Building → Submitted | Rejected`, `Submitted → Confirmed | Reverted | TimedOut`.
    pub fn can_transition_to(self, next: TxState) -> bool {
        use TxState::*;
        matches!(
            (self, next),
            (Building, Submitted)
                | (Building, Rejected)
                | (Submitted, Confirmed)
                | (Submitted, Reverted)
                | (Submitted, TimedOut)
        )
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TxState::Building | TxState::Submitted)
    }

    /// History status for this state. `Building` and `Rejected` are never stored.
    pub fn persisted_status(self) -> Option<TransactionStatus> {
        match self {
            TxState::Building | TxState::Rejected => None,
            TxState::Submitted => Some(TransactionStatus::Submitted),
            TxState::Confirmed => Some(TransactionStatus::Confirmed),
            TxState::Reverted => Some(TransactionStatus::Failed),
            TxState::TimedOut => Some(TransactionStatus::TimedOut),
        }
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxState::Building => "BUILDING",
            TxState::Submitted => "SUBMITTED",
            TxState::Confirmed => "CONFIRMED",
            TxState::Reverted => "REVERTED",
            TxState::TimedOut => "TIMED_OUT",
            TxState::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transaction state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: TxState,
    pub to: TxState,
}

/// Tracks one logical request through the state machine.
#[derive(Debug)]
pub struct RequestLifecycle {
    operation: &'static str,
    state: TxState,
    tx_id: Option<TxHash>,
}

impl RequestLifecycle {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            state: TxState::Building,
            tx_id: None,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    pub fn tx_id(&self) -> Option<TxHash> {
        self.tx_id
    }

    /// Record the id returned by the ledger and move to `Submitted`.
    pub fn submitted(&mut self, tx_id: TxHash) -> Result<(), InvalidTransition> {
        self.advance(TxState::Submitted)?;
        self.tx_id = Some(tx_id);
        Ok(())
    }

    pub fn advance(&mut self, next: TxState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(
            operation = self.operation,
            tx_id = ?self.tx_id,
            from = %self.state,
            to = %next,
            "Transaction state change"
        );
        self.state = next;
        Ok(())
    }
}
