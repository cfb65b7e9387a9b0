//! Token lifecycle tests against the simulated ledger.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use token_wallet::history::{HistoryStore, SledStore, TransactionStatus};
use token_wallet::ledger::PrivacyGroup;
use token_wallet::orchestrator::WalletError;
use token_wallet::token::{ApproveRequest, ContractSpecification, ReadField, TokenEvent, TokenValue};

mod common;

use common::{other_account, sender, SimulatedLedger, PRIVATE_FOR};

fn quorum_token() -> ContractSpecification {
    ContractSpecification {
        initial_amount: U256::from(1_000_000u64),
        token_name: "Quorum Token".to_string(),
        decimal_units: 6,
        token_symbol: "QT".to_string(),
    }
}

#[tokio::test]
async fn test_token_lifecycle() {
    let config = common::test_config();
    let ledger = SimulatedLedger::new();
    let history = common::history();
    let wallet = common::orchestrator(&config, ledger.clone(), history.clone());
    let privacy = PrivacyGroup::new([PRIVATE_FOR]);

    let deployed = wallet.deploy(quorum_token(), privacy.as_ref(), None).await.unwrap();
    let contract = deployed.contract_address;

    assert_eq!(
        wallet.read(contract, ReadField::Name).await.unwrap(),
        TokenValue::Text("Quorum Token".to_string())
    );
    assert_eq!(
        wallet.read(contract, ReadField::Symbol).await.unwrap(),
        TokenValue::Text("QT".to_string())
    );
    assert_eq!(
        wallet.read(contract, ReadField::Decimals).await.unwrap(),
        TokenValue::Integer(U256::from(6u64))
    );
    assert_eq!(
        wallet.read(contract, ReadField::TotalSupply).await.unwrap(),
        TokenValue::Integer(U256::from(1_000_000u64))
    );
    assert_eq!(
        wallet.read(contract, ReadField::Version).await.unwrap(),
        TokenValue::Text("H0.1".to_string())
    );

    let approval = wallet
        .approve(
            contract,
            ApproveRequest {
                spender: other_account(),
                value: U256::from(10_000u64),
            },
            privacy.as_ref(),
            None,
        )
        .await
        .unwrap();

    let tx_id = approval.tx_id.to_string();
    assert!(tx_id.starts_with("0x"));
    assert_eq!(tx_id.len(), 66);
    assert_eq!(
        approval.event,
        TokenEvent::Approval {
            owner: sender(),
            spender: other_account(),
            value: U256::from(10_000u64),
        }
    );

    let allowance = wallet.allowance(contract, sender(), other_account()).await.unwrap();
    assert_eq!(allowance, U256::from(10_000u64));

    let privacy_seen: Vec<_> = ledger.submissions().into_iter().map(|s| s.privacy).collect();
    assert_eq!(privacy_seen, vec![privacy.clone(), privacy.clone()]);
}

#[tokio::test]
async fn test_second_approve_overwrites_allowance() {
    let config = common::test_config();
    let ledger = SimulatedLedger::new();
    let history = common::history();
    let wallet = common::orchestrator(&config, ledger, history);

    let contract = wallet.deploy(quorum_token(), None, None).await.unwrap().contract_address;
    for value in [10_000u64, 250] {
        wallet
            .approve(
                contract,
                ApproveRequest {
                    spender: other_account(),
                    value: U256::from(value),
                },
                None,
                None,
            )
            .await
            .unwrap();
    }

    let allowance = wallet.allowance(contract, sender(), other_account()).await.unwrap();
    assert_eq!(allowance, U256::from(250u64));
}

#[tokio::test]
async fn test_history_matches_either_side() {
    let config = common::test_config();
    let ledger = SimulatedLedger::new();
    let history = common::history();
    let wallet = common::orchestrator(&config, ledger, history.clone());

    let first = wallet.deploy(quorum_token(), None, None).await.unwrap().contract_address;
    let second = wallet.deploy(quorum_token(), None, None).await.unwrap().contract_address;
    wallet
        .approve(
            first,
            ApproveRequest {
                spender: other_account(),
                value: U256::from(1u64),
            },
            None,
            None,
        )
        .await
        .unwrap();

    // Sender signed all three; each contract is the receiver of its own.
    assert_eq!(wallet.history(sender()).await.unwrap().len(), 3);
    assert_eq!(wallet.history(first).await.unwrap().len(), 2);
    assert_eq!(wallet.history(second).await.unwrap().len(), 1);
    assert!(wallet.history(other_account()).await.unwrap().is_empty());

    let statuses: Vec<_> = history
        .find_by_address(&sender())
        .unwrap()
        .into_iter()
        .map(|tx| tx.status)
        .collect();
    assert!(statuses.iter().all(|s| *s == TransactionStatus::Confirmed));
}

#[tokio::test]
async fn test_reads_are_idempotent_and_unrecorded() {
    let config = common::test_config();
    let ledger = SimulatedLedger::new();
    let history = common::history();
    let wallet = common::orchestrator(&config, ledger.clone(), history.clone());

    let contract = wallet.deploy(quorum_token(), None, None).await.unwrap().contract_address;
    let submitted = ledger.submissions().len();
    let recorded = history.len();

    let first = wallet.read(contract, ReadField::TotalSupply).await.unwrap();
    let second = wallet.read(contract, ReadField::TotalSupply).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(ledger.submissions().len(), submitted);
    assert_eq!(history.len(), recorded);
}

#[tokio::test]
async fn test_approve_on_unknown_contract_reverts() {
    let config = common::test_config();
    let ledger = SimulatedLedger::new();
    let history = common::history();
    let wallet = common::orchestrator(&config, ledger, history.clone());

    let nowhere = Address::repeat_byte(0x77);
    let err = wallet
        .approve(
            nowhere,
            ApproveRequest {
                spender: other_account(),
                value: U256::from(1u64),
            },
            None,
            None,
        )
        .await
        .unwrap_err();

    let WalletError::Reverted { tx_id, .. } = err else {
        panic!("expected revert, got {:?}", err);
    };
    assert_eq!(history.get(&tx_id).unwrap().unwrap().status, TransactionStatus::Failed);
}

#[tokio::test]
async fn test_read_from_account_without_code_fails() {
    let config = common::test_config();
    let wallet = common::orchestrator(&config, SimulatedLedger::new(), common::history());

    let err = wallet.read(Address::repeat_byte(0x77), ReadField::Name).await.unwrap_err();
    assert!(matches!(err, WalletError::CallFailed(_)));
}

#[tokio::test]
async fn test_unconfirmed_transaction_times_out() {
    let config = common::test_config();
    let ledger = SimulatedLedger::new();
    let history = common::history();
    let wallet = common::orchestrator(&config, ledger.clone(), history.clone());

    let contract = wallet.deploy(quorum_token(), None, None).await.unwrap().contract_address;
    ledger.set_never_confirm(true);

    let err = wallet
        .approve(
            contract,
            ApproveRequest {
                spender: other_account(),
                value: U256::from(10_000u64),
            },
            None,
            Some(Duration::from_secs(1)),
        )
        .await
        .unwrap_err();

    let WalletError::ConfirmationTimeout { tx_id, waited_secs } = err else {
        panic!("expected timeout, got {:?}", err);
    };
    assert_eq!(waited_secs, 1);
    assert_eq!(history.get(&tx_id).unwrap().unwrap().status, TransactionStatus::TimedOut);
    let unresolved = wallet.unresolved().await.unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].id, tx_id);
}

#[tokio::test]
async fn test_concurrent_approvals() {
    let config = common::test_config();
    let ledger = SimulatedLedger::new();
    let history = common::history();
    let wallet = common::orchestrator(&config, ledger, history);

    let contract = wallet.deploy(quorum_token(), None, None).await.unwrap().contract_address;

    let handles: Vec<_> = (1..=10u8)
        .map(|i| {
            let wallet = wallet.clone();
            tokio::spawn(async move {
                wallet
                    .approve(
                        contract,
                        ApproveRequest {
                            spender: Address::repeat_byte(i),
                            value: U256::from(i),
                        },
                        None,
                        None,
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(wallet.history(contract).await.unwrap().len(), 11);
    for i in 1..=10u8 {
        let allowance = wallet
            .allowance(contract, sender(), Address::repeat_byte(i))
            .await
            .unwrap();
        assert_eq!(allowance, U256::from(i));
    }
}

#[tokio::test]
async fn test_history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history");
    let config = common::test_config();
    let ledger = SimulatedLedger::new();

    let contract = {
        let history = Arc::new(SledStore::open(&path).unwrap());
        let wallet = common::orchestrator(&config, ledger.clone(), history.clone());
        let contract = wallet.deploy(quorum_token(), None, None).await.unwrap().contract_address;
        wallet
            .approve(
                contract,
                ApproveRequest {
                    spender: other_account(),
                    value: U256::from(5u64),
                },
                None,
                None,
            )
            .await
            .unwrap();
        history.flush().unwrap();
        contract
    };

    let reopened = SledStore::open(&path).unwrap();
    assert_eq!(reopened.find_by_address(&sender()).unwrap().len(), 2);
    assert_eq!(reopened.find_by_address(&contract).unwrap().len(), 2);
    assert!(reopened.find_unresolved().unwrap().is_empty());
}
