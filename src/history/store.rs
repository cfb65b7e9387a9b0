//! Transaction history storage.

use std::path::Path;

use alloy::primitives::{Address, TxHash};
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};

use crate::history::types::{
    StatusUpdate, StoreError, StoreResult, Transaction, TransactionStatus,
};

const RECORDS_TREE: &str = "records";
const ADDRESS_INDEX_TREE: &str = "by_address";
const ADDRESS_LEN: usize = 20;
const HASH_LEN: usize = 32;

/// Persistent record of submitted transactions, queried by participant.
///
/// Calls block on disk I/O; async callers go through `spawn_blocking`.
pub trait HistoryStore: Send + Sync {
    /// Record a new transaction. Fails if the id is already known.
    fn insert(&self, tx: Transaction) -> StoreResult<()>;

    /// Move a pending record to its resolved status.
    fn resolve(&self, id: &TxHash, update: StatusUpdate) -> StoreResult<Transaction>;

    fn get(&self, id: &TxHash) -> StoreResult<Option<Transaction>>;

    /// All transactions where `address` is sender or receiver, oldest first.
    fn find_by_address(&self, address: &Address) -> StoreResult<Vec<Transaction>>;

    /// Records still `SUBMITTED` or `TIMED_OUT`, oldest first.
    fn find_unresolved(&self) -> StoreResult<Vec<Transaction>>;
}

/// History kept in a sled database.
///
/// `records` maps tx hash to the JSON record. `by_address` holds one empty
/// entry per participant keyed `address ‖ tx hash`, so a prefix scan lists
/// an address's transactions. Both trees change in one sled transaction and
/// every write is flushed before returning.
pub struct SledStore {
    db: Db,
    records: Tree,
    by_address: Tree,
}

impl SledStore {
    /// Open (or create) the database directory at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let store = Self::from_db(sled::open(path)?)?;
        tracing::info!(
            path = %path.display(),
            records = store.len(),
            "Opened transaction history"
        );
        Ok(store)
    }

    /// Database removed when the store is dropped.
    pub fn temporary() -> StoreResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let records = db.open_tree(RECORDS_TREE)?;
        let by_address = db.open_tree(ADDRESS_INDEX_TREE)?;
        Ok(Self {
            db,
            records,
            by_address,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> StoreResult<Transaction> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn index_key(address: &Address, id: &TxHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(ADDRESS_LEN + HASH_LEN);
    key.extend_from_slice(address.as_slice());
    key.extend_from_slice(id.as_slice());
    key
}

fn abort(err: impl Into<StoreError>) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(err.into())
}

fn unwrap_transaction<T>(result: Result<T, TransactionError<StoreError>>) -> StoreResult<T> {
    result.map_err(|e| match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StoreError::Db(e),
    })
}

impl HistoryStore for SledStore {
    fn insert(&self, tx: Transaction) -> StoreResult<()> {
        let id = tx.id;
        let value = serde_json::to_vec(&tx)?;
        let index: Vec<Vec<u8>> = std::iter::once(tx.from_address)
            .chain(tx.to_address)
            .map(|address| index_key(&address, &id))
            .collect();

        unwrap_transaction((&self.records, &self.by_address).transaction(|(records, by_address)| {
            if records.get(id.as_slice())?.is_some() {
                return Err(abort(StoreError::Duplicate(id)));
            }
            records.insert(id.as_slice(), value.clone())?;
            for key in &index {
                by_address.insert(key.as_slice(), Vec::<u8>::new())?;
            }
            Ok(())
        }))?;
        self.db.flush()?;

        tracing::debug!(tx_id = %id, "Recorded transaction");
        Ok(())
    }

    fn resolve(&self, id: &TxHash, update: StatusUpdate) -> StoreResult<Transaction> {
        let id = *id;
        let updated = unwrap_transaction((&self.records, &self.by_address).transaction(
            |(records, by_address)| {
                let current = records
                    .get(id.as_slice())?
                    .ok_or_else(|| abort(StoreError::NotFound(id)))?;
                let mut record: Transaction = serde_json::from_slice(&current).map_err(abort)?;

                if record.status.is_final() || update.status == TransactionStatus::Submitted {
                    return Err(abort(StoreError::Immutable {
                        id,
                        status: record.status,
                    }));
                }

                record.status = update.status;
                if update.block_number.is_some() {
                    record.block_number = update.block_number;
                }
                if let Some(to) = update.to_address {
                    if record.to_address != Some(to) {
                        record.to_address = Some(to);
                        by_address.insert(index_key(&to, &id), Vec::<u8>::new())?;
                    }
                }

                records.insert(id.as_slice(), serde_json::to_vec(&record).map_err(abort)?)?;
                Ok(record)
            },
        ))?;
        self.db.flush()?;

        tracing::debug!(tx_id = %id, status = %updated.status, "Resolved transaction");
        Ok(updated)
    }

    fn get(&self, id: &TxHash) -> StoreResult<Option<Transaction>> {
        self.records
            .get(id.as_slice())?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    fn find_by_address(&self, address: &Address) -> StoreResult<Vec<Transaction>> {
        let mut found = Vec::new();
        for entry in self.by_address.scan_prefix(address.as_slice()) {
            let (key, _) = entry?;
            let Ok(id) = TxHash::try_from(&key[ADDRESS_LEN..]) else {
                tracing::warn!(key_len = key.len(), "Skipping malformed history index key");
                continue;
            };
            if let Some(tx) = self.get(&id)? {
                found.push(tx);
            }
        }
        found.sort_by_key(|tx| tx.created_at);
        Ok(found)
    }

    fn find_unresolved(&self) -> StoreResult<Vec<Transaction>> {
        let mut pending = Vec::new();
        for entry in self.records.iter() {
            let (_, bytes) = entry?;
            let tx = Self::decode(&bytes)?;
            if !tx.status.is_final() {
                pending.push(tx);
            }
        }
        pending.sort_by_key(|tx| tx.created_at);
        Ok(pending)
    }
}
