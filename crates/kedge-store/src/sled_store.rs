use async_trait::async_trait;
use kedge_core::{
    AnchoredOperationModel, DidSuffix, OperationStore, StoreError, TransactionModel,
    TransactionStore,
};
use std::ops::Bound;
use std::path::Path;

use crate::exponentially_spaced_indices;

fn backend(e: sled::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn serialization(e: bincode::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

// ── SledOperationStore ───────────────────────────────────────────────────────

/// Sled-backed operation store (pure-Rust, no C dependencies).
///
/// One tree, `operations`, keyed
/// `did_suffix ‖ 0x00 ‖ be(transaction_number) ‖ be(operation_index)` with
/// bincode values. The DID suffix is base64url so 0x00 can never occur
/// inside it; the separator makes prefix scans exact and the composite key
/// makes `put` idempotent.
pub struct SledOperationStore {
    _db: sled::Db,
    operations: sled::Tree,
}

impl SledOperationStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(backend)?;
        let operations = db.open_tree("operations").map_err(backend)?;
        Ok(Self { _db: db, operations })
    }

    fn key(operation: &AnchoredOperationModel) -> Vec<u8> {
        let mut key = Self::prefix(&operation.did_suffix);
        key.extend_from_slice(&operation.transaction_number.to_be_bytes());
        key.extend_from_slice(&operation.operation_index.to_be_bytes());
        key
    }

    fn prefix(did_suffix: &DidSuffix) -> Vec<u8> {
        let mut prefix = did_suffix.as_str().as_bytes().to_vec();
        prefix.push(0);
        prefix
    }
}

#[async_trait]
impl OperationStore for SledOperationStore {
    async fn put(&self, operations: &[AnchoredOperationModel]) -> Result<(), StoreError> {
        for operation in operations {
            let value = bincode::serialize(operation).map_err(serialization)?;
            self.operations
                .insert(Self::key(operation), value)
                .map_err(backend)?;
        }
        self.operations.flush().map_err(backend)?;
        Ok(())
    }

    async fn get(
        &self,
        did_suffix: &DidSuffix,
    ) -> Result<Vec<AnchoredOperationModel>, StoreError> {
        let mut result = Vec::new();
        for item in self.operations.scan_prefix(Self::prefix(did_suffix)) {
            let (_, bytes) = item.map_err(backend)?;
            result.push(bincode::deserialize(&bytes).map_err(serialization)?);
        }
        Ok(result)
    }

    async fn delete(&self) -> Result<(), StoreError> {
        self.operations.clear().map_err(backend)?;
        self.operations.flush().map_err(backend)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self._db.flush().map_err(backend)?;
        Ok(())
    }
}

// ── SledTransactionStore ─────────────────────────────────────────────────────

/// Sled-backed transaction store: tree `transactions`, key
/// `be(transaction_number)`, bincode values.
pub struct SledTransactionStore {
    _db: sled::Db,
    transactions: sled::Tree,
}

impl SledTransactionStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(backend)?;
        let transactions = db.open_tree("transactions").map_err(backend)?;
        Ok(Self { _db: db, transactions })
    }

    fn all_ascending(&self) -> Result<Vec<TransactionModel>, StoreError> {
        let mut result = Vec::new();
        for item in self.transactions.iter() {
            let (_, bytes) = item.map_err(backend)?;
            result.push(bincode::deserialize(&bytes).map_err(serialization)?);
        }
        Ok(result)
    }
}

#[async_trait]
impl TransactionStore for SledTransactionStore {
    async fn add_transaction(&self, transaction: TransactionModel) -> Result<(), StoreError> {
        let value = bincode::serialize(&transaction).map_err(serialization)?;
        self.transactions
            .insert(transaction.transaction_number.to_be_bytes(), value)
            .map_err(backend)?;
        self.transactions.flush().map_err(backend)?;
        Ok(())
    }

    async fn get_transaction(
        &self,
        transaction_number: u64,
    ) -> Result<Option<TransactionModel>, StoreError> {
        match self
            .transactions
            .get(transaction_number.to_be_bytes())
            .map_err(backend)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialization)?)),
            None => Ok(None),
        }
    }

    async fn get_last_transaction(&self) -> Result<Option<TransactionModel>, StoreError> {
        match self.transactions.last().map_err(backend)? {
            Some((_, bytes)) => Ok(Some(bincode::deserialize(&bytes).map_err(serialization)?)),
            None => Ok(None),
        }
    }

    async fn get_transactions_later_than(
        &self,
        since_transaction_number: Option<u64>,
        max_count: Option<usize>,
    ) -> Result<Vec<TransactionModel>, StoreError> {
        let lower = match since_transaction_number {
            Some(n) => Bound::Excluded(n.to_be_bytes().to_vec()),
            None => Bound::Unbounded,
        };
        let mut result = Vec::new();
        for item in self.transactions.range((lower, Bound::Unbounded)) {
            if let Some(cap) = max_count {
                if result.len() >= cap {
                    break;
                }
            }
            let (_, bytes) = item.map_err(backend)?;
            result.push(bincode::deserialize(&bytes).map_err(serialization)?);
        }
        Ok(result)
    }

    async fn get_transactions_starting_from(
        &self,
        begin_inclusive: u64,
        end_exclusive: u64,
    ) -> Result<Vec<TransactionModel>, StoreError> {
        let mut result = Vec::new();
        let range = begin_inclusive.to_be_bytes().to_vec()..end_exclusive.to_be_bytes().to_vec();
        for item in self.transactions.range(range) {
            let (_, bytes) = item.map_err(backend)?;
            result.push(bincode::deserialize(&bytes).map_err(serialization)?);
        }
        Ok(result)
    }

    async fn get_exponentially_spaced_transactions(
        &self,
    ) -> Result<Vec<TransactionModel>, StoreError> {
        let ascending = self.all_ascending()?;
        Ok(exponentially_spaced_indices(ascending.len())
            .into_iter()
            .map(|i| ascending[i].clone())
            .collect())
    }

    async fn remove_transactions_later_than(
        &self,
        transaction_number: Option<u64>,
    ) -> Result<(), StoreError> {
        let lower = match transaction_number {
            Some(n) => Bound::Excluded(n.to_be_bytes().to_vec()),
            None => Bound::Unbounded,
        };
        let keys: Vec<sled::IVec> = self
            .transactions
            .range((lower, Bound::Unbounded))
            .keys()
            .collect::<Result<_, _>>()
            .map_err(backend)?;
        for key in keys {
            self.transactions.remove(key).map_err(backend)?;
        }
        self.transactions.flush().map_err(backend)?;
        Ok(())
    }
}
