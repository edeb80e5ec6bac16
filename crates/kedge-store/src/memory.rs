use async_trait::async_trait;
use kedge_core::{
    AnchoredOperationModel, DidSuffix, OperationStore, StoreError, TransactionModel,
    TransactionStore,
};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Mutex;

use crate::exponentially_spaced_indices;

// ── MemoryOperationStore ─────────────────────────────────────────────────────

/// In-memory operation store. Operations are keyed per DID by
/// `(transaction_number, operation_index)`, which makes `put` naturally
/// idempotent: re-inserting an anchored operation overwrites itself.
#[derive(Default)]
pub struct MemoryOperationStore {
    operations: Mutex<HashMap<DidSuffix, BTreeMap<(u64, u32), AnchoredOperationModel>>>,
}

impl MemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total operations held, across all DIDs.
    pub fn len(&self) -> usize {
        self.operations
            .lock()
            .expect("operation store mutex is never poisoned")
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OperationStore for MemoryOperationStore {
    async fn put(&self, operations: &[AnchoredOperationModel]) -> Result<(), StoreError> {
        let mut map = self
            .operations
            .lock()
            .expect("operation store mutex is never poisoned");
        for operation in operations {
            map.entry(operation.did_suffix.clone()).or_default().insert(
                (operation.transaction_number, operation.operation_index),
                operation.clone(),
            );
        }
        Ok(())
    }

    async fn get(
        &self,
        did_suffix: &DidSuffix,
    ) -> Result<Vec<AnchoredOperationModel>, StoreError> {
        let map = self
            .operations
            .lock()
            .expect("operation store mutex is never poisoned");
        Ok(map
            .get(did_suffix)
            .map(|ops| ops.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        self.operations
            .lock()
            .expect("operation store mutex is never poisoned")
            .clear();
        Ok(())
    }
}

// ── MemoryTransactionStore ───────────────────────────────────────────────────

/// In-memory transaction store ordered by transaction number.
#[derive(Default)]
pub struct MemoryTransactionStore {
    transactions: Mutex<BTreeMap<u64, TransactionModel>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn add_transaction(&self, transaction: TransactionModel) -> Result<(), StoreError> {
        self.transactions
            .lock()
            .expect("transaction store mutex is never poisoned")
            .insert(transaction.transaction_number, transaction);
        Ok(())
    }

    async fn get_transaction(
        &self,
        transaction_number: u64,
    ) -> Result<Option<TransactionModel>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .expect("transaction store mutex is never poisoned")
            .get(&transaction_number)
            .cloned())
    }

    async fn get_last_transaction(&self) -> Result<Option<TransactionModel>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .expect("transaction store mutex is never poisoned")
            .values()
            .next_back()
            .cloned())
    }

    async fn get_transactions_later_than(
        &self,
        since_transaction_number: Option<u64>,
        max_count: Option<usize>,
    ) -> Result<Vec<TransactionModel>, StoreError> {
        let map = self
            .transactions
            .lock()
            .expect("transaction store mutex is never poisoned");
        let lower = match since_transaction_number {
            Some(n) => Bound::Excluded(n),
            None => Bound::Unbounded,
        };
        let iter = map.range((lower, Bound::Unbounded)).map(|(_, tx)| tx.clone());
        Ok(match max_count {
            Some(cap) => iter.take(cap).collect(),
            None => iter.collect(),
        })
    }

    async fn get_transactions_starting_from(
        &self,
        begin_inclusive: u64,
        end_exclusive: u64,
    ) -> Result<Vec<TransactionModel>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .expect("transaction store mutex is never poisoned")
            .range(begin_inclusive..end_exclusive)
            .map(|(_, tx)| tx.clone())
            .collect())
    }

    async fn get_exponentially_spaced_transactions(
        &self,
    ) -> Result<Vec<TransactionModel>, StoreError> {
        let map = self
            .transactions
            .lock()
            .expect("transaction store mutex is never poisoned");
        let ascending: Vec<&TransactionModel> = map.values().collect();
        Ok(exponentially_spaced_indices(ascending.len())
            .into_iter()
            .map(|i| ascending[i].clone())
            .collect())
    }

    async fn remove_transactions_later_than(
        &self,
        transaction_number: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut map = self
            .transactions
            .lock()
            .expect("transaction store mutex is never poisoned");
        match transaction_number {
            Some(n) => {
                // split_off leaves keys <= n in place and returns the tail.
                let removed = map.split_off(&(n + 1));
                drop(removed);
            }
            None => map.clear(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kedge_core::OperationType;

    fn op(did: &str, number: u64, index: u32) -> AnchoredOperationModel {
        AnchoredOperationModel {
            operation_type: OperationType::Create,
            did_suffix: DidSuffix::new(did),
            operation_buffer: br#"{"type":"create"}"#.to_vec(),
            transaction_time: number,
            transaction_number: number,
            operation_index: index,
        }
    }

    fn tx(number: u64) -> TransactionModel {
        TransactionModel {
            transaction_number: number,
            transaction_time: number,
            transaction_time_hash: format!("hash-{number}"),
            anchor_string: format!("1.uri-{number}"),
            transaction_fee_paid: 100,
            normalized_transaction_fee: None,
            writer: "writer".to_string(),
        }
    }

    #[tokio::test]
    async fn put_is_idempotent_on_composite_key() {
        let store = MemoryOperationStore::new();
        store.put(&[op("did-a", 1, 0)]).await.unwrap();
        store.put(&[op("did-a", 1, 0)]).await.unwrap();
        store.put(&[op("did-a", 2, 0)]).await.unwrap();
        assert_eq!(store.get(&DidSuffix::new("did-a")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_drops_everything() {
        let store = MemoryOperationStore::new();
        store.put(&[op("did-a", 1, 0), op("did-b", 1, 1)]).await.unwrap();
        store.delete().await.unwrap();
        assert!(store.get(&DidSuffix::new("did-a")).await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn later_than_and_ranges() {
        let store = MemoryTransactionStore::new();
        for n in 1..=9 {
            store.add_transaction(tx(n)).await.unwrap();
        }
        let later = store.get_transactions_later_than(Some(6), None).await.unwrap();
        assert_eq!(
            later.iter().map(|t| t.transaction_number).collect::<Vec<_>>(),
            vec![7, 8, 9]
        );
        let capped = store.get_transactions_later_than(None, Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);
        let range = store.get_transactions_starting_from(3, 6).await.unwrap();
        assert_eq!(
            range.iter().map(|t| t.transaction_number).collect::<Vec<_>>(),
            vec![3, 4, 5]
        );
    }

    #[tokio::test]
    async fn exponential_spacing_is_newest_first() {
        let store = MemoryTransactionStore::new();
        for n in 0..10 {
            store.add_transaction(tx(n)).await.unwrap();
        }
        let spaced = store.get_exponentially_spaced_transactions().await.unwrap();
        assert_eq!(
            spaced.iter().map(|t| t.transaction_number).collect::<Vec<_>>(),
            vec![9, 8, 7, 5, 1, 0]
        );
    }

    #[tokio::test]
    async fn remove_later_than_keeps_prefix() {
        let store = MemoryTransactionStore::new();
        for n in 1..=5 {
            store.add_transaction(tx(n)).await.unwrap();
        }
        store.remove_transactions_later_than(Some(3)).await.unwrap();
        assert_eq!(
            store
                .get_last_transaction()
                .await
                .unwrap()
                .unwrap()
                .transaction_number,
            3
        );
        store.remove_transactions_later_than(None).await.unwrap();
        assert!(store.get_last_transaction().await.unwrap().is_none());
    }
}
