//! External collaborator interfaces.
//!
//! The core never talks to MongoDB, IPFS, or a ledger node directly; it
//! consumes these traits. `kedge-store` ships sled and in-memory stores;
//! embedders supply the CAS and ledger clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ProtocolError;
use crate::operation::AnchoredOperationModel;
use crate::transaction::TransactionModel;
use crate::types::DidSuffix;

// ── Infrastructure errors ────────────────────────────────────────────────────

/// Store backend failure. Always treated as transient by the transaction
/// processor (retry), never as a protocol violation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Ledger client failure.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger not reachable: {0}")]
    NotReachable(String),

    #[error("invalid ledger request: {0}")]
    Request(String),
}

// ── CAS ──────────────────────────────────────────────────────────────────────

/// Outcome classification of a CAS read. Network layer errors are encoded
/// here rather than thrown so the caller can apply the retry taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchResultCode {
    Success,
    /// The address is not a valid content hash.
    InvalidHash,
    /// Content exists but exceeds the caller's size cap.
    MaxSizeExceeded,
    /// The address resolves to a directory or other non-file object.
    NotAFile,
    /// Content not (yet) present in the store.
    NotFound,
    /// The CAS client itself is unreachable.
    CasNotReachable,
}

/// Result of a CAS read: `content` is set iff `code == Success`.
#[derive(Clone, Debug)]
pub struct FetchResult {
    pub code: FetchResultCode,
    pub content: Option<Vec<u8>>,
}

impl FetchResult {
    pub fn success(content: Vec<u8>) -> Self {
        Self { code: FetchResultCode::Success, content: Some(content) }
    }

    pub fn of(code: FetchResultCode) -> Self {
        Self { code, content: None }
    }
}

/// Content-addressed store client.
#[async_trait]
pub trait Cas: Send + Sync {
    /// Fetch the content at `address`, refusing anything over
    /// `max_size_bytes`. Never fails; failures are `FetchResultCode`s.
    async fn read(&self, address: &str, max_size_bytes: usize) -> FetchResult;
}

// ── Operation store ──────────────────────────────────────────────────────────

/// Append-only store of anchored operations keyed by DID suffix.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Persist a batch. Must be idempotent on
    /// `(did_suffix, transaction_number, operation_index)`.
    async fn put(&self, operations: &[AnchoredOperationModel]) -> Result<(), StoreError>;

    /// All operations ever anchored for `did_suffix`, in no particular order.
    async fn get(&self, did_suffix: &DidSuffix)
        -> Result<Vec<AnchoredOperationModel>, StoreError>;

    /// Drop every stored operation.
    async fn delete(&self) -> Result<(), StoreError>;

    /// Flush and release the backing resources. Further calls may fail.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ── Transaction store ────────────────────────────────────────────────────────

/// Store of ledger transactions already seen by the observer.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn add_transaction(&self, transaction: TransactionModel) -> Result<(), StoreError>;

    async fn get_transaction(
        &self,
        transaction_number: u64,
    ) -> Result<Option<TransactionModel>, StoreError>;

    async fn get_last_transaction(&self) -> Result<Option<TransactionModel>, StoreError>;

    /// Transactions strictly after `since_transaction_number` (all of them
    /// when `None`), capped at `max_count` when given.
    async fn get_transactions_later_than(
        &self,
        since_transaction_number: Option<u64>,
        max_count: Option<usize>,
    ) -> Result<Vec<TransactionModel>, StoreError>;

    async fn get_transactions_starting_from(
        &self,
        begin_inclusive: u64,
        end_exclusive: u64,
    ) -> Result<Vec<TransactionModel>, StoreError>;

    /// Transactions at offsets 0, 1, 2, 4, 8, … back from the newest, plus
    /// the oldest, newest first. The observer walks this list to find the
    /// fork point after a reorg without scanning the full history.
    async fn get_exponentially_spaced_transactions(
        &self,
    ) -> Result<Vec<TransactionModel>, StoreError>;

    /// Drop transactions strictly after `transaction_number` (all of them
    /// when `None`). Used when rolling back past a fork point.
    async fn remove_transactions_later_than(
        &self,
        transaction_number: Option<u64>,
    ) -> Result<(), StoreError>;
}

// ── Ledger ───────────────────────────────────────────────────────────────────

/// Approximate ledger clock: a height and the block hash at that height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerTimeModel {
    pub time: u64,
    pub hash: String,
}

/// Page of transactions returned by `Ledger::read`.
#[derive(Clone, Debug)]
pub struct LedgerReadResult {
    pub more_transactions: bool,
    pub transactions: Vec<TransactionModel>,
}

/// A value-time-lock observed on the ledger: collateral that entitles its
/// owner to a larger operation batch for the lock's duration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueTimeLockModel {
    pub identifier: String,
    pub amount_locked: u64,
    pub lock_transaction_time: u64,
    pub unlock_transaction_time: u64,
    pub normalized_fee: u64,
    pub owner: String,
}

/// Read/write client for the anchoring ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Read transactions after `since_transaction_number`. When
    /// `transaction_time_hash` no longer matches the chain (reorg), the
    /// implementation returns `LedgerError::Request`.
    async fn read(
        &self,
        since_transaction_number: Option<u64>,
        transaction_time_hash: Option<&str>,
    ) -> Result<LedgerReadResult, LedgerError>;

    /// Publish an anchor string, paying `fee`.
    async fn write(&self, anchor_string: &str, fee: u64) -> Result<(), LedgerError>;

    async fn approximate_time(&self) -> Result<LedgerTimeModel, LedgerError>;

    async fn get_value_time_lock(
        &self,
        identifier: &str,
    ) -> Result<Option<ValueTimeLockModel>, LedgerError>;

    /// Of the given transactions, the first one still on the canonical
    /// chain. Drives fork-point discovery over the exponentially spaced
    /// transaction list.
    async fn get_first_valid_transaction(
        &self,
        transactions: &[TransactionModel],
    ) -> Result<Option<TransactionModel>, LedgerError>;
}

// ── Fees / value time locks ──────────────────────────────────────────────────

/// Fee schedule check for one transaction.
pub trait FeeManager: Send + Sync {
    /// Errors with `TransactionFeeBelowRequired` when `fee_paid` does not
    /// cover `number_of_operations` at `transaction_time`'s rates.
    fn verify(
        &self,
        number_of_operations: u64,
        fee_paid: u64,
        transaction_time: u64,
    ) -> Result<(), ProtocolError>;
}

/// Validates a writer's value-time-lock against the batch it anchored.
pub trait ValueTimeLockVerifier: Send + Sync {
    /// Errors with `ValueTimeLockInvalid` when the lock does not entitle
    /// `writer` to `number_of_operations` at `transaction_time`.
    fn verify(
        &self,
        lock: Option<&ValueTimeLockModel>,
        number_of_operations: u64,
        transaction_time: u64,
        writer: &str,
    ) -> Result<(), ProtocolError>;
}
