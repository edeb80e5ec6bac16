use serde::{Deserialize, Serialize};

/// One anchoring transaction as observed on the ledger.
///
/// `transaction_number` is the ledger's total order; `transaction_time` is the
/// block height (or equivalent) and `transaction_time_hash` the block hash at
/// that height, used for fork detection. `anchor_string` decodes to
/// `<number_of_operations>.<anchor_file_uri>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionModel {
    pub transaction_number: u64,
    pub transaction_time: u64,
    pub transaction_time_hash: String,
    pub anchor_string: String,
    /// Fee the writer paid, in the ledger's smallest unit.
    pub transaction_fee_paid: u64,
    /// Per-operation normalized fee at `transaction_time`, when the ledger
    /// client computed one.
    pub normalized_transaction_fee: Option<u64>,
    /// Ledger identity of the writer (used for value-time-lock ownership).
    pub writer: String,
}
