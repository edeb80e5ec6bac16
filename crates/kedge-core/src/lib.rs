pub mod document;
pub mod error;
pub mod interfaces;
pub mod jwk;
pub mod operation;
pub mod protocol;
pub mod transaction;
pub mod types;

pub use document::{DocumentModel, Patch, PublicKeyEntry, ServiceEntry};
pub use error::ProtocolError;
pub use interfaces::{
    Cas, FeeManager, FetchResult, FetchResultCode, Ledger, LedgerError, LedgerReadResult,
    LedgerTimeModel, OperationStore, StoreError, TransactionStore, ValueTimeLockModel,
    ValueTimeLockVerifier,
};
pub use jwk::Jwk;
pub use operation::{AnchoredOperationModel, Delta, DidState, OperationType, SuffixData};
pub use protocol::ProtocolParameters;
pub use transaction::TransactionModel;
pub use types::DidSuffix;
