//! kedge-ops
//!
//! Structural parsing and validation of the four operation kinds. The parser
//! verifies envelope shape, field encodings, the reveal-value/key binding,
//! and JWS signatures as pure functions of the payload; whether the revealed
//! key satisfies the DID's current commitment is the processor's concern
//! (kedge-resolver).

pub mod create;
pub mod deactivate;
pub mod delta;
pub mod document;
pub mod parser;
pub mod recover;
pub mod update;

pub use create::CreateOperation;
pub use deactivate::{DeactivateOperation, DeactivateSignedData};
pub use delta::ParsedDelta;
pub use parser::{Operation, OperationParser};
pub use recover::{RecoverOperation, RecoverSignedData};
pub use update::{UpdateOperation, UpdateSignedData};
