//! kedge-files
//!
//! The three-tier CAS file bundle (anchor → map → chunk) and the on-ledger
//! anchor string. Each tier is a gzip-compressed JSON document; parsing is
//! strict (unknown properties rejected, compression mandatory) and every
//! reject is a typed `ProtocolError`.

pub mod anchor;
pub mod anchor_string;
pub mod chunk;
pub mod compress;
pub mod map;

pub use anchor::{AnchorFileModel, AnchorFileOperations, CreateEntry, SignedOperationEntry};
pub use anchor_string::AnchoredData;
pub use chunk::ChunkFileModel;
pub use map::{ChunkReference, MapFileModel, MapFileOperations};
