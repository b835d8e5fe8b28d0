//! Core data model for the DID anchoring service: the entities the
//! observer, resolver and batch writer pass between each other, plus the
//! shared error and configuration types. No I/O lives here.

pub mod anchor_string;
pub mod config;
pub mod did_state;
pub mod error;
pub mod operation;
pub mod operation_queue;
pub mod transaction;

pub use anchor_string::AnchorString;
pub use config::ServiceConfig;
pub use did_state::{DidState, ResolutionResult};
pub use error::{AnchorError, AnchorResult};
pub use operation::{AnchoredOperation, OperationType, QueuedOperation};
pub use operation_queue::OperationQueue;
pub use transaction::{
    split_transaction_number, transaction_number, BlockMetadata, Transaction,
    UnresolvableTransaction, TRANSACTIONS_PER_BLOCK_FACTOR,
};
