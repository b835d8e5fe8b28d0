//! In-memory reference implementations of the store contracts, standing in
//! for a real database in tests and the dev binary.

mod block_metadata_store;
mod operation_store;
mod service_state_store;
mod transaction_store;
mod unresolvable_store;

pub use block_metadata_store::InMemoryBlockMetadataStore;
pub use operation_store::InMemoryOperationStore;
pub use service_state_store::InMemoryServiceStateStore;
pub use transaction_store::InMemoryTransactionStore;
pub use unresolvable_store::InMemoryUnresolvableTransactionStore;
