//! The versioning dispatcher (spec §4.4): routes every operation and
//! transaction to the protocol implementation valid at its anchoring
//! height, via a static per-version registry rather than dynamic module
//! loading.

pub mod dispatcher;
pub mod traits;

pub use dispatcher::VersioningDispatcher;
pub use traits::{
    BatchWriterStrategy, OperationProcessor, RequestHandler, TransactionProcessor,
    TransactionSelector, VersionImplementations, VersionMetadata, VersionMetadataFetcher,
};
