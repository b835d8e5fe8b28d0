mod batch_writer;
mod operation_processor;
mod request_handler;
mod transaction_processor;
mod version_metadata;

pub use batch_writer::V1BatchWriterStrategy;
pub use operation_processor::V1OperationProcessor;
pub use request_handler::V1RequestHandler;
pub use transaction_processor::V1TransactionProcessor;
pub use version_metadata::V1VersionMetadata;
