//! Out-of-scope external collaborators (spec §6): the ledger RPC client and
//! the content-addressed store client, specified here as trait contracts
//! only, plus in-memory mocks for tests.

pub mod cas_client;
pub mod ledger_client;
pub mod mock;

pub use cas_client::{CasClient, CasError, CasFetchCode, FetchResult};
pub use ledger_client::{LedgerClient, LedgerClientError, ReadResult};
