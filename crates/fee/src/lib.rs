//! Fee-related ambient budgets (spec §4.5, §4.6): the moving-average
//! normalized fee and the node's self-imposed spending cap.

pub mod normalized_fee;
pub mod spending_monitor;

pub use normalized_fee::NormalizedFeeCalculator;
pub use spending_monitor::SpendingMonitor;
