//! Per-height admission control (spec §4.7): orders candidate transactions
//! by fee priority, then admits as many as the remaining per-height budgets
//! allow.

use anchor_types::{AnchorString, Transaction};
use anchor_versioning::TransactionSelector;
use tracing::warn;

pub struct PriorityFeeTransactionSelector;

impl TransactionSelector for PriorityFeeTransactionSelector {
    fn select(
        &self,
        candidates: Vec<Transaction>,
        already_persisted_operations: u64,
        already_persisted_transactions: u64,
        max_operations_per_height: u32,
        max_transactions_per_height: u32,
    ) -> Vec<Transaction> {
        let mut candidates = candidates;
        candidates.sort_by(|a, b| b.fee_paid.cmp(&a.fee_paid).then(a.number.cmp(&b.number)));

        let ops_budget = (max_operations_per_height as u64).saturating_sub(already_persisted_operations);
        let tx_budget =
            (max_transactions_per_height as u64).saturating_sub(already_persisted_transactions);

        let mut accepted = Vec::new();
        let mut accumulated_operations: u64 = 0;
        let mut accumulated_transactions: u64 = 0;

        for transaction in candidates {
            let anchor = match AnchorString::parse(&transaction.anchor_string) {
                Ok(anchor) => anchor,
                Err(e) => {
                    warn!(error = %e, number = transaction.number, "skipping transaction with malformed anchor string");
                    continue;
                }
            };

            let prospective_operations = accumulated_operations + anchor.number_of_operations as u64;
            if prospective_operations <= ops_budget && accumulated_transactions < tx_budget {
                accumulated_operations = prospective_operations;
                accumulated_transactions += 1;
                accepted.push(transaction);
            }
        }

        accepted
    }
}
