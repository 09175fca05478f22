//! Purse module - debit, credit and reconciliation of bidder budgets.

mod ledger;

pub use ledger::{PurseAdjustment, PurseLedger};
