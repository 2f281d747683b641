//! Ledger Store
//! Mission: Persist financial movements and answer aggregate queries

mod error;
pub mod seed;
mod store;

pub use error::LedgerError;
pub use store::{CounterpartyTotals, LedgerRead, LedgerStore};
