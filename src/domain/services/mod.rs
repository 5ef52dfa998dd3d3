pub mod aggregates;
pub mod balance;
pub mod currency;
pub mod entry;
pub mod filter;
pub mod grouping;
pub mod members;
pub mod policy;
pub mod settlement;

pub use currency::RateTable;
pub use filter::ExpenseFilter;
pub use policy::{AnomalyAction, SettlementPolicy};
pub use settlement::SettlementEngine;
