pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::{cli::LocalStorage, toml_config::TomlConfig, CliConfig};

pub use core::{pipeline::ReportPipeline, report::ReportEngine};
pub use domain::model::{Expense, Member, MemberBalance, SettlementReport, TripSnapshot};
pub use domain::services::{RateTable, SettlementEngine, SettlementPolicy};
pub use utils::error::{Result, SettleError};
