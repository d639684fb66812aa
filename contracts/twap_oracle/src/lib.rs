pub mod contract;
pub mod error;
pub mod hooks;
pub mod logic;
pub mod pruning;
pub mod query;
pub mod state;
pub mod strategy;

pub use crate::error::ContractError;
