use cosmwasm_std::{OverflowError, StdError, Timestamp};
use thiserror::Error;
use twap::ValidationError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Start time {start_time} is after end time {end_time}")]
    StartTimeAfterEndTime {
        start_time: Timestamp,
        end_time: Timestamp,
    },

    #[error("End time {end_time} is in the future, current block time is {block_time}")]
    EndTimeInFuture {
        end_time: Timestamp,
        block_time: Timestamp,
    },

    #[error("Looking for a time that is too old, not in the historical index. (requested time {time})")]
    TimeTooOld { time: Timestamp },

    #[error("No twap record for pool {pool_id} and pair ({asset0_denom}, {asset1_denom}). Check that the pool holds both assets")]
    NoRecordForPair {
        pool_id: u64,
        asset0_denom: String,
        asset1_denom: String,
    },

    #[error("Impossible contract state: record for pool {found_pool_id} ({found_asset0_denom}, {found_asset1_denom}) returned for pool {pool_id} ({asset0_denom}, {asset1_denom})")]
    RecordMismatch {
        pool_id: u64,
        asset0_denom: String,
        asset1_denom: String,
        found_pool_id: u64,
        found_asset0_denom: String,
        found_asset1_denom: String,
    },

    #[error("Pool {pool_id} has {actual} twap records, expected {expected}")]
    InvalidRecordCount {
        pool_id: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot update record of pool {pool_id} written at height {record_height} ({record_time}) in block {block_height} ({block_time})")]
    InvalidUpdateRecord {
        pool_id: u64,
        record_height: u64,
        record_time: Timestamp,
        block_height: u64,
        block_time: Timestamp,
    },
}

impl From<OverflowError> for ContractError {
    fn from(o: OverflowError) -> Self {
        StdError::from(o).into()
    }
}
