use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Decimal256, Timestamp};

use crate::error::ValidationError;
use crate::record::TwapRecord;

/// Default epoch after which pruning of old records is started
pub const DEFAULT_PRUNE_EPOCH_IDENTIFIER: &str = "day";
/// Default retention period of historical records: 48 hours
pub const DEFAULT_RECORD_HISTORY_KEEP_PERIOD: u64 = 48 * 60 * 60;

// ----------------x----------------x----------------x----------------x----------------x----------------
// ----------------x----------------x    Config, Params and Pruning state      x----------------x-------
// ----------------x----------------x----------------x----------------x----------------x----------------

/// ## Description
/// Addresses the oracle trusts.
#[cw_serde]
pub struct Config {
    /// Can update the config
    pub owner: Addr,
    /// Contract that implements the pool manager queries and calls the pool hooks
    pub pool_manager: Addr,
}

/// ## Description
/// Module parameters, changeable through governance (sudo).
#[cw_serde]
pub struct Params {
    /// Epoch whose end triggers a new pruning run
    pub prune_epoch_identifier: String,
    /// How long historical records are retained, in seconds
    pub record_history_keep_period: u64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            prune_epoch_identifier: DEFAULT_PRUNE_EPOCH_IDENTIFIER.to_string(),
            record_history_keep_period: DEFAULT_RECORD_HISTORY_KEEP_PERIOD,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.prune_epoch_identifier.trim().is_empty() {
            return Err(ValidationError::InvalidParams {
                reason: "prune epoch identifier cannot be empty".to_string(),
            });
        }
        if self.record_history_keep_period == 0 {
            return Err(ValidationError::InvalidParams {
                reason: "record history keep period must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// ## Description
/// Progress of the pruning run in flight. Pruning walks pools downward from
/// `last_seen_pool_id` and is resumed from there in the next block when the
/// per-block budget runs out.
#[cw_serde]
#[derive(Default)]
pub struct PruningState {
    pub is_pruning: bool,
    /// Records strictly older than this time are pruned, except the newest of them
    pub last_kept_time: Timestamp,
    pub last_seen_pool_id: u64,
}

// ----------------x----------------x----------------x----------------x----------------x----------------
// ----------------x----------------x    Instantiate, Execute Msgs and Queries      x----------------x--
// ----------------x----------------x----------------x----------------x----------------x----------------

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: String,
    pub pool_manager: String,
    pub params: Params,
    /// Records to import, e.g. when migrating state from another chain
    pub twaps: Vec<TwapRecord>,
}

/// Pool lifecycle hooks. Only the pool manager may call them.
#[cw_serde]
pub enum ExecuteMsg {
    AfterPoolCreated { pool_id: u64 },
    AfterSwap { pool_id: u64 },
    AfterJoinPool { pool_id: u64 },
    AfterExitPool { pool_id: u64 },
    UpdateConfig {
        owner: Option<String>,
        pool_manager: Option<String>,
    },
}

/// Messages the chain itself sends to the oracle.
#[cw_serde]
pub enum SudoMsg {
    /// Sent at the end of every block
    EndBlock {},
    /// Sent at the end of every epoch
    AfterEpochEnd { epoch_identifier: String },
    UpdateParams { params: Params },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(TwapResponse)]
    ArithmeticTwap {
        pool_id: u64,
        base_asset: String,
        quote_asset: String,
        start_time: Timestamp,
        end_time: Timestamp,
    },
    #[returns(TwapResponse)]
    ArithmeticTwapToNow {
        pool_id: u64,
        base_asset: String,
        quote_asset: String,
        start_time: Timestamp,
    },
    #[returns(TwapResponse)]
    GeometricTwap {
        pool_id: u64,
        base_asset: String,
        quote_asset: String,
        start_time: Timestamp,
        end_time: Timestamp,
    },
    #[returns(TwapResponse)]
    GeometricTwapToNow {
        pool_id: u64,
        base_asset: String,
        quote_asset: String,
        start_time: Timestamp,
    },
    #[returns(Config)]
    Config {},
    #[returns(Params)]
    Params {},
    #[returns(PruningState)]
    PruningState {},
    /// Most recent record of the pair, interpolated to the current block time
    #[returns(TwapRecord)]
    MostRecentRecord {
        pool_id: u64,
        asset_a: String,
        asset_b: String,
    },
    /// Most recent records of every pair in the pool, as stored
    #[returns(Vec<TwapRecord>)]
    AllMostRecentRecords { pool_id: u64 },
    /// Newest historical record at or before `time`, as stored
    #[returns(TwapRecord)]
    RecordAtOrBeforeTime {
        pool_id: u64,
        asset_a: String,
        asset_b: String,
        time: Timestamp,
    },
}

/// We currently take no arguments for migrations.
#[cw_serde]
pub struct MigrateMsg {}

// ----------------x----------------x----------------x----------------x----------------x----------------
// ----------------x----------------x    Response Types      x----------------x----------------x--------
// ----------------x----------------x----------------x----------------x----------------x----------------

/// ## Description
/// A time weighted average price.
#[cw_serde]
pub struct TwapResponse {
    pub twap: Decimal256,
    /// Set when a spot price could not be sampled somewhere inside the queried window,
    /// so `twap` may have been computed over sentinel prices.
    pub is_unstable: bool,
}
