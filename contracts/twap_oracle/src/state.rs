use cosmwasm_std::{Empty, Order, StdResult, Storage, Timestamp};
use cw_storage_plus::{Bound, Item, Map, PrimaryKey};
use twap::oracle::{Config, Params, PruningState};
use twap::{lexicographical_order_denoms, TwapRecord};

use crate::error::ContractError;

/// Stores the contract configuration at the given key
pub const CONFIG: Item<Config> = Item::new("config");

/// Module parameters
pub const PARAMS: Item<Params> = Item::new("params");

/// Progress of the pruning run in flight, if any
pub const PRUNING_STATE: Item<PruningState> = Item::new("pruning_state");

/// Most recent record per (pool id, asset0 denom, asset1 denom). Overwritten on every refresh.
pub const MOST_RECENT_RECORDS: Map<(u64, &str, &str), TwapRecord> = Map::new("most_recent_twap");

/// Every record ever written, keyed by (series key, time in nanoseconds). The series key is the
/// joined key of (pool id, asset0 denom, asset1 denom) so each series is a contiguous, time
/// ordered range.
pub const HISTORICAL_RECORDS: Map<(&[u8], u64), TwapRecord> = Map::new("historical_twap");

/// Pools whose price may have changed in the current block
pub const CHANGED_POOLS: ChangedPools = ChangedPools::new("changed_pools");

// ----------------x----------------x----------------x----------------
// ----------------x      Changed pools of the current block     x-----
// ----------------x----------------x----------------x----------------

/// ## Description
/// Set of pool ids touched during the current block.
/// Filled by the pool hooks and drained exactly once, by end block.
pub struct ChangedPools<'a>(Map<'a, u64, Empty>);

impl<'a> ChangedPools<'a> {
    pub const fn new(namespace: &'a str) -> Self {
        ChangedPools(Map::new(namespace))
    }

    pub fn track(&self, storage: &mut dyn Storage, pool_id: u64) -> StdResult<()> {
        self.0.save(storage, pool_id, &Empty {})
    }

    /// Pool ids tracked so far, in ascending order.
    pub fn pool_ids(&self, storage: &dyn Storage) -> StdResult<Vec<u64>> {
        self.0
            .keys(storage, None, None, Order::Ascending)
            .collect()
    }

    /// Returns the tracked pool ids and clears the set.
    pub fn drain(&self, storage: &mut dyn Storage) -> StdResult<Vec<u64>> {
        let pool_ids = self.pool_ids(storage)?;
        for pool_id in pool_ids.iter() {
            self.0.remove(storage, *pool_id);
        }
        Ok(pool_ids)
    }
}

// ----------------x----------------x----------------x----------------
// ----------------x      Twap records : store and getter fns     x----
// ----------------x----------------x----------------x----------------

/// Key prefix of one historical series.
pub fn series_key(pool_id: u64, asset0_denom: &str, asset1_denom: &str) -> Vec<u8> {
    (pool_id, asset0_denom, asset1_denom).joined_key()
}

/// ## Description
/// Writes a record to both the most recent and the historical index.
pub fn store_new_record(storage: &mut dyn Storage, record: &TwapRecord) -> StdResult<()> {
    MOST_RECENT_RECORDS.save(
        storage,
        (record.pool_id, &record.asset0_denom, &record.asset1_denom),
        record,
    )?;
    store_historical_record(storage, record)
}

pub fn store_historical_record(storage: &mut dyn Storage, record: &TwapRecord) -> StdResult<()> {
    let series = series_key(record.pool_id, &record.asset0_denom, &record.asset1_denom);
    HISTORICAL_RECORDS.save(storage, (series.as_slice(), record.time.nanos()), record)
}

pub fn delete_historical_record(storage: &mut dyn Storage, record: &TwapRecord) {
    let series = series_key(record.pool_id, &record.asset0_denom, &record.asset1_denom);
    HISTORICAL_RECORDS.remove(storage, (series.as_slice(), record.time.nanos()));
}

/// ## Description
/// Returns the most recent record of the pair exactly as stored, i.e. not interpolated
/// to the current block time. The denoms may be given in any order.
pub fn get_most_recent_record_store_representation(
    storage: &dyn Storage,
    pool_id: u64,
    asset_a: &str,
    asset_b: &str,
) -> Result<TwapRecord, ContractError> {
    let (asset0_denom, asset1_denom) = lexicographical_order_denoms(asset_a, asset_b)?;
    MOST_RECENT_RECORDS
        .may_load(storage, (pool_id, asset0_denom, asset1_denom))?
        .ok_or_else(|| ContractError::NoRecordForPair {
            pool_id,
            asset0_denom: asset0_denom.to_string(),
            asset1_denom: asset1_denom.to_string(),
        })
}

/// ## Description
/// Returns the most recent record of every pair of the pool, as stored.
pub fn get_all_most_recent_records_for_pool(
    storage: &dyn Storage,
    pool_id: u64,
) -> StdResult<Vec<TwapRecord>> {
    MOST_RECENT_RECORDS
        .sub_prefix(pool_id)
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, record)| record))
        .collect()
}

/// ## Description
/// Returns the newest historical record of the pair with `time <= t`.
///
/// Fails with [`ContractError::TimeTooOld`] when the pair is tracked but every record at or
/// before `t` has been pruned (or `t` predates the pool), and with
/// [`ContractError::NoRecordForPair`] when the pair was never tracked at all.
pub fn get_record_at_or_before_time(
    storage: &dyn Storage,
    pool_id: u64,
    t: Timestamp,
    asset_a: &str,
    asset_b: &str,
) -> Result<TwapRecord, ContractError> {
    let (asset0_denom, asset1_denom) = lexicographical_order_denoms(asset_a, asset_b)?;
    let series = series_key(pool_id, asset0_denom, asset1_denom);

    let record = HISTORICAL_RECORDS
        .prefix(series.as_slice())
        .range(
            storage,
            None,
            Some(Bound::inclusive(t.nanos())),
            Order::Descending,
        )
        .next()
        .transpose()?;

    let record = match record {
        Some((_, record)) => record,
        None if MOST_RECENT_RECORDS.has(storage, (pool_id, asset0_denom, asset1_denom)) => {
            return Err(ContractError::TimeTooOld { time: t })
        }
        None => {
            return Err(ContractError::NoRecordForPair {
                pool_id,
                asset0_denom: asset0_denom.to_string(),
                asset1_denom: asset1_denom.to_string(),
            })
        }
    };

    if !record.is_for_pair(pool_id, asset0_denom, asset1_denom) {
        return Err(ContractError::RecordMismatch {
            pool_id,
            asset0_denom: asset0_denom.to_string(),
            asset1_denom: asset1_denom.to_string(),
            found_pool_id: record.pool_id,
            found_asset0_denom: record.asset0_denom,
            found_asset1_denom: record.asset1_denom,
        });
    }
    Ok(record)
}

/// ## Description
/// Returns the historical records of the pair with `start < time < end`, oldest first.
pub fn get_records_between(
    storage: &dyn Storage,
    pool_id: u64,
    asset_a: &str,
    asset_b: &str,
    start: Timestamp,
    end: Timestamp,
) -> Result<Vec<TwapRecord>, ContractError> {
    let (asset0_denom, asset1_denom) = lexicographical_order_denoms(asset_a, asset_b)?;
    let series = series_key(pool_id, asset0_denom, asset1_denom);

    Ok(HISTORICAL_RECORDS
        .prefix(series.as_slice())
        .range(
            storage,
            Some(Bound::exclusive(start.nanos())),
            Some(Bound::exclusive(end.nanos())),
            Order::Ascending,
        )
        .map(|item| item.map(|(_, record)| record))
        .collect::<StdResult<Vec<_>>>()?)
}

/// Every historical record of every series, grouped by series and ordered by time.
pub fn get_all_historical_records(storage: &dyn Storage) -> StdResult<Vec<TwapRecord>> {
    HISTORICAL_RECORDS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, record)| record))
        .collect()
}

/// Highest pool id that has a twap record.
pub fn max_tracked_pool_id(storage: &dyn Storage) -> StdResult<Option<u64>> {
    let last_key = MOST_RECENT_RECORDS
        .keys(storage, None, None, Order::Descending)
        .next()
        .transpose()?;
    Ok(last_key.map(|(pool_id, _, _)| pool_id))
}

pub fn get_pruning_state(storage: &dyn Storage) -> StdResult<PruningState> {
    Ok(PRUNING_STATE.may_load(storage)?.unwrap_or_default())
}
