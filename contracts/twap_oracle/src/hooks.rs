use cosmwasm_std::{BlockInfo, StdResult, Storage, Timestamp};
use twap::oracle::PruningState;
use twap::pool_manager::PoolManager;
use twap::{unique_denom_pairs, TwapRecord};

use crate::error::ContractError;
use crate::logic::{new_twap_record, update_records};
use crate::pruning::{arm_pruning, prune_records_before_time_but_newest, PruningReport};
use crate::state::{get_pruning_state, store_new_record, CHANGED_POOLS, PARAMS};

/// ## Description
/// Creates the initial record of every pair of a new pool and marks the pool changed.
/// Any failure to read the pool is returned, the pool must not exist without records.
pub fn after_pool_created(
    storage: &mut dyn Storage,
    pool_manager: &dyn PoolManager,
    block: &BlockInfo,
    pool_id: u64,
) -> Result<Vec<TwapRecord>, ContractError> {
    let denoms = pool_manager.pool_denoms(pool_id)?;

    let records = unique_denom_pairs(&denoms)
        .iter()
        .map(|pair| new_twap_record(pool_manager, block, pool_id, &pair.denom0, &pair.denom1))
        .collect::<StdResult<Vec<_>>>()?;

    for record in records.iter() {
        store_new_record(storage, record)?;
    }
    CHANGED_POOLS.track(storage, pool_id)?;

    Ok(records)
}

/// Swaps and joins only mark the pool; its records are refreshed once, at end block.
pub fn track_changed_pool(storage: &mut dyn Storage, pool_id: u64) -> StdResult<()> {
    CHANGED_POOLS.track(storage, pool_id)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EndBlockReport {
    /// Pools whose records were refreshed
    pub updated_pools: Vec<u64>,
    /// Pools whose records could not be refreshed, with the reason
    pub failed_pools: Vec<(u64, String)>,
    /// Outcome of the pruning pass, if pruning is running
    pub pruning: Option<PruningReport>,
}

/// ## Description
/// Finalizes the block: drains the changed pools, refreshes their records, then runs a
/// pruning pass if a pruning run is in progress.
///
/// A pool that cannot be refreshed is reported and left as is; it never fails the block.
pub fn end_block(
    storage: &mut dyn Storage,
    pool_manager: &dyn PoolManager,
    block: &BlockInfo,
) -> StdResult<EndBlockReport> {
    let mut report = EndBlockReport::default();

    for pool_id in CHANGED_POOLS.drain(storage)? {
        match update_records(storage, pool_manager, block, pool_id) {
            Ok(_) => report.updated_pools.push(pool_id),
            Err(err) => report.failed_pools.push((pool_id, err.to_string())),
        }
    }

    if get_pruning_state(storage)?.is_pruning {
        report.pruning = Some(prune_records_before_time_but_newest(storage, pool_manager)?);
    }

    Ok(report)
}

/// ## Description
/// Arms a new pruning run when the configured prune epoch ends.
/// Returns the new pruning state, or `None` for any other epoch.
pub fn after_epoch_end(
    storage: &mut dyn Storage,
    block_time: Timestamp,
    epoch_identifier: &str,
) -> StdResult<Option<PruningState>> {
    let params = PARAMS.load(storage)?;
    if epoch_identifier != params.prune_epoch_identifier {
        return Ok(None);
    }
    arm_pruning(storage, block_time, &params).map(Some)
}
