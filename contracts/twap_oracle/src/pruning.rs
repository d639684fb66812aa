use cosmwasm_std::{Order, StdResult, Storage, Timestamp};
use cw_storage_plus::Bound;
use twap::oracle::{Params, PruningState};
use twap::pool_manager::PoolManager;
use twap::unique_denom_pairs;

use crate::state::{get_pruning_state, max_tracked_pool_id, series_key, HISTORICAL_RECORDS, PRUNING_STATE};

/// Upper bound on the number of historical records deleted in one block.
pub const NUM_RECORDS_TO_PRUNE_PER_BLOCK: u64 = 200;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// ## Description
/// Outcome of one pruning pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PruningReport {
    /// Number of historical records deleted
    pub pruned: u64,
    /// Pools skipped in this pass because their denoms could not be read, with the reason
    pub failed_pools: Vec<(u64, String)>,
    /// Set when the run reached pool 1 and pruning was switched off
    pub finished: bool,
}

/// ## Description
/// Starts a new pruning run: every record older than `block_time - keep period` becomes
/// eligible for deletion, except the newest such record of each series.
pub fn arm_pruning(
    storage: &mut dyn Storage,
    block_time: Timestamp,
    params: &Params,
) -> StdResult<PruningState> {
    let keep_period_nanos = params
        .record_history_keep_period
        .saturating_mul(NANOS_PER_SECOND);
    let state = PruningState {
        is_pruning: true,
        last_kept_time: Timestamp::from_nanos(block_time.nanos().saturating_sub(keep_period_nanos)),
        last_seen_pool_id: max_tracked_pool_id(storage)?.unwrap_or_default(),
    };
    PRUNING_STATE.save(storage, &state)?;
    Ok(state)
}

/// ## Description
/// Runs one pruning pass, walking pools downward from `last_seen_pool_id`.
///
/// For each pair of a pool, every historical record older than `last_kept_time` is deleted
/// except the newest of them, which stays as the anchor for interpolating at the boundary.
/// Once [`NUM_RECORDS_TO_PRUNE_PER_BLOCK`] records are deleted the pass stops, possibly in the
/// middle of a pool. The cursor is saved and the next pass starts again at that pool.
///
/// A pool whose denoms cannot be read is reported and skipped, it does not stop the pass.
pub fn prune_records_before_time_but_newest(
    storage: &mut dyn Storage,
    pool_manager: &dyn PoolManager,
) -> StdResult<PruningReport> {
    let mut state = get_pruning_state(storage)?;
    let mut report = PruningReport::default();
    if !state.is_pruning {
        return Ok(report);
    }

    let mut budget_exhausted = false;
    'pools: for pool_id in (1..=state.last_seen_pool_id).rev() {
        state.last_seen_pool_id = pool_id;
        let denoms = match pool_manager.pool_denoms(pool_id) {
            Ok(denoms) => denoms,
            Err(err) => {
                report.failed_pools.push((pool_id, err.to_string()));
                continue;
            }
        };

        for pair in unique_denom_pairs(&denoms) {
            report.pruned += prune_series(
                storage,
                pool_id,
                &pair.denom0,
                &pair.denom1,
                state.last_kept_time,
                NUM_RECORDS_TO_PRUNE_PER_BLOCK - report.pruned,
            )?;
            if report.pruned >= NUM_RECORDS_TO_PRUNE_PER_BLOCK {
                budget_exhausted = true;
                break 'pools;
            }
        }
    }

    if !budget_exhausted {
        state.is_pruning = false;
        report.finished = true;
    }
    PRUNING_STATE.save(storage, &state)?;

    Ok(report)
}

/// Deletes records of the series strictly older than `last_kept_time`, except the newest one,
/// newest first and at most `limit` of them.
fn prune_series(
    storage: &mut dyn Storage,
    pool_id: u64,
    asset0_denom: &str,
    asset1_denom: &str,
    last_kept_time: Timestamp,
    limit: u64,
) -> StdResult<u64> {
    let series = series_key(pool_id, asset0_denom, asset1_denom);

    let stale = HISTORICAL_RECORDS
        .prefix(series.as_slice())
        .keys(
            storage,
            None,
            Some(Bound::exclusive(last_kept_time.nanos())),
            Order::Descending,
        )
        .skip(1)
        .take(limit as usize)
        .collect::<StdResult<Vec<u64>>>()?;

    for time in stale.iter() {
        HISTORICAL_RECORDS.remove(storage, (series.as_slice(), *time));
    }
    Ok(stale.len() as u64)
}
