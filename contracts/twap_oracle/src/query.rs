use cosmwasm_std::{Storage, Timestamp};
use twap::lexicographical_order_denoms;
use twap::oracle::TwapResponse;

use crate::error::ContractError;
use crate::logic::{compute_twap, get_interpolated_record, get_most_recent_record, is_unstable};
use crate::strategy::TwapStrategy;

/// ## Description
/// Time weighted arithmetic mean of the price of `base_asset` in `quote_asset` over
/// `[start_time, end_time]`.
pub fn get_arithmetic_twap(
    storage: &dyn Storage,
    block_time: Timestamp,
    pool_id: u64,
    base_asset: &str,
    quote_asset: &str,
    start_time: Timestamp,
    end_time: Timestamp,
) -> Result<TwapResponse, ContractError> {
    get_twap(
        storage,
        block_time,
        pool_id,
        base_asset,
        quote_asset,
        start_time,
        end_time,
        TwapStrategy::Arithmetic,
    )
}

/// ## Description
/// Time weighted arithmetic mean of the price of `base_asset` in `quote_asset` from
/// `start_time` up to the current block time.
pub fn get_arithmetic_twap_to_now(
    storage: &dyn Storage,
    block_time: Timestamp,
    pool_id: u64,
    base_asset: &str,
    quote_asset: &str,
    start_time: Timestamp,
) -> Result<TwapResponse, ContractError> {
    get_twap_to_now(
        storage,
        block_time,
        pool_id,
        base_asset,
        quote_asset,
        start_time,
        TwapStrategy::Arithmetic,
    )
}

/// ## Description
/// Time weighted geometric mean of the price of `base_asset` in `quote_asset` over
/// `[start_time, end_time]`.
pub fn get_geometric_twap(
    storage: &dyn Storage,
    block_time: Timestamp,
    pool_id: u64,
    base_asset: &str,
    quote_asset: &str,
    start_time: Timestamp,
    end_time: Timestamp,
) -> Result<TwapResponse, ContractError> {
    get_twap(
        storage,
        block_time,
        pool_id,
        base_asset,
        quote_asset,
        start_time,
        end_time,
        TwapStrategy::Geometric,
    )
}

pub fn get_geometric_twap_to_now(
    storage: &dyn Storage,
    block_time: Timestamp,
    pool_id: u64,
    base_asset: &str,
    quote_asset: &str,
    start_time: Timestamp,
) -> Result<TwapResponse, ContractError> {
    get_twap_to_now(
        storage,
        block_time,
        pool_id,
        base_asset,
        quote_asset,
        start_time,
        TwapStrategy::Geometric,
    )
}

#[allow(clippy::too_many_arguments)]
fn get_twap(
    storage: &dyn Storage,
    block_time: Timestamp,
    pool_id: u64,
    base_asset: &str,
    quote_asset: &str,
    start_time: Timestamp,
    end_time: Timestamp,
    strategy: TwapStrategy,
) -> Result<TwapResponse, ContractError> {
    if start_time > end_time {
        return Err(ContractError::StartTimeAfterEndTime {
            start_time,
            end_time,
        });
    }
    if end_time == block_time {
        return get_twap_to_now(
            storage,
            block_time,
            pool_id,
            base_asset,
            quote_asset,
            start_time,
            strategy,
        );
    }
    if end_time > block_time {
        return Err(ContractError::EndTimeInFuture {
            end_time,
            block_time,
        });
    }
    lexicographical_order_denoms(base_asset, quote_asset)?;

    let start_record = get_interpolated_record(storage, pool_id, start_time, base_asset, quote_asset)?;
    let end_record = get_interpolated_record(storage, pool_id, end_time, base_asset, quote_asset)?;

    Ok(TwapResponse {
        twap: compute_twap(&start_record, &end_record, quote_asset, strategy)?,
        is_unstable: is_unstable(&start_record, &end_record),
    })
}

fn get_twap_to_now(
    storage: &dyn Storage,
    block_time: Timestamp,
    pool_id: u64,
    base_asset: &str,
    quote_asset: &str,
    start_time: Timestamp,
    strategy: TwapStrategy,
) -> Result<TwapResponse, ContractError> {
    if start_time > block_time {
        return Err(ContractError::StartTimeAfterEndTime {
            start_time,
            end_time: block_time,
        });
    }
    lexicographical_order_denoms(base_asset, quote_asset)?;

    let start_record = get_interpolated_record(storage, pool_id, start_time, base_asset, quote_asset)?;
    let end_record = get_most_recent_record(storage, block_time, pool_id, base_asset, quote_asset)?;

    Ok(TwapResponse {
        twap: compute_twap(&start_record, &end_record, quote_asset, strategy)?,
        is_unstable: is_unstable(&start_record, &end_record),
    })
}
