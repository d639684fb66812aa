use cosmwasm_std::{
    BlockInfo, Decimal256, SignedDecimal256, StdError, StdResult, Storage, Timestamp,
};
use twap::math::{log2, log_price_mul_duration, max_spot_price, spot_price_mul_duration};
use twap::pool_manager::PoolManager;
use twap::{unique_denom_pairs, TwapRecord};

use crate::error::ContractError;
use crate::state::{
    get_all_most_recent_records_for_pool, get_most_recent_record_store_representation,
    get_record_at_or_before_time, store_new_record,
};
use crate::strategy::TwapStrategy;

// ----------------x----------------x----------------x----------------
// ----------------x      Spot price sampling       x-----------------
// ----------------x----------------x----------------x----------------

/// ## Description
/// Samples both spot prices of a pair from the pool manager.
/// Returns `(p0, p1)` where `p0` is quoted in `asset0_denom` and `p1` in `asset1_denom`.
///
/// A zero price or a price above [`max_spot_price`] cannot be accumulated and is reported as
/// an error.
pub fn sample_spot_prices(
    pool_manager: &dyn PoolManager,
    pool_id: u64,
    asset0_denom: &str,
    asset1_denom: &str,
) -> StdResult<(Decimal256, Decimal256)> {
    let p0 = pool_manager.spot_price(pool_id, asset1_denom, asset0_denom)?;
    let p1 = pool_manager.spot_price(pool_id, asset0_denom, asset1_denom)?;

    let max = max_spot_price();
    for price in [p0, p1] {
        if price.is_zero() {
            return Err(StdError::generic_err(format!(
                "spot price of pool {} is zero",
                pool_id
            )));
        }
        if price > max {
            return Err(StdError::generic_err(format!(
                "spot price {} of pool {} exceeds the maximum of {}",
                price, pool_id, max
            )));
        }
    }
    Ok((p0, p1))
}

/// ## Description
/// Creates the initial record of a pair: zero accumulators and freshly sampled prices.
/// Sampling failures are returned to the caller.
pub fn new_twap_record(
    pool_manager: &dyn PoolManager,
    block: &BlockInfo,
    pool_id: u64,
    asset0_denom: &str,
    asset1_denom: &str,
) -> StdResult<TwapRecord> {
    let (p0, p1) = sample_spot_prices(pool_manager, pool_id, asset0_denom, asset1_denom)?;
    Ok(TwapRecord {
        pool_id,
        asset0_denom: asset0_denom.to_string(),
        asset1_denom: asset1_denom.to_string(),
        height: block.height,
        time: block.time,
        p0_last_spot_price: p0,
        p1_last_spot_price: p1,
        p0_arithmetic_twap_accumulator: Decimal256::zero(),
        p1_arithmetic_twap_accumulator: Decimal256::zero(),
        geometric_twap_accumulator: SignedDecimal256::zero(),
        last_error_time: None,
    })
}

// ----------------x----------------x----------------x----------------
// ----------------x      Record interpolation       x----------------
// ----------------x----------------x----------------x----------------

/// ## Description
/// Moves the accumulators of `record` forward to `new_time`, assuming the record's spot
/// prices held over the whole interval. Spot prices are left untouched.
///
/// A record carrying the error sentinel (zero prices) adds nothing to the accumulators;
/// the geometric accumulator is left as is since `log2(0)` is undefined.
///
/// Panics if `new_time` is before the record's time.
pub fn advance_record(record: &TwapRecord, new_time: Timestamp) -> StdResult<TwapRecord> {
    assert!(
        new_time >= record.time,
        "twap: cannot advance record of pool {} from {} back to {}",
        record.pool_id,
        record.time,
        new_time
    );

    if new_time == record.time {
        return Ok(record.clone());
    }

    let delta = new_time.nanos() - record.time.nanos();
    let mut advanced = record.clone();
    advanced.time = new_time;
    advanced.p0_arithmetic_twap_accumulator = record
        .p0_arithmetic_twap_accumulator
        .checked_add(spot_price_mul_duration(record.p0_last_spot_price, delta)?)?;
    advanced.p1_arithmetic_twap_accumulator = record
        .p1_arithmetic_twap_accumulator
        .checked_add(spot_price_mul_duration(record.p1_last_spot_price, delta)?)?;

    if !record.p0_last_spot_price.is_zero() {
        let log_price = log2(record.p0_last_spot_price)?;
        advanced.geometric_twap_accumulator = record
            .geometric_twap_accumulator
            .checked_add(log_price_mul_duration(log_price, delta)?)?;
    }

    Ok(advanced)
}

/// Advances `record` to `t`. A sampling failure at the record's own time carries over to `t`,
/// as the sentinel prices are still in effect there.
fn interpolate(record: &TwapRecord, t: Timestamp) -> StdResult<TwapRecord> {
    let mut interpolated = advance_record(record, t)?;
    if record.errored_at_own_time() {
        interpolated.last_error_time = Some(t);
    }
    Ok(interpolated)
}

/// ## Description
/// Returns the state of the pair at time `t`: the newest historical record at or before
/// `t`, advanced to `t`.
pub fn get_interpolated_record(
    storage: &dyn Storage,
    pool_id: u64,
    t: Timestamp,
    asset_a: &str,
    asset_b: &str,
) -> Result<TwapRecord, ContractError> {
    let record = get_record_at_or_before_time(storage, pool_id, t, asset_a, asset_b)?;
    Ok(interpolate(&record, t)?)
}

/// ## Description
/// Returns the most recent record of the pair, advanced to the current block time.
pub fn get_most_recent_record(
    storage: &dyn Storage,
    block_time: Timestamp,
    pool_id: u64,
    asset_a: &str,
    asset_b: &str,
) -> Result<TwapRecord, ContractError> {
    let record = get_most_recent_record_store_representation(storage, pool_id, asset_a, asset_b)?;
    Ok(interpolate(&record, block_time)?)
}

// ----------------x----------------x----------------x----------------
// ----------------x      Record refresh at end block      x----------
// ----------------x----------------x----------------x----------------

/// ## Description
/// Advances `record` to the current block and replaces its spot prices with fresh samples.
///
/// A failed sample does not fail the update: both prices become zero and `last_error_time`
/// is set to the block time.
pub fn update_record(
    pool_manager: &dyn PoolManager,
    block: &BlockInfo,
    record: &TwapRecord,
) -> Result<TwapRecord, ContractError> {
    // A record created in this block still has zero accumulators and may be refreshed.
    let already_updated = (record.height == block.height || record.time == block.time)
        && !record.p0_arithmetic_twap_accumulator.is_zero()
        && !record.p1_arithmetic_twap_accumulator.is_zero();
    if record.time > block.time || record.height > block.height || already_updated {
        return Err(ContractError::InvalidUpdateRecord {
            pool_id: record.pool_id,
            record_height: record.height,
            record_time: record.time,
            block_height: block.height,
            block_time: block.time,
        });
    }

    let mut updated = advance_record(record, block.time)?;
    updated.height = block.height;

    match sample_spot_prices(
        pool_manager,
        record.pool_id,
        &record.asset0_denom,
        &record.asset1_denom,
    ) {
        Ok((p0, p1)) => {
            updated.p0_last_spot_price = p0;
            updated.p1_last_spot_price = p1;
        }
        Err(_) => {
            updated.p0_last_spot_price = Decimal256::zero();
            updated.p1_last_spot_price = Decimal256::zero();
            updated.last_error_time = Some(block.time);
        }
    }

    Ok(updated)
}

/// ## Description
/// Refreshes every pair of the pool and stores the new records in both indexes.
/// Either all pairs of the pool are written or none is.
pub fn update_records(
    storage: &mut dyn Storage,
    pool_manager: &dyn PoolManager,
    block: &BlockInfo,
    pool_id: u64,
) -> Result<Vec<TwapRecord>, ContractError> {
    let denoms = pool_manager.pool_denoms(pool_id)?;
    let expected = unique_denom_pairs(&denoms).len();

    let records = get_all_most_recent_records_for_pool(storage, pool_id)?;
    if records.len() != expected {
        return Err(ContractError::InvalidRecordCount {
            pool_id,
            expected,
            actual: records.len(),
        });
    }

    let updated = records
        .iter()
        .map(|record| update_record(pool_manager, block, record))
        .collect::<Result<Vec<_>, _>>()?;

    for record in updated.iter() {
        store_new_record(storage, record)?;
    }
    Ok(updated)
}

// ----------------x----------------x----------------x----------------
// ----------------x      Twap between two records      x-------------
// ----------------x----------------x----------------x----------------

/// ## Description
/// Mean price between two records of the same pair, with `quote_asset` as the quote.
/// Records at the same instant yield the end record's last spot price.
pub fn compute_twap(
    start: &TwapRecord,
    end: &TwapRecord,
    quote_asset: &str,
    strategy: TwapStrategy,
) -> StdResult<Decimal256> {
    if start.time == end.time {
        return Ok(end.last_spot_price(quote_asset));
    }
    strategy.compute_twap(start, end, quote_asset)
}

/// Returns true if a spot price failed to be sampled within `[start.time, end.time]`.
pub fn is_unstable(start: &TwapRecord, end: &TwapRecord) -> bool {
    let errored_after_start = end
        .last_error_time
        .map_or(false, |error_time| error_time >= start.time);
    errored_after_start || start.errored_at_own_time()
}
