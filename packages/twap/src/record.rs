use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal256, SignedDecimal256, Timestamp};
use itertools::Itertools;

use crate::error::ValidationError;

/// ## Description
/// Price state of one asset pair of an AMM pool, valid as of `time`.
///
/// The pair is always stored in lexicographical order (`asset0_denom < asset1_denom`).
/// `p0_*` fields describe the price with `asset0_denom` as the quote asset, i.e. how much
/// asset0 one unit of asset1 is worth. `p1_*` fields are the reciprocal side.
#[cw_serde]
pub struct TwapRecord {
    pub pool_id: u64,
    /// Lexicographically smaller denom of the pair
    pub asset0_denom: String,
    /// Lexicographically larger denom of the pair
    pub asset1_denom: String,
    /// Block height the record was written at. Informational only.
    pub height: u64,
    /// Time the accumulators are valid as of
    pub time: Timestamp,
    pub p0_last_spot_price: Decimal256,
    pub p1_last_spot_price: Decimal256,
    /// Integral of `p0_last_spot_price` over time, in nanoseconds
    pub p0_arithmetic_twap_accumulator: Decimal256,
    /// Integral of `p1_last_spot_price` over time, in nanoseconds
    pub p1_arithmetic_twap_accumulator: Decimal256,
    /// Integral of `log2(p0_last_spot_price)` over time, in nanoseconds. May be negative.
    pub geometric_twap_accumulator: SignedDecimal256,
    /// Most recent time a spot price could not be sampled for this series
    pub last_error_time: Option<Timestamp>,
}

impl TwapRecord {
    /// Returns true when the spot prices of this record are the error sentinel,
    /// i.e. sampling failed at exactly `time`.
    pub fn errored_at_own_time(&self) -> bool {
        self.last_error_time == Some(self.time)
    }

    /// Last spot price for the side of the pair quoted in `quote_asset_denom`.
    pub fn last_spot_price(&self, quote_asset_denom: &str) -> Decimal256 {
        if quote_asset_denom == self.asset0_denom {
            self.p0_last_spot_price
        } else {
            self.p1_last_spot_price
        }
    }

    pub fn is_for_pair(&self, pool_id: u64, asset0_denom: &str, asset1_denom: &str) -> bool {
        self.pool_id == pool_id
            && self.asset0_denom == asset0_denom
            && self.asset1_denom == asset1_denom
    }

    /// ## Description
    /// Checks the invariants every stored record must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidRecord {
            pool_id: self.pool_id,
            reason: reason.to_string(),
        };

        if self.pool_id == 0 {
            return Err(invalid("pool id cannot be zero"));
        }
        lexicographical_order_denoms(&self.asset0_denom, &self.asset1_denom)?;
        if self.asset0_denom > self.asset1_denom {
            return Err(invalid("asset denoms are not in lexicographical order"));
        }
        if self.height == 0 {
            return Err(invalid("height must be positive"));
        }
        if self.time.nanos() == 0 {
            return Err(invalid("time must be set"));
        }
        if let Some(last_error_time) = self.last_error_time {
            if last_error_time > self.time {
                return Err(invalid("last error time cannot be after record time"));
            }
        }

        if self.errored_at_own_time() {
            if !self.p0_last_spot_price.is_zero() || !self.p1_last_spot_price.is_zero() {
                return Err(invalid("spot prices must be zero when sampling failed at record time"));
            }
        } else if self.p0_last_spot_price.is_zero() || self.p1_last_spot_price.is_zero() {
            return Err(invalid("spot prices must be positive"));
        }

        Ok(())
    }
}

/// ## Description
/// A pair of distinct denoms in lexicographical order.
#[cw_serde]
pub struct DenomPair {
    pub denom0: String,
    pub denom1: String,
}

/// ## Description
/// Returns the two denoms ordered lexicographically.
/// Fails if either denom is empty or both are the same.
pub fn lexicographical_order_denoms<'a>(
    denom_a: &'a str,
    denom_b: &'a str,
) -> Result<(&'a str, &'a str), ValidationError> {
    if denom_a.is_empty() || denom_b.is_empty() {
        return Err(ValidationError::EmptyDenom);
    }
    if denom_a == denom_b {
        return Err(ValidationError::SameDenoms {
            denom: denom_a.to_string(),
        });
    }
    if denom_a < denom_b {
        Ok((denom_a, denom_b))
    } else {
        Ok((denom_b, denom_a))
    }
}

/// ## Description
/// Returns every unique unordered pair of the given denoms, each pair ordered lexicographically.
/// For `n` distinct denoms this yields `n * (n - 1) / 2` pairs.
pub fn unique_denom_pairs(denoms: &[String]) -> Vec<DenomPair> {
    denoms
        .iter()
        .sorted()
        .dedup()
        .tuple_combinations()
        .map(|(denom0, denom1)| DenomPair {
            denom0: denom0.clone(),
            denom1: denom1.clone(),
        })
        .collect()
}
