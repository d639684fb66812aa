use cosmwasm_std::{Decimal256, SignedDecimal256, StdError, StdResult};
use twap::math::{
    accum_diff_div_duration, exp2, sig_fig_round, signed_accum_diff_div_duration,
    SPOT_PRICE_SIG_FIGS,
};
use twap::TwapRecord;

/// ## Description
/// How the mean price between two records is derived from their accumulators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TwapStrategy {
    /// Time weighted arithmetic mean of the spot price
    Arithmetic,
    /// Time weighted geometric mean of the spot price, via the `log2` accumulator
    Geometric,
}

impl TwapStrategy {
    /// ## Description
    /// Mean price of the pair between `start` and `end`, quoted in `quote_asset`.
    ///
    /// Panics unless `end.time > start.time`; equal times are handled by the caller.
    pub fn compute_twap(
        &self,
        start: &TwapRecord,
        end: &TwapRecord,
        quote_asset: &str,
    ) -> StdResult<Decimal256> {
        assert!(
            end.time > start.time,
            "twap: strategy called with end time {} not after start time {}",
            end.time,
            start.time
        );
        let delta = end.time.nanos() - start.time.nanos();

        match self {
            TwapStrategy::Arithmetic => {
                let accum_diff = if quote_asset == start.asset0_denom {
                    end.p0_arithmetic_twap_accumulator
                        .checked_sub(start.p0_arithmetic_twap_accumulator)?
                } else {
                    end.p1_arithmetic_twap_accumulator
                        .checked_sub(start.p1_arithmetic_twap_accumulator)?
                };
                accum_diff_div_duration(accum_diff, delta)
            }
            TwapStrategy::Geometric => {
                let accum_diff = end
                    .geometric_twap_accumulator
                    .checked_sub(start.geometric_twap_accumulator)?;
                let mean_log = signed_accum_diff_div_duration(accum_diff, delta)?;

                let result = exp2(mean_log.abs_diff(SignedDecimal256::zero()))?;

                // The accumulator tracks log2 of the asset0 quoted price.
                let quote_is_asset0 = quote_asset == start.asset0_denom;
                let invert = (mean_log.is_negative() && quote_is_asset0)
                    || (!mean_log.is_negative() && !quote_is_asset0);
                let twap = if invert {
                    Decimal256::one()
                        .checked_div(result)
                        .map_err(|e| StdError::generic_err(e.to_string()))?
                } else {
                    result
                };

                Ok(sig_fig_round(twap, SPOT_PRICE_SIG_FIGS))
            }
        }
    }
}
