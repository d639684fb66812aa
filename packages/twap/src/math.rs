use cosmwasm_std::{
    Decimal256, OverflowError, OverflowOperation, SignedDecimal256, StdError, StdResult, Uint128,
    Uint256,
};

/// Number of significant figures the pool manager computes spot prices with.
/// Geometric TWAPs are rounded to this precision.
pub const SPOT_PRICE_SIG_FIGS: u32 = 8;

/// Largest exponent `exp2` accepts. Spot prices are capped at `2^128 - 1`,
/// so a mean of their logarithms can never exceed 128.
pub const MAX_EXP2_EXPONENT: u128 = 128;

const DECIMAL_FRACTIONAL: u128 = 1_000_000_000_000_000_000;

/// Intermediate precision used by `log2` and `exp2` (36 decimal places)
const FRACTIONAL_36: u128 = DECIMAL_FRACTIONAL * DECIMAL_FRACTIONAL;

/// ln(2) with 36 decimal places
const LN_2_36: u128 = 693_147_180_559_945_309_417_232_121_458_176_568;

const LOG2_FRACTION_BITS: u32 = 64;
const EXP2_SERIES_TERMS: u128 = 48;

/// ## Description
/// Largest spot price the oracle stores: `2^128 - 1`.
pub fn max_spot_price() -> Decimal256 {
    Decimal256::from_ratio(u128::MAX, 1u128)
}

/// ## Description
/// `price * nanos`, the arithmetic accumulator increment for a price holding over `nanos`.
pub fn spot_price_mul_duration(price: Decimal256, nanos: u64) -> StdResult<Decimal256> {
    Ok(price.checked_mul(Decimal256::from_ratio(nanos, 1u64))?)
}

/// ## Description
/// `log_price * nanos`, the geometric accumulator increment for a price holding over `nanos`.
pub fn log_price_mul_duration(log_price: SignedDecimal256, nanos: u64) -> StdResult<SignedDecimal256> {
    Ok(log_price.checked_mul(SignedDecimal256::from_ratio(nanos as i128, 1i128))?)
}

/// ## Description
/// Divides an arithmetic accumulator difference by the elapsed time in nanoseconds.
pub fn accum_diff_div_duration(accum_diff: Decimal256, nanos: u64) -> StdResult<Decimal256> {
    accum_diff
        .checked_div(Decimal256::from_ratio(nanos, 1u64))
        .map_err(|e| StdError::generic_err(e.to_string()))
}

/// ## Description
/// Divides a geometric accumulator difference by the elapsed time in nanoseconds.
pub fn signed_accum_diff_div_duration(
    accum_diff: SignedDecimal256,
    nanos: u64,
) -> StdResult<SignedDecimal256> {
    accum_diff
        .checked_div(SignedDecimal256::from_ratio(nanos as i128, 1i128))
        .map_err(|e| StdError::generic_err(e.to_string()))
}

/// ## Description
/// Base 2 logarithm of a strictly positive decimal.
///
/// The input is normalised into `[1, 2)` by shifting, which yields the integer part.
/// Fraction bits are then produced one at a time by repeated squaring.
/// Intermediate values carry 36 decimal places, the result is truncated to 18.
///
/// Panics on zero: the logarithm is undefined and callers must never get here
/// with an errored spot price.
pub fn log2(value: Decimal256) -> StdResult<SignedDecimal256> {
    if value.is_zero() {
        panic!("twap: cannot take logarithm of zero");
    }

    let one = Uint256::from(FRACTIONAL_36);
    let two = one << 1;

    let mut y = value
        .atomics()
        .checked_mul(Uint256::from(DECIMAL_FRACTIONAL))?;
    let mut integer_part: i128 = 0;
    while y >= two {
        y = y >> 1;
        integer_part += 1;
    }
    while y < one {
        y = y << 1;
        integer_part -= 1;
    }

    let mut fraction = Uint256::zero();
    let mut bit = one >> 1;
    for _ in 0..LOG2_FRACTION_BITS {
        y = y.checked_mul(y)? / one;
        if y >= two {
            y = y >> 1;
            fraction += bit;
        }
        bit = bit >> 1;
    }

    let fraction = Uint128::try_from(fraction / Uint256::from(DECIMAL_FRACTIONAL))?.u128() as i128;
    let atomics = integer_part * DECIMAL_FRACTIONAL as i128 + fraction;

    SignedDecimal256::from_atomics(atomics, 18)
        .map_err(|_| StdError::generic_err(format!("log2 of {} is out of range", value)))
}

/// ## Description
/// `2^exponent` for a non-negative exponent.
///
/// The integer part is applied as a shift, the fractional part `f` through the
/// Taylor series of `e^(f * ln 2)` evaluated with 36 decimal places.
pub fn exp2(exponent: Decimal256) -> StdResult<Decimal256> {
    let fractional = Uint256::from(DECIMAL_FRACTIONAL);
    let atomics = exponent.atomics();

    let integer_part = atomics / fractional;
    if integer_part > Uint256::from(MAX_EXP2_EXPONENT) {
        return Err(OverflowError::new(OverflowOperation::Pow, 2u8, exponent).into());
    }
    let shift = Uint128::try_from(integer_part)?.u128() as u32;

    let one = Uint256::from(FRACTIONAL_36);
    // z = f * ln(2), with 36 decimal places
    let z = (atomics % fractional) * fractional * Uint256::from(LN_2_36) / one;

    let mut sum = one;
    let mut term = one;
    for i in 1..=EXP2_SERIES_TERMS {
        term = term * z / one / Uint256::from(i);
        if term.is_zero() {
            break;
        }
        sum += term;
    }

    Ok(Decimal256::new((sum << shift) / fractional))
}

/// ## Description
/// `2^exponent` for a signed exponent. Negative exponents yield the reciprocal.
pub fn signed_exp2(exponent: SignedDecimal256) -> StdResult<Decimal256> {
    let result = exp2(exponent.abs_diff(SignedDecimal256::zero()))?;
    if exponent.is_negative() {
        Decimal256::one()
            .checked_div(result)
            .map_err(|e| StdError::generic_err(e.to_string()))
    } else {
        Ok(result)
    }
}

/// ## Description
/// Rounds `value` half-up to `sig_figs` significant figures.
/// Values that already fit are returned unchanged.
pub fn sig_fig_round(value: Decimal256, sig_figs: u32) -> Decimal256 {
    let atomics = value.atomics();
    if atomics.is_zero() {
        return value;
    }

    let ten = Uint256::from(10u128);
    let mut digits = 0u32;
    let mut rest = atomics;
    while !rest.is_zero() {
        rest = rest / ten;
        digits += 1;
    }
    if digits <= sig_figs {
        return value;
    }

    let divisor = ten.pow(digits - sig_figs);
    let mut quotient = atomics / divisor;
    if (atomics % divisor) * Uint256::from(2u128) >= divisor {
        quotient += Uint256::one();
    }
    Decimal256::new(quotient * divisor)
}
