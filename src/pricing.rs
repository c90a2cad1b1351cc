//! Conversion between human prices ("stable tokens per target token") and raw
//! token-unit prices, and sizing of unlimited orders.
use num_bigint::BigUint;

use crate::error::VerificationError;
use crate::fraction::{Fraction, FractionError};

/// Largest amount an exchange order can carry (amounts are stored as uint128).
pub const MAX_ORDER_AMOUNT: u128 = u128::MAX;

/// Stable-token units paid for one target-token unit at `price` stable tokens
/// per target token.
pub fn unit_price(
    price: f64,
    target_decimals: u8,
    stable_decimals: u8,
) -> Result<Fraction, FractionError> {
    unit_price_fraction(&Fraction::from_f64(price)?, target_decimals, stable_decimals)
}

/// [`unit_price`] for a price that is already exact.
pub fn unit_price_fraction(
    price: &Fraction,
    target_decimals: u8,
    stable_decimals: u8,
) -> Result<Fraction, FractionError> {
    let scale = Fraction::new(
        Fraction::pow10(stable_decimals.into()),
        Fraction::pow10(target_decimals.into()),
    )?;
    Ok(price * &scale)
}

/// Output token units received for `input_amount` input token units, where
/// `price` is output tokens per input token. Truncates toward zero.
pub fn output_amount(
    price: f64,
    input_amount: &BigUint,
    input_decimals: u8,
    output_decimals: u8,
) -> Result<BigUint, FractionError> {
    output_amount_fraction(
        &Fraction::from_f64(price)?,
        input_amount,
        input_decimals,
        output_decimals,
    )
}

fn output_amount_fraction(
    price: &Fraction,
    input_amount: &BigUint,
    input_decimals: u8,
    output_decimals: u8,
) -> Result<BigUint, FractionError> {
    let unit = unit_price_fraction(price, input_decimals, output_decimals)?;
    (&unit * &Fraction::from_integer(input_amount.clone())).to_token_units()
}

/// Largest `(target_amount, stable_amount)` pair for an order at `price`
/// (stable per target) that keeps both sides within `max_amount`.
///
/// The target side starts at `max_amount`. If the stable side would then
/// overflow, the stable side is pinned to `max_amount` instead and the target
/// side derived from the inverse price.
pub fn large_order_amounts(
    price: f64,
    target_decimals: u8,
    stable_decimals: u8,
    max_amount: &BigUint,
) -> Result<(BigUint, BigUint), VerificationError> {
    let price = Fraction::from_f64(price)?;

    let mut target_amount = max_amount.clone();
    let mut stable_amount =
        output_amount_fraction(&price, &target_amount, target_decimals, stable_decimals)?;

    if &stable_amount > max_amount {
        stable_amount = max_amount.clone();
        target_amount = output_amount_fraction(
            &price.inverted()?,
            &stable_amount,
            stable_decimals,
            target_decimals,
        )?;
        // unreachable while the inverse is exact: flipping implies a unit
        // price above 1, so the derived target side stays below `max_amount`
        if stable_amount < target_amount {
            return Err(VerificationError::UnlimitedOrder {
                stable_amount,
                target_amount,
            });
        }
    }

    Ok((target_amount, stable_amount))
}
