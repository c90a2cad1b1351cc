//! Bracket funding checks.
//!
//! A bracket is one address holding two standing orders around the current
//! price: one buying the target token with the stable token, one selling it
//! back. Depending on where the market sits relative to the two limit prices,
//! the bracket must hold its whole allocation in exactly one of the tokens.
use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;
use tracing::debug;

use crate::error::{Invariant, VerificationError};
use crate::fraction::Fraction;
use crate::models::{Address, Allocation, Order, TradingPair};
use crate::pricing::unit_price;

/// The two validated orders of a bracket with their limit prices, both in
/// stable-token units per target-token unit.
#[derive(Debug, Clone)]
pub struct Bracket {
    pub address: Address,
    pub buy_target: Order,
    pub sell_target: Order,
    price_buying_target: Fraction,
    price_selling_target: Fraction,
}

impl Bracket {
    /// Pick the orders owned by `address` out of `orders` and check the bracket
    /// shape: two orders, one per direction, both against the stable token, and
    /// a buying price strictly below the selling price.
    pub fn from_orders(
        address: Address,
        orders: &[Order],
        pair: &TradingPair,
    ) -> Result<Self, VerificationError> {
        let invariant = |violation| VerificationError::Invariant {
            bracket: address,
            violation,
        };
        let target_id = pair.target.id;
        let stable_id = pair.stable.id;

        let owned: Vec<&Order> = orders.iter().filter(|o| o.is_owned_by(&address)).collect();
        if owned.len() != 2 {
            return Err(invariant(Invariant::OrderCount(owned.len())));
        }

        let buying: Vec<&Order> = owned
            .iter()
            .copied()
            .filter(|o| o.buy_token == target_id)
            .collect();
        if buying.len() != 1 {
            return Err(invariant(Invariant::BuyTargetOrderCount(buying.len())));
        }
        let buy_target = buying[0];
        if buy_target.sell_token != stable_id {
            return Err(invariant(Invariant::BuyOrderSellToken {
                found: buy_target.sell_token,
                expected: stable_id,
            }));
        }
        // stored as target per stable
        let price_buying_target = buy_target
            .price()
            .and_then(|p| p.inverted())
            .map_err(|e| invariant(Invariant::DegeneratePrice(e)))?;

        let selling: Vec<&Order> = owned
            .iter()
            .copied()
            .filter(|o| o.sell_token == target_id)
            .collect();
        if selling.len() != 1 {
            return Err(invariant(Invariant::SellTargetOrderCount(selling.len())));
        }
        let sell_target = selling[0];
        if sell_target.buy_token != stable_id {
            return Err(invariant(Invariant::SellOrderBuyToken {
                found: sell_target.buy_token,
                expected: stable_id,
            }));
        }
        let price_selling_target = sell_target
            .price()
            .map_err(|e| invariant(Invariant::DegeneratePrice(e)))?;

        if price_buying_target >= price_selling_target {
            return Err(invariant(Invariant::PriceOrdering {
                buy: price_buying_target,
                sell: price_selling_target,
            }));
        }

        Ok(Self {
            address,
            buy_target: buy_target.clone(),
            sell_target: sell_target.clone(),
            price_buying_target,
            price_selling_target,
        })
    }

    pub fn price_buying_target(&self) -> &Fraction {
        &self.price_buying_target
    }

    pub fn price_selling_target(&self) -> &Fraction {
        &self.price_selling_target
    }
}

/// Which allocation rule a bracket was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingBranch {
    /// Selling price below market: everything held in the stable token.
    BelowMarket,
    /// Buying price above market: everything held in the target token.
    AboveMarket,
    /// Market between the two limit prices.
    Middle,
}

/// Verify that the bracket at `bracket_address` holds the balances its position
/// relative to `current_price` (stable tokens per target token) requires.
pub fn check_bracket_funding(
    current_price: f64,
    bracket_address: &Address,
    orders: &[Order],
    balances: &Allocation,
    pair: &TradingPair,
    expected: &Allocation,
) -> Result<FundingBranch, VerificationError> {
    let bracket = Bracket::from_orders(*bracket_address, orders, pair)?;
    let current_unit_price = unit_price(current_price, pair.target.decimals, pair.stable.decimals)?;
    let zero = BigUint::zero();

    let branch = if bracket.price_selling_target() < &current_unit_price {
        expect_balance(bracket_address, &pair.target.symbol, &balances.target, &zero)?;
        expect_balance(bracket_address, &pair.stable.symbol, &balances.stable, &expected.stable)?;
        FundingBranch::BelowMarket
    } else if bracket.price_buying_target() > &current_unit_price {
        expect_balance(bracket_address, &pair.target.symbol, &balances.target, &expected.target)?;
        expect_balance(bracket_address, &pair.stable.symbol, &balances.stable, &zero)?;
        FundingBranch::AboveMarket
    } else {
        if !check_funding_in_the_middle_bracket(balances, expected) {
            return Err(VerificationError::MiddleBracketMismatch {
                bracket: *bracket_address,
                stable: balances.stable.clone(),
                target: balances.target.clone(),
                expected_stable: expected.stable.clone(),
                expected_target: expected.target.clone(),
            });
        }
        FundingBranch::Middle
    };

    debug!(bracket = %bracket_address, ?branch, "bracket funding verified");
    Ok(branch)
}

/// The bracket straddling the market may have been funded on either side:
/// which one depends on how close the price is to each limit, so both are
/// accepted.
pub fn check_funding_in_the_middle_bracket(balances: &Allocation, expected: &Allocation) -> bool {
    (balances.stable.is_zero() && balances.target == expected.target)
        || (balances.target.is_zero() && balances.stable == expected.stable)
}

fn expect_balance(
    bracket: &Address,
    symbol: &str,
    actual: &BigUint,
    expected: &BigUint,
) -> Result<(), VerificationError> {
    if actual == expected {
        Ok(())
    } else {
        Err(VerificationError::FundingMismatch {
            bracket: *bracket,
            symbol: symbol.to_string(),
            actual: actual.clone(),
            expected: expected.clone(),
        })
    }
}
