use num_bigint::BigUint;
use thiserror::Error;

use crate::fraction::{Fraction, FractionError};
use crate::models::{Address, TokenId};

/// A structural rule of a bracket deployment that does not hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Invariant {
    #[error("expected exactly 2 orders owned by the bracket, found {0}")]
    OrderCount(usize),
    #[error("expected exactly 1 order buying the target token, found {0}")]
    BuyTargetOrderCount(usize),
    #[error("expected exactly 1 order selling the target token, found {0}")]
    SellTargetOrderCount(usize),
    #[error("order buying the target token sells token {found}, expected stable token {expected}")]
    BuyOrderSellToken { found: TokenId, expected: TokenId },
    #[error("order selling the target token buys token {found}, expected stable token {expected}")]
    SellOrderBuyToken { found: TokenId, expected: TokenId },
    #[error("order price is degenerate: {0}")]
    DegeneratePrice(FractionError),
    #[error("buying price {buy} is not below selling price {sell}")]
    PriceOrdering { buy: Fraction, sell: Fraction },
}

#[derive(Debug, Error)]
pub enum VerificationError {
    /// The deployment itself is broken; not a data problem.
    #[error("bracket {bracket}: invariant violated: {violation}")]
    Invariant {
        bracket: Address,
        violation: Invariant,
    },

    #[error("bracket {bracket}: {symbol} balance is {actual}, expected {expected}")]
    FundingMismatch {
        bracket: Address,
        symbol: String,
        actual: BigUint,
        expected: BigUint,
    },

    #[error(
        "bracket {bracket}: middle bracket holds {stable} stable and {target} target units, \
         expected all-stable ({expected_stable}) or all-target ({expected_target})"
    )]
    MiddleBracketMismatch {
        bracket: Address,
        stable: BigUint,
        target: BigUint,
        expected_stable: BigUint,
        expected_target: BigUint,
    },

    #[error(
        "unable to create unlimited order: target amount {target_amount} exceeds stable amount {stable_amount}"
    )]
    UnlimitedOrder {
        stable_amount: BigUint,
        target_amount: BigUint,
    },

    #[error("no metadata for token id {0}")]
    UnknownToken(TokenId),

    #[error(transparent)]
    Fraction(#[from] FractionError),
}

impl VerificationError {
    /// Whether this error points at a deployment bug rather than a balance that
    /// differs from what was expected.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            VerificationError::Invariant { .. } | VerificationError::UnlimitedOrder { .. }
        )
    }
}
