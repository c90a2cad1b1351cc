use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::token::{Address, TokenId};
use super::units::TokenUnits;
use crate::fraction::{Fraction, FractionError};

/// A standing order decoded from the exchange.
///
/// The price is `buy_token` units per `sell_token` unit, kept as the raw
/// numerator/denominator pair stored on chain.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub user: Address,
    pub buy_token: TokenId,
    pub sell_token: TokenId,
    #[serde_as(as = "TokenUnits")]
    pub price_numerator: u128,
    #[serde_as(as = "TokenUnits")]
    pub price_denominator: u128,
    #[serde_as(as = "TokenUnits")]
    pub sell_token_balance: BigUint,
}

impl Order {
    /// Exact price in buy-token units per sell-token unit.
    pub fn price(&self) -> Result<Fraction, FractionError> {
        Fraction::new(self.price_numerator, self.price_denominator)
    }

    pub fn is_owned_by(&self, address: &Address) -> bool {
        &self.user == address
    }
}
