use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::units::TokenUnits;

/// Index under which the exchange registers a token.
pub type TokenId = u16;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AddressError {
    #[error("invalid address hex '{0}': {1}")]
    Hex(String, hex::FromHexError),
    #[error("address '{0}' must be 20 bytes, got {1}")]
    Length(String, usize),
}

/// A 20-byte account or contract address.
///
/// Parsing is case-insensitive, so two renderings of the same address compare
/// equal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct Address([u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| AddressError::Hex(s.to_string(), e))?;
        let len = bytes.len();
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| AddressError::Length(s.to_string(), len))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Token metadata as reported by the chain. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: TokenId,
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(id: TokenId, address: Address, symbol: &str, decimals: u8) -> Self {
        Self {
            id,
            address,
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// The two tokens a bracket trades: prices are quoted as stable per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    pub stable: TokenInfo,
    pub target: TokenInfo,
}

impl TradingPair {
    pub fn new(stable: TokenInfo, target: TokenInfo) -> Self {
        Self { stable, target }
    }
}

/// Raw token-unit amounts held in (or expected for) one bracket.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    #[serde_as(as = "TokenUnits")]
    pub stable: BigUint,
    #[serde_as(as = "TokenUnits")]
    pub target: BigUint,
}

impl Allocation {
    pub fn new(stable: impl Into<BigUint>, target: impl Into<BigUint>) -> Self {
        Self {
            stable: stable.into(),
            target: target.into(),
        }
    }
}
