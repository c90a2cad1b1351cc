use anyhow::{Context, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::models::TokenUnits;
use crate::oracle::DEFAULT_ORACLE_URL;
use crate::pricing::MAX_ORDER_AMOUNT;
use crate::snapshot::load_from_file;

const DEFAULT_PRICE_DEVIATION_PERCENT: f64 = 2.0;

/// Numeric parameters of a verification run. Every field is optional in the
/// JSON file; missing ones take their default.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub oracle_url: String,
    #[serde_as(as = "TokenUnits")]
    pub max_order_amount: BigUint,
    pub accepted_price_deviation_percent: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            oracle_url: DEFAULT_ORACLE_URL.to_string(),
            max_order_amount: BigUint::from(MAX_ORDER_AMOUNT),
            accepted_price_deviation_percent: DEFAULT_PRICE_DEVIATION_PERCENT,
        }
    }
}

impl VerifierConfig {
    /// Read the configuration from `path`, or use the defaults without one.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => load_from_file(path)
                .with_context(|| format!("invalid verifier config {}", path)),
            None => Ok(Self::default()),
        }
    }
}
