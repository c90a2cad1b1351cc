use std::collections::HashMap;
use std::sync::RwLock;

use crate::oracle::is_usable_price;

/// Oracle prices fetched during one verification run, keyed by
/// `(bought, sold)` symbol pair.
///
/// The cache is owned by the caller and threaded explicitly through every
/// lookup. It only grows. Concurrent checks may share it by reference: a pair
/// written twice simply stores the same oracle answer again.
#[derive(Debug, Default)]
pub struct PriceCache {
    prices: RwLock<HashMap<(String, String), f64>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price of `bought` per unit of `sold`, answering from the inverse pair
    /// when only that one is known. Non-positive entries are never inverted.
    pub fn get(&self, bought: &str, sold: &str) -> Option<f64> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        if let Some(price) = prices.get(&(bought.to_string(), sold.to_string())) {
            return Some(*price);
        }
        prices
            .get(&(sold.to_string(), bought.to_string()))
            .filter(|price| is_usable_price(**price))
            .map(|price| 1.0 / price)
    }

    pub fn insert(&self, bought: &str, sold: &str, price: f64) {
        self.prices
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((bought.to_string(), sold.to_string()), price);
    }

    pub fn len(&self) -> usize {
        self.prices.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
