//! Test doubles shared by the unit tests.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::oracle::PriceSource;

/// Answers from a fixed `(from, to) -> price` table and records every query.
pub struct TableSource {
    prices: HashMap<(String, String), f64>,
    queries: Mutex<Vec<(String, String)>>,
}

impl TableSource {
    pub fn new(prices: &[(&str, &str, f64)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(from, to, p)| ((from.to_string(), to.to_string()), *p))
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceSource for TableSource {
    async fn query_price(&self, from: &str, to: &str) -> Result<f64> {
        self.queries
            .lock()
            .unwrap()
            .push((from.to_string(), to.to_string()));
        self.prices
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .ok_or_else(|| anyhow!("unknown pair {}/{}", from, to))
    }
}
