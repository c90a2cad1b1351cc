//! Exchange state handed to the verifier, and JSON file helpers.
use anyhow::{anyhow, Context, Result};
use num_bigint::BigUint;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};

use crate::models::{Address, Allocation, Order, TokenId, TokenInfo, TokenUnits, TradingPair};

/// Save a serializable object to a JSON file.
pub fn save_to_file<T: Serialize>(data: &T, path: &str) -> Result<()> {
    let file = File::create(path).map_err(|e| anyhow!("Failed to create file {}: {}", path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, data)
        .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
    Ok(())
}

/// Load a deserializable object from a JSON file.
pub fn load_from_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let file = File::open(path).map_err(|e| anyhow!("Failed to open {}: {}", path, e))?;
    let reader = BufReader::new(file);
    let data = serde_json::from_reader(reader)
        .map_err(|e| anyhow!("Failed to parse {}: {}", path, e))?;
    Ok(data)
}

/// Already-decoded exchange state: token metadata, standing orders and
/// exchange balances per owner address.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    pub tokens: Vec<TokenInfo>,
    pub orders: Vec<Order>,
    #[serde_as(as = "BTreeMap<_, BTreeMap<_, TokenUnits>>")]
    #[serde(default)]
    pub balances: BTreeMap<Address, BTreeMap<TokenId, BigUint>>,
}

impl ExchangeSnapshot {
    /// Read a snapshot file, naming it in any error.
    pub fn load(path: &str) -> Result<Self> {
        load_from_file(path).with_context(|| format!("invalid exchange snapshot {}", path))
    }

    pub fn token_map(&self) -> HashMap<TokenId, TokenInfo> {
        self.tokens.iter().map(|t| (t.id, t.clone())).collect()
    }

    pub fn token_by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    /// Exchange balance of `owner` in `token`; zero when never deposited.
    pub fn balance(&self, owner: &Address, token: TokenId) -> BigUint {
        self.balances
            .get(owner)
            .and_then(|b| b.get(&token))
            .cloned()
            .unwrap_or_default()
    }

    pub fn allocation(&self, owner: &Address, pair: &TradingPair) -> Allocation {
        Allocation {
            stable: self.balance(owner, pair.stable.id),
            target: self.balance(owner, pair.target.id),
        }
    }

    /// Every address owning at least one order, in ascending order.
    pub fn order_owners(&self) -> Vec<Address> {
        self.orders
            .iter()
            .map(|o| o.user)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "tokens": [
            { "id": 0, "address": "0x1111111111111111111111111111111111111111", "symbol": "DAI", "decimals": 18 },
            { "id": 1, "address": "0x2222222222222222222222222222222222222222", "symbol": "WETH", "decimals": 18 }
        ],
        "orders": [
            { "user": "0x00000000000000000000000000000000000000BB", "buyToken": 1, "sellToken": 0,
              "priceNumerator": "1", "priceDenominator": "190", "sellTokenBalance": "0" },
            { "user": "0x00000000000000000000000000000000000000aa", "buyToken": 0, "sellToken": 1,
              "priceNumerator": "210", "priceDenominator": "1", "sellTokenBalance": "5" }
        ],
        "balances": {
            "0x00000000000000000000000000000000000000aa": { "0": "1000", "1": 0 }
        }
    }"#;

    fn owner(byte: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = byte;
        Address::new(bytes)
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot: ExchangeSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let pair = TradingPair::new(
            snapshot.token_by_symbol("DAI").unwrap().clone(),
            snapshot.token_by_symbol("WETH").unwrap().clone(),
        );

        assert_eq!(
            snapshot.allocation(&owner(0xaa), &pair),
            Allocation::new(1_000u32, 0u32)
        );
        assert_eq!(snapshot.allocation(&owner(0xbb), &pair), Allocation::default());
        assert_eq!(snapshot.order_owners(), vec![owner(0xaa), owner(0xbb)]);
        assert_eq!(snapshot.token_map().len(), 2);
        assert!(snapshot.token_by_symbol("GNO").is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let snapshot: ExchangeSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let path = path.to_str().unwrap();

        save_to_file(&snapshot, path).unwrap();
        let loaded: ExchangeSnapshot = load_from_file(path).unwrap();
        assert_eq!(loaded, snapshot);

        assert!(load_from_file::<ExchangeSnapshot>("/nonexistent/snapshot.json").is_err());
    }

    #[test]
    fn test_bad_snapshot_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{ "tokens": [], "orders": 7 }"#).unwrap();
        let path = path.to_str().unwrap();

        let err = ExchangeSnapshot::load(path).unwrap_err();
        assert_eq!(err.to_string(), format!("invalid exchange snapshot {}", path));
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }
}
