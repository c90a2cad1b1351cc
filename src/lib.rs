//! # bracket-audit
//!
//! Checks that a bracket market-making strategy on a batch-auction exchange is
//! priced and funded correctly relative to external market data.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | `fraction` | Exact rational arithmetic for every price comparison |
//! | `oracle`, `cache` | Retrying HTTP price oracle client with a caller-owned cache |
//! | `pricing` | Human price to raw token-unit price, unlimited order sizing |
//! | `verify::bracket` | Bracket shape invariants and funding allocation |
//! | `verify::profitability` | Flags orders a counterparty could exploit risk-free |
//! | `verify::bounds` | Sanity checks on chosen prices and bracket bounds |
//!
//! Chain access is out of scope: orders, balances and token metadata arrive
//! already decoded, usually as an [`ExchangeSnapshot`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bracket_audit::{fetch_price, PriceCache, PriceOracle, unit_price};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let oracle = PriceOracle::new("https://api-v2.dex.ag")?;
//!     let cache = PriceCache::new();
//!
//!     if let Some(price) = fetch_price(&oracle, "DAI", "WETH", Some(&cache)).await {
//!         // DAI units per WETH unit, both tokens with 18 decimals
//!         let unit = unit_price(price, 18, 18)?;
//!         println!("1 WETH = {} DAI ({} per unit)", price, unit);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fraction;
pub mod models;
pub mod oracle;
pub mod pricing;
pub mod snapshot;
pub mod utils;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::PriceCache;
pub use config::VerifierConfig;
pub use error::{Invariant, VerificationError};
pub use fraction::{Fraction, FractionError};
pub use models::{Address, Allocation, Order, TokenId, TokenInfo, TradingPair};
pub use oracle::{fetch_price, PriceOracle, PriceSource};
pub use pricing::{large_order_amounts, output_amount, unit_price, MAX_ORDER_AMOUNT};
pub use snapshot::{load_from_file, save_to_file, ExchangeSnapshot};
pub use verify::{
    are_bounds_reasonable, check_bracket_funding, has_no_profitable_offer, is_price_reasonable,
    FundingBranch,
};
