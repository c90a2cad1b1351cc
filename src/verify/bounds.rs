//! Sanity checks on user-chosen prices before a strategy is deployed.
use tracing::warn;

use crate::cache::PriceCache;
use crate::fraction::{Fraction, FractionError};
use crate::oracle::{fetch_price, PriceSource};

/// Bounds are reasonable when both lie within a factor 1.5 of the current
/// price and the current price sits strictly between them.
pub fn are_bounds_reasonable(
    current_price: f64,
    lowest_limit: f64,
    highest_limit: f64,
) -> Result<bool, FractionError> {
    let current = Fraction::from_f64(current_price)?;
    let lowest = Fraction::from_f64(lowest_limit)?;
    let highest = Fraction::from_f64(highest_limit)?;
    let factor = Fraction::new(3, 2)?;

    let close_to_current = &current * &factor.inverted()? < lowest && highest < &current * &factor;
    if !close_to_current {
        warn!(
            current_price,
            lowest_limit, highest_limit, "bounds are not within a factor 1.5 of the current price"
        );
    }
    let current_within = current > lowest && highest > current;
    if !current_within {
        warn!(
            current_price,
            lowest_limit, highest_limit, "current price is not within the bounds"
        );
    }
    Ok(close_to_current && current_within)
}

/// Compare a chosen price (stable tokens per target token) against the oracle.
///
/// Returns `false` when the oracle has no price or when the two differ by
/// `accepted_deviation_percent` percent of `price` or more.
pub async fn is_price_reasonable<S>(
    target_symbol: &str,
    stable_symbol: &str,
    price: f64,
    accepted_deviation_percent: f64,
    source: &S,
    cache: Option<&PriceCache>,
) -> Result<bool, FractionError>
where
    S: PriceSource + ?Sized,
{
    let Some(oracle_price) = fetch_price(source, stable_symbol, target_symbol, cache).await else {
        warn!(
            target = target_symbol,
            stable = stable_symbol,
            "could not perform price check against the oracle"
        );
        return Ok(false);
    };

    let chosen = Fraction::from_f64(price)?;
    let market = Fraction::from_f64(oracle_price)?;
    let tolerance = Fraction::from_f64(accepted_deviation_percent)?;
    // |market - chosen| / chosen >= tolerance / 100
    let deviation = (&market - &chosen).abs();
    if &deviation * &Fraction::from_integer(100) >= &tolerance * &chosen.abs() {
        warn!(
            chosen_price = price,
            oracle_price,
            accepted_deviation_percent,
            "chosen price deviates too far from the oracle price ({} bought for 1 {})",
            stable_symbol,
            target_symbol
        );
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TableSource;

    #[test]
    fn test_bounds() {
        assert!(are_bounds_reasonable(100.0, 80.0, 120.0).unwrap());
        // too wide
        assert!(!are_bounds_reasonable(100.0, 50.0, 120.0).unwrap());
        assert!(!are_bounds_reasonable(100.0, 80.0, 150.0).unwrap());
        // current price outside
        assert!(!are_bounds_reasonable(100.0, 101.0, 120.0).unwrap());
        assert!(!are_bounds_reasonable(100.0, 80.0, 100.0).unwrap());
        assert!(are_bounds_reasonable(f64::NAN, 80.0, 120.0).is_err());
    }

    #[tokio::test]
    async fn test_price_deviation() {
        let source = TableSource::new(&[("ETH", "DAI", 250.0)]);
        assert!(is_price_reasonable("WETH", "DAI", 251.0, 2.0, &source, None)
            .await
            .unwrap());
        assert!(!is_price_reasonable("WETH", "DAI", 200.0, 2.0, &source, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_deviation_at_threshold_is_rejected() {
        // 255 vs 250 is exactly 2% of the chosen price
        let source = TableSource::new(&[("ETH", "DAI", 255.0)]);
        assert!(!is_price_reasonable("WETH", "DAI", 250.0, 2.0, &source, None)
            .await
            .unwrap());
        assert!(is_price_reasonable("WETH", "DAI", 250.0, 2.5, &source, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_price_check_without_oracle() {
        let source = TableSource::new(&[]);
        assert!(!is_price_reasonable("WETH", "DAI", 250.0, 2.0, &source, None)
            .await
            .unwrap());
    }
}
