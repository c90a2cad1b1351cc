use num_bigint::BigUint;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::cache::PriceCache;
use crate::error::VerificationError;
use crate::fraction::Fraction;
use crate::models::{Order, TokenId, TokenInfo};
use crate::oracle::{fetch_price, PriceSource};
use crate::pricing::unit_price;

/// Orders worth less than this many USD are not checked.
pub const NEGLIGIBLE_VALUE_USD: u32 = 1;
const USD_REFERENCE_SYMBOL: &str = "USDC";

fn token_info(
    tokens: &HashMap<TokenId, TokenInfo>,
    id: TokenId,
) -> Result<&TokenInfo, VerificationError> {
    tokens.get(&id).ok_or(VerificationError::UnknownToken(id))
}

/// Value of the order's remaining sell balance in whole USD, truncated.
/// `None` when the oracle has no USD price for the sell token.
pub async fn order_sell_value_in_usd<S>(
    order: &Order,
    tokens: &HashMap<TokenId, TokenInfo>,
    source: &S,
    cache: Option<&PriceCache>,
) -> Result<Option<BigUint>, VerificationError>
where
    S: PriceSource + ?Sized,
{
    let sell = token_info(tokens, order.sell_token)?;
    let Some(price) = fetch_price(source, USD_REFERENCE_SYMBOL, &sell.symbol, cache).await else {
        return Ok(None);
    };
    let balance = Fraction::new(
        order.sell_token_balance.clone(),
        Fraction::pow10(sell.decimals.into()),
    )?;
    let value = &Fraction::from_f64(price)? * &balance;
    Ok(Some(value.to_token_units()?))
}

/// `true` when nobody can take `order` and resell at the market price for a
/// risk-free profit, i.e. the market price is strictly below the order's
/// limit price. Orders below [`NEGLIGIBLE_VALUE_USD`] always pass.
///
/// Missing oracle data yields `false`: the absence of a profitable offer
/// cannot be guaranteed.
pub async fn has_no_profitable_offer<S>(
    order: &Order,
    tokens: &HashMap<TokenId, TokenInfo>,
    source: &S,
    cache: Option<&PriceCache>,
) -> Result<bool, VerificationError>
where
    S: PriceSource + ?Sized,
{
    let buy = token_info(tokens, order.buy_token)?;
    let sell = token_info(tokens, order.sell_token)?;

    match order_sell_value_in_usd(order, tokens, source, cache).await? {
        Some(value) if value < BigUint::from(NEGLIGIBLE_VALUE_USD) => {
            debug!(user = %order.user, sell = %sell.symbol, "ignoring order of negligible value");
            return Ok(true);
        }
        Some(_) => {}
        None => {
            warn!(
                user = %order.user,
                sell = %sell.symbol,
                "could not value order in USD, unable to rule out a profitable offer"
            );
            return Ok(false);
        }
    }

    let Some(market) = fetch_price(source, &buy.symbol, &sell.symbol, cache).await else {
        warn!(
            user = %order.user,
            buy = %buy.symbol,
            sell = %sell.symbol,
            "no market price available, unable to rule out a profitable offer"
        );
        return Ok(false);
    };

    // both in buy-token units per sell-token unit
    let market_price = unit_price(market, sell.decimals, buy.decimals)?;
    let order_price = order.price()?;
    Ok(market_price < order_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Address;
    use crate::testing::TableSource;

    const USDC: TokenId = 0;
    const WETH: TokenId = 1;
    const DAI: TokenId = 2;

    fn tokens() -> HashMap<TokenId, TokenInfo> {
        [
            TokenInfo::new(USDC, Address::new([1; 20]), "USDC", 6),
            TokenInfo::new(WETH, Address::new([2; 20]), "WETH", 18),
            TokenInfo::new(DAI, Address::new([3; 20]), "DAI", 18),
        ]
        .into_iter()
        .map(|t| (t.id, t))
        .collect()
    }

    fn order(buy: TokenId, sell: TokenId, num: u128, den: u128, balance: BigUint) -> Order {
        Order {
            user: Address::new([9; 20]),
            buy_token: buy,
            sell_token: sell,
            price_numerator: num,
            price_denominator: den,
            sell_token_balance: balance,
        }
    }

    fn one_eth() -> BigUint {
        BigUint::from(10u8).pow(18)
    }

    #[tokio::test]
    async fn test_dust_order_passes_regardless_of_price() {
        // 0.001 WETH at 250 USDC is worth 0.25 USD
        let source = TableSource::new(&[("ETH", "USDC", 250.0)]);
        let dust = order(DAI, WETH, 1, 1, BigUint::from(10u8).pow(15));
        assert!(has_no_profitable_offer(&dust, &tokens(), &source, None).await.unwrap());
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn test_order_below_market_is_exploitable() {
        let source = TableSource::new(&[("ETH", "USDC", 250.0), ("ETH", "DAI", 250.0)]);
        let cheap = order(DAI, WETH, 200, 1, one_eth());
        assert!(!has_no_profitable_offer(&cheap, &tokens(), &source, None).await.unwrap());

        let fair = order(DAI, WETH, 300, 1, one_eth());
        assert!(has_no_profitable_offer(&fair, &tokens(), &source, None).await.unwrap());

        // equal to market is still exploitable
        let at_market = order(DAI, WETH, 250, 1, one_eth());
        assert!(!has_no_profitable_offer(&at_market, &tokens(), &source, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_prices_compare_across_decimals() {
        // selling 1000 USDC for WETH; market is 0.004 WETH per USDC,
        // i.e. 4e9 raw WETH units per raw USDC unit
        let source = TableSource::new(&[("USDC", "ETH", 0.004)]);
        let balance = BigUint::from(1_000_000_000u64);
        let above = order(WETH, USDC, 5_000_000_000, 1, balance.clone());
        assert!(has_no_profitable_offer(&above, &tokens(), &source, None).await.unwrap());

        let below = order(WETH, USDC, 3_000_000_000, 1, balance);
        assert!(!has_no_profitable_offer(&below, &tokens(), &source, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_prices_degrade_to_false() {
        let no_usd = TableSource::new(&[("ETH", "DAI", 250.0)]);
        let o = order(DAI, WETH, 300, 1, one_eth());
        assert!(!has_no_profitable_offer(&o, &tokens(), &no_usd, None).await.unwrap());

        let no_market = TableSource::new(&[("ETH", "USDC", 250.0)]);
        assert!(!has_no_profitable_offer(&o, &tokens(), &no_market, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_negative_oracle_quote_degrades_to_false() {
        let source = TableSource::new(&[("ETH", "USDC", -250.0), ("ETH", "DAI", 250.0)]);
        let o = order(DAI, WETH, 300, 1, one_eth());
        assert!(!has_no_profitable_offer(&o, &tokens(), &source, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_is_shared_between_orders() {
        let source = TableSource::new(&[("ETH", "USDC", 250.0), ("ETH", "DAI", 250.0)]);
        let cache = PriceCache::new();
        for num in [300, 400] {
            let o = order(DAI, WETH, num, 1, one_eth());
            assert!(has_no_profitable_offer(&o, &tokens(), &source, Some(&cache))
                .await
                .unwrap());
        }
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_token_is_error() {
        let source = TableSource::new(&[]);
        let o = order(42, WETH, 1, 1, one_eth());
        assert!(matches!(
            has_no_profitable_offer(&o, &tokens(), &source, None).await,
            Err(VerificationError::UnknownToken(42))
        ));
    }

    #[tokio::test]
    async fn test_sell_value_in_usd() {
        let source = TableSource::new(&[("ETH", "USDC", 250.0)]);
        let o = order(DAI, WETH, 1, 1, one_eth() * 3u8);
        let value = order_sell_value_in_usd(&o, &tokens(), &source, None)
            .await
            .unwrap();
        assert_eq!(value, Some(BigUint::from(750u32)));

        // USDC is its own reference: no query needed
        let usdc = order(DAI, USDC, 1, 1, BigUint::from(2_500_000u32));
        let value = order_sell_value_in_usd(&usdc, &tokens(), &source, None)
            .await
            .unwrap();
        assert_eq!(value, Some(BigUint::from(2u8)));
        assert_eq!(source.query_count(), 1);
    }
}
