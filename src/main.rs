use anyhow::{anyhow, Context, Result};
use bracket_audit::{
    are_bounds_reasonable, check_bracket_funding, fetch_price, has_no_profitable_offer,
    is_price_reasonable, large_order_amounts, save_to_file, Address, Allocation,
    ExchangeSnapshot, FundingBranch, Order, PriceCache, PriceOracle, TokenInfo, TradingPair,
    VerifierConfig,
};
use clap::{Parser, Subcommand};
use num_bigint::BigUint;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bracket-audit", about = "Verify pricing and funding of bracket orders")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Price oracle base URL, overrides the configuration
    #[arg(long, global = true)]
    oracle_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Query the oracle for the price of <SOLD> in units of <BOUGHT>
    Price { bought: String, sold: String },

    /// Amounts for an unlimited order at a price in stable tokens per target token
    Amounts {
        #[arg(long)]
        price: f64,
        #[arg(long)]
        target_decimals: u8,
        #[arg(long)]
        stable_decimals: u8,
    },

    /// Check the funding of every bracket in an exchange snapshot
    Funding {
        snapshot: String,
        /// Stable token symbol
        #[arg(long)]
        stable: String,
        /// Target token symbol
        #[arg(long)]
        target: String,
        /// Current price in stable tokens per target token
        #[arg(long)]
        price: f64,
        /// Expected stable token units per bracket
        #[arg(long)]
        stable_allocation: BigUint,
        /// Expected target token units per bracket
        #[arg(long)]
        target_allocation: BigUint,
        /// Only check these bracket addresses (default: every order owner)
        #[arg(long = "bracket")]
        brackets: Vec<Address>,
        /// Write a JSON report to this file
        #[arg(long)]
        report: Option<String>,
    },

    /// Check that no order in a snapshot can be exploited at market prices
    Profitability { snapshot: String },

    /// Sanity-check bracket bounds and, given both symbols, the chosen price
    Bounds {
        #[arg(long)]
        price: f64,
        #[arg(long)]
        lowest: f64,
        #[arg(long)]
        highest: f64,
        #[arg(long, requires = "stable")]
        target: Option<String>,
        #[arg(long, requires = "target")]
        stable: Option<String>,
    },
}

#[derive(Serialize)]
struct BracketReport {
    bracket: Address,
    branch: Option<FundingBranch>,
    error: Option<String>,
}

#[derive(Serialize)]
struct OrderAmounts {
    target_amount: String,
    stable_amount: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = VerifierConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.oracle_url {
        config.oracle_url = url;
    }

    match cli.command {
        Command::Price { bought, sold } => price(&config, &bought, &sold).await,
        Command::Amounts {
            price,
            target_decimals,
            stable_decimals,
        } => {
            let (target_amount, stable_amount) = large_order_amounts(
                price,
                target_decimals,
                stable_decimals,
                &config.max_order_amount,
            )?;
            let amounts = OrderAmounts {
                target_amount: target_amount.to_string(),
                stable_amount: stable_amount.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&amounts)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Funding {
            snapshot,
            stable,
            target,
            price,
            stable_allocation,
            target_allocation,
            brackets,
            report,
        } => {
            let snapshot = ExchangeSnapshot::load(&snapshot)?;
            let pair = TradingPair::new(
                find_token(&snapshot, &stable)?,
                find_token(&snapshot, &target)?,
            );
            let expected = Allocation::new(stable_allocation, target_allocation);
            funding(&snapshot, &pair, price, &expected, brackets, report.as_deref())
        }
        Command::Profitability { snapshot } => {
            let snapshot = ExchangeSnapshot::load(&snapshot)?;
            profitability(&config, &snapshot).await
        }
        Command::Bounds {
            price,
            lowest,
            highest,
            target,
            stable,
        } => {
            let mut reasonable = are_bounds_reasonable(price, lowest, highest)?;
            if let (Some(target), Some(stable)) = (target, stable) {
                let oracle = PriceOracle::new(&config.oracle_url)?;
                reasonable &= is_price_reasonable(
                    &target,
                    &stable,
                    price,
                    config.accepted_price_deviation_percent,
                    &oracle,
                    None,
                )
                .await?;
            }
            if reasonable {
                info!("bounds and price look reasonable");
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn find_token(snapshot: &ExchangeSnapshot, symbol: &str) -> Result<TokenInfo> {
    snapshot
        .token_by_symbol(symbol)
        .cloned()
        .ok_or_else(|| anyhow!("token {} not found in snapshot", symbol))
}

async fn price(config: &VerifierConfig, bought: &str, sold: &str) -> Result<ExitCode> {
    let oracle = PriceOracle::new(&config.oracle_url)?;
    match fetch_price(&oracle, bought, sold, None).await {
        Some(price) => {
            println!("{}", price);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            warn!(bought, sold, "no price available");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn funding(
    snapshot: &ExchangeSnapshot,
    pair: &TradingPair,
    price: f64,
    expected: &Allocation,
    brackets: Vec<Address>,
    report: Option<&str>,
) -> Result<ExitCode> {
    let brackets = if brackets.is_empty() {
        snapshot.order_owners()
    } else {
        brackets
    };

    let mut reports = Vec::with_capacity(brackets.len());
    let mut mismatches = 0usize;
    for bracket in brackets {
        let balances = snapshot.allocation(&bracket, pair);
        match check_bracket_funding(price, &bracket, &snapshot.orders, &balances, pair, expected) {
            Ok(branch) => {
                info!(%bracket, ?branch, "bracket funded correctly");
                reports.push(BracketReport {
                    bracket,
                    branch: Some(branch),
                    error: None,
                });
            }
            // a broken deployment invalidates the whole run
            Err(e) if e.is_invariant_violation() => return Err(e.into()),
            Err(e) => {
                error!(%bracket, "{}", e);
                mismatches += 1;
                reports.push(BracketReport {
                    bracket,
                    branch: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if let Some(path) = report {
        save_to_file(&reports, path)
            .with_context(|| format!("cannot write funding report {}", path))?;
        info!("wrote report for {} brackets to {}", reports.len(), path);
    }

    if mismatches > 0 {
        error!("{} of {} brackets are funded incorrectly", mismatches, reports.len());
        Ok(ExitCode::FAILURE)
    } else {
        info!("all {} brackets are funded correctly", reports.len());
        Ok(ExitCode::SUCCESS)
    }
}

async fn profitability(config: &VerifierConfig, snapshot: &ExchangeSnapshot) -> Result<ExitCode> {
    let oracle = PriceOracle::new(&config.oracle_url)?;
    let cache = PriceCache::new();
    let tokens = snapshot.token_map();

    let mut flagged: Vec<&Order> = Vec::new();
    for order in &snapshot.orders {
        if !has_no_profitable_offer(order, &tokens, &oracle, Some(&cache)).await? {
            warn!(user = %order.user, buy = order.buy_token, sell = order.sell_token, "order may be profitably exploitable");
            flagged.push(order);
        }
    }

    if flagged.is_empty() {
        info!("none of {} orders offers a risk-free profit", snapshot.orders.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", serde_json::to_string_pretty(&flagged)?);
        Ok(ExitCode::FAILURE)
    }
}
