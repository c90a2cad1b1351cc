pub mod bounds;
pub mod bracket;
pub mod profitability;

pub use bounds::{are_bounds_reasonable, is_price_reasonable};
pub use bracket::{check_bracket_funding, check_funding_in_the_middle_bracket, Bracket, FundingBranch};
pub use profitability::{has_no_profitable_offer, order_sell_value_in_usd, NEGLIGIBLE_VALUE_USD};
