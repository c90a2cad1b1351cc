pub mod order;
pub mod token;
pub mod units;

pub use order::Order;
pub use token::{Address, AddressError, Allocation, TokenId, TokenInfo, TradingPair};
pub use units::TokenUnits;
