pub mod currency;
pub mod order_status;
pub mod pair;
pub mod trade_side;

pub use currency::Currency;
pub use order_status::OrderStatus;
pub use pair::Pair;
pub use trade_side::TradeSide;
