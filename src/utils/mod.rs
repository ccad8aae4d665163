pub mod api_key_man;
pub mod balance;
pub mod envelope;
pub mod fee;
pub mod nonce;
pub mod orders;
pub mod tick;

pub use balance::{AccountSnapshot, Rights};
pub use fee::FeeSnapshot;
pub use nonce::{Clock, NonceAllocator, SystemClock};
pub use orders::{OrderSnapshot, OrdersListSnapshot, TradeResult};
pub use tick::TickerSnapshot;
