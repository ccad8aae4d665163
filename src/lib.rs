pub mod client;
pub mod config;
pub mod error;
pub mod exchanges;
pub mod models;
pub mod poll;
pub mod utils;

pub use client::{AuthenticatedClient, ClientOptions};
pub use error::ApiError;
pub use exchanges::{BtceClient, BtceConfig, RestClient};
pub use models::{Currency, OrderStatus, Pair, TradeSide};
pub use poll::{PriceTrigger, StreamKind, StreamStatus, Subscription};
