//! Polling engine: one non-overlapping fetch → diff → notify task per stream.

mod cycle;
pub mod diff;
mod scheduler;
pub mod streams;
mod subscribers;

pub use cycle::{StreamStatus, MIN_PERIOD};
pub use diff::{AccountChange, ChangeDescriptor, FeeChange, OrdersChange, PriceMovement, PriceTrigger, TickerChange};
pub use scheduler::{Scheduler, StreamHandle};
pub use streams::{AccountSource, Disposition, FeeSource, OrdersSource, StreamKind, StreamSource, TickerSource};
pub use subscribers::{Callback, Subscribers, Subscription};
