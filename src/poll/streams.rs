use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use super::diff::{self, AccountChange, ChangeDescriptor, FeeChange, OrdersChange, PriceTrigger, TickerChange};
use crate::error::ApiError;
use crate::exchanges::{PrivateApi, PublicResource, RestClient};
use crate::models::Pair;
use crate::utils::{AccountSnapshot, FeeSnapshot, OrdersListSnapshot, TickerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Ticker,
    Fee,
    Account,
    ActiveOrders,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Ticker => "ticker",
            StreamKind::Fee => "fee",
            StreamKind::Account => "account",
            StreamKind::ActiveOrders => "active_orders",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a poll cycle does after a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retry,
    Pause,
}

/// One polled data source: how to fetch it and how to compare two reads.
#[async_trait]
pub trait StreamSource: Send + Sync + 'static {
    type Snapshot: Send + Sync + 'static;
    type Change: ChangeDescriptor + Send + Sync + 'static;

    fn kind(&self) -> StreamKind;

    async fn fetch(&self) -> Result<Self::Snapshot, ApiError>;

    fn diff(&self, previous: Option<&Self::Snapshot>, current: &Self::Snapshot) -> Self::Change;

    async fn on_error(&self, _err: &ApiError) -> Disposition {
        Disposition::Retry
    }
}

pub struct TickerSource {
    rest: Arc<dyn RestClient>,
    pair: watch::Receiver<Pair>,
    trigger: Arc<AtomicU8>,
}

impl TickerSource {
    pub fn new(rest: Arc<dyn RestClient>, pair: watch::Receiver<Pair>, trigger: Arc<AtomicU8>) -> Self {
        Self { rest, pair, trigger }
    }
}

#[async_trait]
impl StreamSource for TickerSource {
    type Snapshot = TickerSnapshot;
    type Change = TickerChange;

    fn kind(&self) -> StreamKind {
        StreamKind::Ticker
    }

    async fn fetch(&self) -> Result<TickerSnapshot, ApiError> {
        let pair = *self.pair.borrow();
        let payload = self.rest.query_public(PublicResource::Ticker, pair).await?;
        TickerSnapshot::parse(&payload, pair)
    }

    fn diff(&self, previous: Option<&TickerSnapshot>, current: &TickerSnapshot) -> TickerChange {
        let trigger = PriceTrigger::from_bits(self.trigger.load(Ordering::Relaxed));
        // a read for another pair is not a baseline
        let previous = previous.filter(|prev| prev.pair == current.pair);
        diff::ticker(previous, current, trigger)
    }
}

pub struct FeeSource {
    rest: Arc<dyn RestClient>,
    pair: watch::Receiver<Pair>,
}

impl FeeSource {
    pub fn new(rest: Arc<dyn RestClient>, pair: watch::Receiver<Pair>) -> Self {
        Self { rest, pair }
    }
}

#[async_trait]
impl StreamSource for FeeSource {
    type Snapshot = FeeSnapshot;
    type Change = FeeChange;

    fn kind(&self) -> StreamKind {
        StreamKind::Fee
    }

    async fn fetch(&self) -> Result<FeeSnapshot, ApiError> {
        let pair = *self.pair.borrow();
        let payload = self.rest.query_public(PublicResource::Fee, pair).await?;
        FeeSnapshot::parse(&payload, pair)
    }

    fn diff(&self, previous: Option<&FeeSnapshot>, current: &FeeSnapshot) -> FeeChange {
        diff::fee(previous.filter(|prev| prev.pair == current.pair), current)
    }
}

/// Polls `getInfo`. A remote rejection here means the credential is no longer
/// accepted, so it is cleared and the stream pauses.
pub struct AccountSource {
    api: Arc<PrivateApi>,
    generation: AtomicU64,
}

impl AccountSource {
    pub fn new(api: Arc<PrivateApi>) -> Self {
        Self {
            api,
            generation: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl StreamSource for AccountSource {
    type Snapshot = AccountSnapshot;
    type Change = AccountChange;

    fn kind(&self) -> StreamKind {
        StreamKind::Account
    }

    async fn fetch(&self) -> Result<AccountSnapshot, ApiError> {
        self.generation
            .store(self.api.generation().await, Ordering::Relaxed);
        self.api.get_account_info().await
    }

    fn diff(&self, previous: Option<&AccountSnapshot>, current: &AccountSnapshot) -> AccountChange {
        diff::account(previous, current)
    }

    async fn on_error(&self, err: &ApiError) -> Disposition {
        match err {
            err if err.is_remote() => {
                self.api
                    .invalidate_generation(self.generation.load(Ordering::Relaxed))
                    .await;
                Disposition::Pause
            }
            ApiError::NotAuthenticated | ApiError::InvalidCredentials(_) => Disposition::Pause,
            _ => Disposition::Retry,
        }
    }
}

pub struct OrdersSource {
    api: Arc<PrivateApi>,
    pair: watch::Receiver<Pair>,
}

impl OrdersSource {
    pub fn new(api: Arc<PrivateApi>, pair: watch::Receiver<Pair>) -> Self {
        Self { api, pair }
    }
}

#[async_trait]
impl StreamSource for OrdersSource {
    type Snapshot = OrdersListSnapshot;
    type Change = OrdersChange;

    fn kind(&self) -> StreamKind {
        StreamKind::ActiveOrders
    }

    async fn fetch(&self) -> Result<OrdersListSnapshot, ApiError> {
        let pair = *self.pair.borrow();
        self.api.get_active_orders(pair).await
    }

    fn diff(&self, previous: Option<&OrdersListSnapshot>, current: &OrdersListSnapshot) -> OrdersChange {
        diff::active_orders(previous, current)
    }

    async fn on_error(&self, err: &ApiError) -> Disposition {
        match err {
            ApiError::NotAuthenticated | ApiError::InvalidCredentials(_) => Disposition::Pause,
            _ => Disposition::Retry,
        }
    }
}
