use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::info;

use crate::error::ApiError;
use crate::exchanges::{PrivateApi, RestClient};
use crate::models::{Pair, TradeSide};
use crate::poll::{
    AccountChange, AccountSource, FeeChange, FeeSource, OrdersChange, OrdersSource, PriceTrigger, Scheduler,
    StreamHandle, StreamKind, Subscription, TickerChange, TickerSource,
};
use crate::utils::{
    AccountSnapshot, FeeSnapshot, NonceAllocator, OrderSnapshot, OrdersListSnapshot, TickerSnapshot, TradeResult,
};

pub const DEFAULT_TICKER_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_FEE_PERIOD: Duration = Duration::from_secs(10800);
pub const DEFAULT_ACCOUNT_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_ORDERS_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub pair: Pair,
    pub ticker_period: Duration,
    pub fee_period: Duration,
    pub account_period: Duration,
    pub orders_period: Duration,
    pub price_trigger: PriceTrigger,
    pub fetch_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            pair: Pair::BtcUsd,
            ticker_period: DEFAULT_TICKER_PERIOD,
            fee_period: DEFAULT_FEE_PERIOD,
            account_period: DEFAULT_ACCOUNT_PERIOD,
            orders_period: DEFAULT_ORDERS_PERIOD,
            price_trigger: PriceTrigger::ALWAYS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Live view of one venue account plus signed one-shot operations.
///
/// Public streams (ticker, fee) start polling as soon as they have a
/// subscriber. Private streams (account, active orders) stay paused until
/// [`AuthenticatedClient::set_credentials`] succeeds, and the account stream
/// pauses them again when the venue rejects the credential.
pub struct AuthenticatedClient {
    api: Arc<PrivateApi>,
    scheduler: Scheduler,
    pair: watch::Sender<Pair>,
    trigger: Arc<AtomicU8>,
    ticker: StreamHandle<TickerSource>,
    fee: StreamHandle<FeeSource>,
    account: StreamHandle<AccountSource>,
    orders: StreamHandle<OrdersSource>,
}

impl AuthenticatedClient {
    pub fn new(rest: Arc<dyn RestClient>, options: ClientOptions) -> Self {
        Self::with_nonces(rest, options, NonceAllocator::new())
    }

    pub fn with_nonces(rest: Arc<dyn RestClient>, options: ClientOptions, nonces: NonceAllocator) -> Self {
        let api = Arc::new(PrivateApi::new(rest.clone(), nonces));
        let scheduler = Scheduler::new(options.fetch_timeout);
        let (pair, pair_rx) = watch::channel(options.pair);
        let trigger = Arc::new(AtomicU8::new(options.price_trigger.bits()));

        let ticker = scheduler.spawn(
            TickerSource::new(rest.clone(), pair_rx.clone(), trigger.clone()),
            options.ticker_period,
            false,
        );
        let fee = scheduler.spawn(FeeSource::new(rest, pair_rx.clone()), options.fee_period, false);
        let account = scheduler.spawn(AccountSource::new(api.clone()), options.account_period, true);
        let orders = scheduler.spawn(OrdersSource::new(api.clone(), pair_rx), options.orders_period, true);

        info!(pair = %options.pair, "client started");
        Self {
            api,
            scheduler,
            pair,
            trigger,
            ticker,
            fee,
            account,
            orders,
        }
    }

    /// Verifies the credential with one `getInfo` call. On success the
    /// account and active-order streams (re)start from a fresh baseline; on
    /// failure the client is left unauthenticated with those streams paused.
    pub async fn set_credentials(&self, key: &str, secret: &str) -> Result<AccountSnapshot, ApiError> {
        self.account.pause();
        self.orders.pause();

        let account = self.api.authenticate(key, secret).await?;

        self.account.resume();
        self.orders.resume();
        Ok(account)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.api.is_authenticated().await
    }

    pub async fn place_order(
        &self,
        pair: Pair,
        side: TradeSide,
        rate: Decimal,
        amount: Decimal,
    ) -> Result<TradeResult, ApiError> {
        self.api.place_order(pair, side, rate, amount).await
    }

    pub async fn get_order_info(&self, order_id: u64) -> Result<OrderSnapshot, ApiError> {
        self.api.get_order_info(order_id).await
    }

    pub async fn get_active_orders(&self, pair: Pair) -> Result<OrdersListSnapshot, ApiError> {
        self.api.get_active_orders(pair).await
    }

    pub async fn get_account_info(&self) -> Result<AccountSnapshot, ApiError> {
        self.api.get_account_info().await
    }

    pub fn pair(&self) -> Pair {
        *self.pair.borrow()
    }

    /// Switches the active instrument. Ticker, fee and active-order streams
    /// drop their baselines and poll the new pair right away.
    pub fn set_pair(&self, pair: Pair) {
        let previous = self.pair.send_replace(pair);
        if previous == pair {
            return;
        }
        info!(from = %previous, to = %pair, "active pair changed");
        self.ticker.reset();
        self.fee.reset();
        self.orders.reset();
    }

    pub fn price_trigger(&self) -> PriceTrigger {
        PriceTrigger::from_bits(self.trigger.load(Ordering::Relaxed))
    }

    pub fn set_price_trigger(&self, trigger: PriceTrigger) {
        self.trigger.store(trigger.bits(), Ordering::Relaxed);
    }

    pub fn set_period(&self, stream: StreamKind, period: Duration) {
        match stream {
            StreamKind::Ticker => self.ticker.set_period(period),
            StreamKind::Fee => self.fee.set_period(period),
            StreamKind::Account => self.account.set_period(period),
            StreamKind::ActiveOrders => self.orders.set_period(period),
        }
    }

    pub fn ticker(&self) -> &StreamHandle<TickerSource> {
        &self.ticker
    }

    pub fn fee(&self) -> &StreamHandle<FeeSource> {
        &self.fee
    }

    pub fn account(&self) -> &StreamHandle<AccountSource> {
        &self.account
    }

    pub fn active_orders(&self) -> &StreamHandle<OrdersSource> {
        &self.orders
    }

    pub fn on_price_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TickerSnapshot, &TickerChange) + Send + Sync + 'static,
    {
        self.ticker.subscribe(callback)
    }

    pub fn on_fee_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FeeSnapshot, &FeeChange) + Send + Sync + 'static,
    {
        self.fee.subscribe(callback)
    }

    pub fn on_account_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AccountSnapshot, &AccountChange) + Send + Sync + 'static,
    {
        self.account.subscribe(callback)
    }

    pub fn on_orders_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&OrdersListSnapshot, &OrdersChange) + Send + Sync + 'static,
    {
        self.orders.subscribe(callback)
    }

    pub fn current_fee(&self) -> FeeSnapshot {
        let pair = self.pair();
        self.fee
            .latest()
            .filter(|fee| fee.pair == pair)
            .map(|fee| FeeSnapshot::clone(&fee))
            .unwrap_or_else(|| FeeSnapshot::default_fee(pair))
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        info!("client stopped");
    }
}
