#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use btce_watch::exchanges::signer::SignedRequest;
use btce_watch::exchanges::PublicResource;
use btce_watch::utils::{Clock, NonceAllocator};
use btce_watch::{ApiError, AuthenticatedClient, ClientOptions, Pair, RestClient};

pub type Reply = Result<String, ApiError>;

/// Replies in order; the last one repeats forever.
#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
}

impl Script {
    fn next(&mut self) -> Option<Reply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

/// In-memory venue answering from per-endpoint scripts and recording every call.
#[derive(Default)]
pub struct ScriptedRest {
    public: Mutex<HashMap<(PublicResource, Pair), Script>>,
    private: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<SignedRequest>>,
    public_calls: Mutex<Vec<(PublicResource, Pair, Instant)>>,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
    latency: Mutex<Duration>,
}

impl ScriptedRest {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_public(&self, resource: PublicResource, pair: Pair, replies: Vec<Reply>) {
        self.public
            .lock()
            .unwrap()
            .insert((resource, pair), Script { replies: replies.into() });
    }

    pub fn script_private(&self, method: &str, replies: Vec<Reply>) {
        self.private
            .lock()
            .unwrap()
            .insert(method.to_string(), Script { replies: replies.into() });
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn private_calls(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method)
            .count()
    }

    pub fn public_calls(&self, resource: PublicResource) -> Vec<Pair> {
        self.public_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _, _)| *r == resource)
            .map(|(_, pair, _)| *pair)
            .collect()
    }

    /// When each call to `resource` started.
    pub fn public_call_times(&self, resource: PublicResource) -> Vec<Instant> {
        self.public_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _, _)| *r == resource)
            .map(|(_, _, at)| *at)
            .collect()
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    async fn respond(&self, reply: Option<Reply>) -> Reply {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.unwrap_or_else(|| Err(ApiError::Transport("no scripted reply".to_string())))
    }
}

#[async_trait]
impl RestClient for ScriptedRest {
    async fn query_public(&self, resource: PublicResource, pair: Pair) -> Result<String, ApiError> {
        self.public_calls.lock().unwrap().push((resource, pair, Instant::now()));
        let reply = self
            .public
            .lock()
            .unwrap()
            .get_mut(&(resource, pair))
            .and_then(Script::next);
        self.respond(reply).await
    }

    async fn query_private(&self, request: &SignedRequest) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .private
            .lock()
            .unwrap()
            .get_mut(&request.method)
            .and_then(Script::next);
        self.respond(reply).await
    }
}

/// Clock following tokio's pausable timer, starting at `base_ms`.
pub struct TokioClock {
    start: Instant,
    base_ms: i64,
}

impl TokioClock {
    pub fn new(base_ms: i64) -> Self {
        Self {
            start: Instant::now(),
            base_ms,
        }
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> i64 {
        self.base_ms + self.start.elapsed().as_millis() as i64
    }
}

pub fn client(rest: &Arc<ScriptedRest>, options: ClientOptions) -> AuthenticatedClient {
    let nonces = NonceAllocator::with_clock(Arc::new(TokioClock::new(1_700_000_000_000)));
    AuthenticatedClient::with_nonces(rest.clone(), options, nonces)
}

pub fn ticker_json(buy: &str, sell: &str) -> Reply {
    Ok(format!(
        r#"{{"ticker":{{"high":120,"low":90,"avg":105,"vol":1000,"vol_cur":10,"last":{buy},"buy":{buy},"sell":{sell},"updated":1700000000,"server_time":1700000000}}}}"#
    ))
}

pub fn fee_json(trade: &str) -> Reply {
    Ok(format!(r#"{{"trade":{trade}}}"#))
}

pub fn account_json(funds: &[(&str, &str)], open_orders: u64) -> Reply {
    let funds: Vec<String> = funds.iter().map(|(c, v)| format!(r#""{c}":{v}"#)).collect();
    Ok(format!(
        r#"{{"success":1,"return":{{"funds":{{{}}},"rights":{{"info":1,"trade":1,"withdraw":0}},"transaction_count":10,"open_orders":{open_orders},"server_time":1700000000}}}}"#,
        funds.join(",")
    ))
}

pub fn orders_json(amounts: &[&str]) -> Reply {
    if amounts.is_empty() {
        return remote_error("no orders");
    }
    let orders: Vec<String> = amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            format!(
                r#""{}":{{"pair":"btc_usd","type":"buy","amount":{amount},"rate":100,"timestamp_created":1700000000,"status":0}}"#,
                1000 + i
            )
        })
        .collect();
    Ok(format!(r#"{{"success":1,"return":{{{}}}}}"#, orders.join(",")))
}

pub fn remote_error(message: &str) -> Reply {
    Ok(format!(r#"{{"success":0,"error":"{message}"}}"#))
}

/// Lets spawned streams run up to `ms` of (paused) time.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
