use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::signer::{build_authenticated_request, Credential};
use super::RestClient;
use crate::error::ApiError;
use crate::models::{Pair, TradeSide};
use crate::utils::{AccountSnapshot, NonceAllocator, OrderSnapshot, OrdersListSnapshot, TradeResult};

#[derive(Default)]
struct CredentialState {
    credential: Option<Arc<Credential>>,
    /// Bumped on every credential change so late failures can be matched
    /// against the credential they were issued with.
    generation: u64,
}

/// Signed access to the private `tapi` endpoint.
///
/// One instance owns the nonce counter for the process; every private call,
/// whichever stream or caller issues it, goes through it.
pub struct PrivateApi {
    rest: Arc<dyn RestClient>,
    nonces: NonceAllocator,
    state: RwLock<CredentialState>,
}

impl PrivateApi {
    pub fn new(rest: Arc<dyn RestClient>, nonces: NonceAllocator) -> Self {
        Self {
            rest,
            nonces,
            state: RwLock::new(CredentialState::default()),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.credential.is_some()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Verifies `key`/`secret` with one `getInfo` call and installs them on success.
    ///
    /// Any previous credential is dropped first, so a failed verification
    /// leaves the client unauthenticated.
    pub async fn authenticate(&self, key: &str, secret: &str) -> Result<AccountSnapshot, ApiError> {
        self.invalidate().await;

        let credential = Arc::new(Credential::new(key, secret));
        let verified = match self.query_with(&credential, "getInfo", Vec::new()).await {
            Ok(payload) => AccountSnapshot::parse(&payload),
            Err(err) => Err(err),
        };

        match verified {
            Ok(account) => {
                let mut state = self.state.write().await;
                state.credential = Some(credential);
                state.generation += 1;
                info!(key = %key, "credentials accepted");
                Ok(account)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "credentials rejected");
                Err(ApiError::InvalidCredentials(err.to_string()))
            }
        }
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if state.credential.take().is_some() {
            info!("credentials cleared");
        }
        state.generation += 1;
    }

    /// Invalidates only if no newer credential was installed since `generation`.
    pub async fn invalidate_generation(&self, generation: u64) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation || state.credential.is_none() {
            return false;
        }
        state.credential = None;
        state.generation += 1;
        warn!("credentials invalidated after rejection");
        true
    }

    async fn credential(&self) -> Result<Arc<Credential>, ApiError> {
        self.state
            .read()
            .await
            .credential
            .clone()
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn query(&self, method: &str, params: Vec<(String, String)>) -> Result<String, ApiError> {
        let credential = self.credential().await?;
        self.query_with(&credential, method, params).await
    }

    async fn query_with(
        &self,
        credential: &Credential,
        method: &str,
        params: Vec<(String, String)>,
    ) -> Result<String, ApiError> {
        let request =
            build_authenticated_request(Some(credential), &self.nonces, method, params).await?;
        debug!(method = %method, nonce = request.nonce, "signed request built");
        self.rest.query_private(&request).await
    }

    pub async fn get_account_info(&self) -> Result<AccountSnapshot, ApiError> {
        let payload = self.query("getInfo", Vec::new()).await?;
        AccountSnapshot::parse(&payload)
    }

    pub async fn place_order(
        &self,
        pair: Pair,
        side: TradeSide,
        rate: Decimal,
        amount: Decimal,
    ) -> Result<TradeResult, ApiError> {
        let params = vec![
            ("pair".to_string(), pair.as_str().to_string()),
            ("type".to_string(), side.as_str().to_string()),
            ("rate".to_string(), rate.to_string()),
            ("amount".to_string(), amount.to_string()),
        ];
        let payload = self.query("Trade", params).await?;
        TradeResult::parse(&payload)
    }

    pub async fn get_order_info(&self, order_id: u64) -> Result<OrderSnapshot, ApiError> {
        let params = vec![("order_id".to_string(), order_id.to_string())];
        let payload = self.query("OrderInfo", params).await?;
        OrderSnapshot::parse(&payload)
    }

    pub async fn get_active_orders(&self, pair: Pair) -> Result<OrdersListSnapshot, ApiError> {
        let params = vec![("pair".to_string(), pair.as_str().to_string())];
        let payload = self.query("ActiveOrders", params).await?;
        OrdersListSnapshot::parse(&payload)
    }
}
