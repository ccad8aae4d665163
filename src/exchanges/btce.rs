use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use super::signer::SignedRequest;
use super::{PublicResource, RestClient};
use crate::error::ApiError;
use crate::models::Pair;

const BTCE_API_URL: &str = "https://btc-e.com";
const BTCE_API_VERSION: &str = "2";
const BTCE_API_TIMEOUT: u64 = 10;

#[derive(Debug, Clone)]
pub struct BtceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for BtceConfig {
    fn default() -> Self {
        Self {
            base_url: BTCE_API_URL.to_string(),
            timeout: Duration::from_secs(BTCE_API_TIMEOUT),
        }
    }
}

/// HTTP transport for the public `api/2` endpoints and the private `tapi` endpoint.
pub struct BtceClient {
    http: reqwest::Client,
    config: BtceConfig,
}

impl BtceClient {
    pub fn new(config: BtceConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    pub fn public_url(&self, resource: PublicResource, pair: Pair) -> String {
        format!(
            "{}/api/{}/{}/{}",
            self.base_url(),
            BTCE_API_VERSION,
            pair.as_str(),
            resource.as_str()
        )
    }

    pub fn private_url(&self) -> String {
        format!("{}/tapi", self.base_url())
    }

    fn get_headers(request: &SignedRequest) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(
            "Key",
            HeaderValue::from_str(&request.key)
                .map_err(|_| ApiError::InvalidCredentials("API key is not a valid header value".to_string()))?,
        );
        headers.insert(
            "Sign",
            HeaderValue::from_str(&request.sign)
                .map_err(|e| ApiError::Transport(format!("Invalid signature header: {}", e)))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl RestClient for BtceClient {
    async fn query_public(&self, resource: PublicResource, pair: Pair) -> Result<String, ApiError> {
        let api_endpoint = self.public_url(resource, pair);
        debug!(url = %api_endpoint, "public request");
        let response = self
            .http
            .get(&api_endpoint)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn query_private(&self, request: &SignedRequest) -> Result<String, ApiError> {
        debug!(method = %request.method, nonce = request.nonce, "private request");
        let response = self
            .http
            .post(self.private_url())
            .headers(BtceClient::get_headers(request)?)
            .body(request.body.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}
