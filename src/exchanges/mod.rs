// Venue plumbing: REST transport seam, request signing and the private API.
pub mod btce;
pub mod private;
pub mod signer;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::Pair;
use signer::SignedRequest;

pub use btce::{BtceClient, BtceConfig};
pub use private::PrivateApi;
pub use signer::{Credential, RequestSigner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicResource {
    Ticker,
    Fee,
}

impl PublicResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicResource::Ticker => "ticker",
            PublicResource::Fee => "fee",
        }
    }
}

/// Raw request/response access to the venue. Implementations return the
/// response body untouched; parsing happens in the snapshot types.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn query_public(&self, resource: PublicResource, pair: Pair) -> Result<String, ApiError>;

    async fn query_private(&self, request: &SignedRequest) -> Result<String, ApiError>;
}
