use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::utils::NonceAllocator;

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 keyed with the account secret. The secret itself is not kept.
#[derive(Clone)]
pub struct RequestSigner {
    mac: HmacSha512,
}

impl RequestSigner {
    pub fn new(secret: &str) -> Self {
        let mac = HmacSha512::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        Self { mac }
    }

    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

pub struct Credential {
    key: String,
    signer: RequestSigner,
    complete: bool,
}

impl Credential {
    pub fn new(key: &str, secret: &str) -> Self {
        Self {
            key: key.to_string(),
            signer: RequestSigner::new(secret),
            complete: !key.is_empty() && !secret.is_empty(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("key", &self.key).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: String,
    pub nonce: u64,
    pub key: String,
    pub sign: String,
    pub body: String,
}

pub fn encode_params(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

/// Builds a signed private request, consuming exactly one nonce.
///
/// Fails with [`ApiError::NotAuthenticated`] before touching the nonce when no
/// usable credential is present.
pub async fn build_authenticated_request(
    credential: Option<&Credential>,
    nonces: &NonceAllocator,
    method: &str,
    params: Vec<(String, String)>,
) -> Result<SignedRequest, ApiError> {
    let credential = match credential {
        Some(credential) if credential.complete => credential,
        _ => return Err(ApiError::NotAuthenticated),
    };

    let nonce = nonces.next().await;

    let mut fields = Vec::with_capacity(params.len() + 2);
    fields.push(("method".to_string(), method.to_string()));
    fields.extend(params);
    fields.push(("nonce".to_string(), nonce.to_string()));

    let body = encode_params(&fields);
    let sign = credential.signer.sign(body.as_bytes());

    Ok(SignedRequest {
        method: method.to_string(),
        nonce,
        key: credential.key.clone(),
        sign,
        body,
    })
}
