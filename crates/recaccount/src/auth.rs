//! Kalshi request signing: API key id + RSA-PSS signature over a PEM
//! private key (spec.md §6). Shared by AccountSync's portfolio polling and,
//! once transformed, TradeExecutor's order placement — both sign the same
//! `timestamp + method + path` message, so the signer lives here rather
//! than being duplicated per caller.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use pkcs8::DecodePrivateKey;
use rsa::pss::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{AccountError, AccountResult};

/// `demo` or `prod`, selected by a per-user `account_mode_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KalshiEnv {
    Demo,
    Prod,
}

impl KalshiEnv {
    pub fn base_url(self) -> &'static str {
        match self {
            KalshiEnv::Demo => "https://demo-api.kalshi.co/trade-api/v2",
            KalshiEnv::Prod => "https://api.elections.kalshi.com/trade-api/v2",
        }
    }
}

impl fmt::Display for KalshiEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KalshiEnv::Demo => write!(f, "demo"),
            KalshiEnv::Prod => write!(f, "prod"),
        }
    }
}

/// Headers required on every authenticated Kalshi request.
pub struct SignedHeaders {
    pub access_key: String,
    pub access_signature: String,
    pub access_timestamp: String,
}

/// Holds the API key id and loaded RSA private key for one user/environment.
/// The key is zeroized-backed in memory and never logged.
pub struct KalshiCredentials {
    key_id: String,
    private_key: RsaPrivateKey,
}

impl KalshiCredentials {
    /// Load from a PEM-encoded PKCS#8 private key, as found at
    /// `users/<user_id>/credentials/kalshi-credentials/{prod,demo}/kalshi.pem`.
    pub fn from_pem(key_id: impl Into<String>, pem: &str) -> AccountResult<Self> {
        let pem = Zeroizing::new(pem.to_string());
        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .map_err(|e| AccountError::Auth(format!("invalid Kalshi PEM key: {e}")))?;
        Ok(Self {
            key_id: key_id.into(),
            private_key,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign `timestamp_ms + method + path` per Kalshi's RSA-PSS scheme and
    /// return the three headers the request must carry.
    pub fn sign(&self, method: &str, path: &str) -> AccountResult<SignedHeaders> {
        let timestamp_ms = Utc::now().timestamp_millis();
        let message = format!("{timestamp_ms}{method}{path}");

        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let mut rng = rand::thread_rng();
        let signature = signing_key.sign_with_rng(&mut rng, message.as_bytes());

        Ok(SignedHeaders {
            access_key: self.key_id.clone(),
            access_signature: BASE64.encode(signature.to_bytes()),
            access_timestamp: timestamp_ms.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_selection() {
        assert!(KalshiEnv::Demo.base_url().contains("demo"));
        assert!(KalshiEnv::Prod.base_url().contains("elections.kalshi"));
    }

    #[test]
    fn test_from_pem_rejects_garbage() {
        let result = KalshiCredentials::from_pem("key-1", "not a pem");
        assert!(result.is_err());
    }
}
