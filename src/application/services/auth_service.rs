//! Authentication service for the admin API token.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Authenticates admin requests via a Bearer token.
///
/// Only the HMAC-SHA256 digest of the configured token (keyed by
/// `signing_secret`) is kept in memory; presented tokens are verified against
/// it in constant time.
pub struct AuthService {
    signing_secret: Vec<u8>,
    token_digest: Vec<u8>,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `api_token` - the token clients must present
    /// - `signing_secret` - HMAC key used to digest the token
    pub fn new(api_token: &str, signing_secret: impl Into<Vec<u8>>) -> Self {
        let signing_secret = signing_secret.into();
        let token_digest = Self::mac(&signing_secret, api_token)
            .finalize()
            .into_bytes()
            .to_vec();

        Self {
            signing_secret,
            token_digest,
        }
    }

    fn mac(secret: &[u8], token: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        mac
    }

    /// Checks a raw token against the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token does not match.
    pub fn authenticate(&self, token: &str) -> Result<(), AppError> {
        Self::mac(&self.signing_secret, token)
            .verify_slice(&self.token_digest)
            .map_err(|_| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Invalid API token"}))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_success() {
        let service = AuthService::new("valid-token", "test-signing-secret");
        assert!(service.authenticate("valid-token").is_ok());
    }

    #[test]
    fn test_authenticate_invalid_token() {
        let service = AuthService::new("valid-token", "test-signing-secret");

        let result = service.authenticate("invalid-token");

        assert!(matches!(result.unwrap_err(), AppError::Unauthorized { .. }));
    }

    #[test]
    fn test_authenticate_empty_token() {
        let service = AuthService::new("valid-token", "test-signing-secret");
        assert!(service.authenticate("").is_err());
    }

    #[test]
    fn test_digest_depends_on_secret() {
        let a = AuthService::new("token", "secret-a");
        let b = AuthService::new("token", "secret-b");

        assert_ne!(a.token_digest, b.token_digest);
        assert_eq!(a.token_digest.len(), 32);
    }
}
