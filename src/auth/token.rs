//! Stateless session tokens: RS256-signed JWTs.
//!
//! Tokens carry subject, email, and role claims and self-expire; there is
//! no revocation list, so the configured TTL is the only invalidation
//! mechanism. Expiry is checked against a single clock with zero leeway.

use chrono::Utc;
use jsonwebtoken::{Algorithm, Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::auth::keys::KeyManager;

/// Claim set carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id, stringified.
    pub sub: String,
    pub email: String,
    /// Open string on the wire; validated into [`crate::auth::Role`]
    /// after verification.
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature checked out but the expiry claim is in the past.
    #[error("token expired")]
    Expired,

    /// Bad signature, wrong issuer, or structurally malformed.
    #[error("invalid token")]
    Invalid,

    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    /// Seconds until expiry, for the login response body.
    pub expires_in: i64,
}

pub struct TokenService {
    issuer: String,
    ttl_seconds: i64,
    keys: Arc<KeyManager>,
}

impl TokenService {
    #[must_use]
    pub const fn new(issuer: String, ttl_seconds: i64, keys: Arc<KeyManager>) -> Self {
        Self {
            issuer,
            ttl_seconds,
            keys,
        }
    }

    /// Issue a token for `subject_id` with the configured TTL.
    pub fn issue(&self, subject_id: i32, email: &str, role: &str) -> Result<IssuedToken, TokenError> {
        self.issue_with_ttl(subject_id, email, role, self.ttl_seconds)
    }

    /// Issue a token with an explicit TTL in seconds.
    pub fn issue_with_ttl(
        &self,
        subject_id: i32,
        email: &str,
        role: &str,
        ttl_seconds: i64,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + ttl_seconds,
        };

        // The kid in the header lets external verifiers pick the right
        // key out of the JWKS document.
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.keys.kid().to_string());

        let access_token =
            encode(&header, &claims, self.keys.encoding_key()).map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            access_token,
            expires_in: ttl_seconds,
        })
    }

    /// Verify signature, issuer, and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        match decode::<Claims>(token, self.keys.decoding_key(), &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}

/// Read the kid from a token header without verifying the token. Used by
/// tests and diagnostics only; never trust an unverified header.
pub fn header_kid(token: &str) -> Option<String> {
    decode_header(token).ok().and_then(|h| h.kid)
}
