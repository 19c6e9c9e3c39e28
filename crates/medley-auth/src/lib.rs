//! Signed bearer tokens for the menu backend.
//!
//! Tokens are compact three-part strings:
//! `base64url(header) . base64url(claims) . base64url(tag)`, where the
//! header names the signing key (`kid`) and the tag is HMAC-SHA256 over
//! the first two parts with that key. A [`Keyring`] holds the known
//! signing keys; verification is a single pass with no caching of
//! results and no revocation list.
//!
//! Claims carry a subject, an expiry, and a `permissions` list; handlers
//! demand one permission each. A missing permission is the only failure
//! that is "forbidden"; every other defect in the token is
//! "unauthorized", and the HTTP layer maps the two accordingly.

use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const B64: base64::engine::general_purpose::GeneralPurpose =
    base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// The only algorithm tokens may name.
const ALG: &str = "HS256";

/// Default clock-skew allowance when checking expiry.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Errors that can occur verifying or issuing a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` header was presented.
    #[error("authorization header missing or not a bearer token")]
    MissingBearer,
    /// The token is not three base64url parts, or a part fails to decode.
    #[error("malformed token")]
    Malformed,
    /// The header names an algorithm other than HS256.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// The header names a key the keyring does not hold.
    #[error("unknown key id: {0}")]
    UnknownKey(String),
    /// The tag does not match the signed content.
    #[error("signature mismatch")]
    BadSignature,
    /// The token expired more than the leeway ago.
    #[error("token expired")]
    Expired,
    /// The claims lack the demanded permission.
    #[error("permission not granted: {0}")]
    MissingPermission(String),
    /// Key material could not be decoded.
    #[error("invalid key material for key id: {0}")]
    InvalidKey(String),
}

/// Token header: algorithm and signing key id.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    alg: String,
    kid: String,
}

/// Verified token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject the token was issued to.
    pub sub: String,
    /// Granted permission scopes, e.g. `post:drinks`.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Issued-at (unix seconds).
    pub iat: u64,
    /// Expiry (unix seconds).
    pub exp: u64,
}

impl Claims {
    /// Demands one permission scope.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingPermission`] when the scope is absent.
    pub fn require(&self, permission: &str) -> Result<(), AuthError> {
        if self.permissions.iter().any(|p| p == permission) {
            return Ok(());
        }
        Err(AuthError::MissingPermission(permission.to_string()))
    }
}

/// The set of signing keys the service trusts, by key id.
#[derive(Debug, Clone)]
pub struct Keyring {
    keys: HashMap<String, Vec<u8>>,
    leeway_secs: u64,
}

impl Default for Keyring {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyring {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Overrides the expiry leeway (seconds).
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Adds a key under a key id.
    pub fn insert(&mut self, kid: impl Into<String>, secret: impl Into<Vec<u8>>) {
        self.keys.insert(kid.into(), secret.into());
    }

    /// Builds a keyring from `(kid, hex-encoded secret)` pairs, the shape
    /// key material takes in configuration.
    pub fn from_hex_entries<'a, I>(entries: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ring = Self::new();
        for (kid, hex_secret) in entries {
            let secret =
                hex::decode(hex_secret).map_err(|_| AuthError::InvalidKey(kid.to_string()))?;
            ring.insert(kid, secret);
        }
        Ok(ring)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Issues a signed token for `claims` under the named key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownKey`] if the keyring has no such key.
    pub fn issue(&self, kid: &str, claims: &Claims) -> Result<String, AuthError> {
        let secret = self
            .keys
            .get(kid)
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))?;

        let header = Header {
            alg: ALG.to_string(),
            kid: kid.to_string(),
        };
        // Serializing our own structs cannot fail; treat it as malformed
        // rather than panicking if it somehow does.
        let header_b64 =
            B64.encode(serde_json::to_vec(&header).map_err(|_| AuthError::Malformed)?);
        let claims_b64 =
            B64.encode(serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?);

        let signing_input = format!("{}.{}", header_b64, claims_b64);
        let mut mac =
            HmacSha256::new_from_slice(secret).map_err(|_| AuthError::InvalidKey(kid.to_string()))?;
        mac.update(signing_input.as_bytes());
        let tag = mac.finalize().into_bytes();

        Ok(format!("{}.{}", signing_input, B64.encode(tag)))
    }

    /// Verifies a token and returns its claims.
    ///
    /// `now` is the caller's clock (unix seconds); expiry is checked
    /// against it with the configured leeway. Permission checks are the
    /// caller's job, via [`Claims::require`].
    pub fn verify(&self, token: &str, now: u64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, tag_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(t), None) => (h, c, t),
                _ => return Err(AuthError::Malformed),
            };

        let header_bytes = B64.decode(header_b64).map_err(|_| AuthError::Malformed)?;
        let header: Header =
            serde_json::from_slice(&header_bytes).map_err(|_| AuthError::Malformed)?;

        if header.alg != ALG {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }
        let secret = self
            .keys
            .get(&header.kid)
            .ok_or(AuthError::UnknownKey(header.kid))?;

        let signing_input = format!("{}.{}", header_b64, claims_b64);
        let tag = B64.decode(tag_b64).map_err(|_| AuthError::Malformed)?;
        let mut mac =
            HmacSha256::new_from_slice(secret).map_err(|_| AuthError::BadSignature)?;
        mac.update(signing_input.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&tag).map_err(|_| AuthError::BadSignature)?;

        // Only decode claims once the signature is trusted.
        let claims_bytes = B64.decode(claims_b64).map_err(|_| AuthError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| AuthError::Malformed)?;

        if claims.exp.saturating_add(self.leeway_secs) < now {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
///
/// # Errors
///
/// Returns [`AuthError::MissingBearer`] when the value is absent or not
/// a bearer scheme.
pub fn bearer_token(header_value: Option<&str>) -> Result<&str, AuthError> {
    header_value
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingBearer)
}
