//! Signed bearer tokens for session authentication.
//!
//! A token is `"{user_id}.{expiry_unix}.{signature}"` where the signature is
//! an HMAC-SHA256 over the first two segments. The server keeps no session
//! state; possession of a token with a valid signature and an unexpired
//! timestamp is the session.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

type HmacSha256 = Hmac<Sha256>;

/// The verified contents of a bearer token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthToken {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// When the token stops being valid.
    pub expires_at: OffsetDateTime,
}

impl AuthToken {
    /// Create a token for `user_id` that expires after `valid_for`.
    pub fn new(user_id: UserID, valid_for: Duration) -> Self {
        Self {
            user_id,
            expires_at: OffsetDateTime::now_utc() + valid_for,
        }
    }

    /// Produce the signed string form of this token.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the key is rejected by the HMAC
    /// implementation.
    pub fn sign(&self, key: &[u8]) -> Result<String, Error> {
        let payload = format!("{}.{}", self.user_id.as_i64(), self.expires_at.unix_timestamp());

        Ok(format!("{payload}.{}", sign(&payload, key)?))
    }

    /// Verify a token string and extract its contents.
    ///
    /// # Errors
    ///
    /// Returns [Error::Unauthorized] if the token is malformed, carries a bad
    /// signature, or has expired as of `now`.
    pub fn verify(token: &str, key: &[u8], now: OffsetDateTime) -> Result<Self, Error> {
        let (payload, signature) = token.rsplit_once('.').ok_or(Error::Unauthorized)?;
        let (raw_user_id, raw_expiry) = payload.split_once('.').ok_or(Error::Unauthorized)?;

        let signature_bytes = BASE64.decode(signature).map_err(|_| Error::Unauthorized)?;
        let mut mac =
            HmacSha256::new_from_slice(key).map_err(|error| Error::HashingError(error.to_string()))?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature_bytes)
            .map_err(|_| Error::Unauthorized)?;

        // Only trust the payload contents once the signature has checked out.
        let user_id: i64 = raw_user_id.parse().map_err(|_| Error::Unauthorized)?;
        let expiry_unix: i64 = raw_expiry.parse().map_err(|_| Error::Unauthorized)?;
        let expires_at =
            OffsetDateTime::from_unix_timestamp(expiry_unix).map_err(|_| Error::Unauthorized)?;

        if expires_at <= now {
            return Err(Error::Unauthorized);
        }

        Ok(Self {
            user_id: UserID::new(user_id),
            expires_at,
        })
    }
}

fn sign(payload: &str, key: &[u8]) -> Result<String, Error> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|error| Error::HashingError(error.to_string()))?;
    mac.update(payload.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
