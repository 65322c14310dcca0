//! HMAC verification for records submitted by the SMS ingestion bridge.
//!
//! The bridge accepts unauthenticated local input, so every record it
//! forwards must carry a keyed hash over the canonical request fields. A
//! request whose tag does not match was tampered with (or forged) somewhere
//! between the SMS parser and this server.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{
    Error,
    expense::Category,
    transaction::Platform,
};

type HmacSha256 = Hmac<Sha256>;

/// How mismatched authenticity tags are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Reject requests whose tag does not verify. The default.
    Strict,
    /// Log the anomaly but admit the record. Backward-compatibility path for
    /// bridge builds that predate tagging; opt-in only.
    Permissive,
}

/// The canonical string a transaction tag is computed over.
///
/// The amount is rendered with exactly two decimal places so both ends agree
/// on the bytes being signed.
pub fn transaction_canonical(tx_ref: &str, amount: f64, platform: Platform) -> String {
    format!("{tx_ref}:{amount:.2}:{platform}")
}

/// The canonical string an expense tag is computed over.
///
/// The description is truncated to its first 50 characters; expenses have no
/// external reference so the fixed `EXPENSE` prefix takes its place.
pub fn expense_canonical(amount: f64, category: Category, description: &str) -> String {
    let truncated: String = description.chars().take(50).collect();

    format!("EXPENSE:{amount:.2}:{category}:{truncated}")
}

/// Compute the base64 authenticity tag for a canonical string.
///
/// # Errors
///
/// Returns [Error::HashingError] if the key is rejected by the HMAC
/// implementation.
pub fn compute_tag(secret: &[u8], canonical: &str) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|error| Error::HashingError(error.to_string()))?;
    mac.update(canonical.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Check a caller-supplied tag against the canonical string.
///
/// Comparison happens in constant time via the HMAC finalization, never by
/// comparing strings directly.
///
/// `tag_required` distinguishes the two ingestion paths: the bridge must
/// always present a tag, while an authenticated caller entering data by hand
/// may omit it.
///
/// # Errors
///
/// Returns [Error::AuthenticityMismatch] if the tag is required but missing,
/// or if it fails verification in [IngestMode::Strict].
pub fn check_tag(
    mode: IngestMode,
    secret: &[u8],
    canonical: &str,
    tag: Option<&str>,
    tag_required: bool,
) -> Result<(), Error> {
    let tag = match tag {
        Some(tag) => tag,
        None if tag_required => {
            tracing::warn!("rejecting ingestion request with no authenticity tag");
            return Err(Error::AuthenticityMismatch);
        }
        None => return Ok(()),
    };

    if verify_tag(secret, canonical, tag)? {
        return Ok(());
    }

    match mode {
        IngestMode::Strict => Err(Error::AuthenticityMismatch),
        IngestMode::Permissive => {
            tracing::warn!(
                "authenticity tag mismatch for {:?}, admitting record in permissive mode",
                canonical
            );
            Ok(())
        }
    }
}

fn verify_tag(secret: &[u8], canonical: &str, tag: &str) -> Result<bool, Error> {
    let tag_bytes = match BASE64.decode(tag) {
        Ok(bytes) => bytes,
        // An undecodable tag can never verify.
        Err(_) => return Ok(false),
    };

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|error| Error::HashingError(error.to_string()))?;
    mac.update(canonical.as_bytes());

    Ok(mac.verify_slice(&tag_bytes).is_ok())
}
