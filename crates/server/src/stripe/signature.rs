//! `Stripe-Signature` verification.
//!
//! The header looks like `t=1700000000,v1=<hex>[,v1=<hex>...]`; each `v1` is
//! HMAC-SHA256 of `"{t}.{body}"` keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, instrument};

use super::BillingError;

/// Maximum accepted age (either direction) of the signed timestamp.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Compute the `v1` signature for `payload` at `timestamp`.
///
/// # Errors
///
/// Returns `InvalidSignature` if the secret cannot key the MAC.
pub fn sign_payload(
    secret: &SecretString,
    timestamp: i64,
    payload: &str,
) -> Result<String, BillingError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| BillingError::InvalidSignature(e.to_string()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a `Stripe-Signature` header against the raw body.
///
/// `now` is the current unix time in seconds.
///
/// # Errors
///
/// Returns `InvalidSignature` if the header is malformed, the timestamp is
/// outside the tolerance, or no `v1` signature matches.
#[instrument(skip_all)]
pub fn verify_signature(
    secret: &SecretString,
    header: &str,
    payload: &str,
    now: i64,
) -> Result<(), BillingError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| BillingError::InvalidSignature("Invalid timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(BillingError::InvalidSignature(
            "No v1 signature".to_string(),
        ));
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(BillingError::InvalidSignature(
            "Request timestamp outside tolerance".to_string(),
        ));
    }

    let expected = sign_payload(secret, timestamp, payload)?;
    if !signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        return Err(BillingError::InvalidSignature(
            "Signature mismatch".to_string(),
        ));
    }

    debug!("Stripe signature verified");
    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn secret() -> SecretString {
        SecretString::from("whsec_test_secret")
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_valid_signature() {
        let body = r#"{"id":"evt_1"}"#;
        let sig = sign_payload(&secret(), NOW, body).unwrap();
        let header = format!("t={NOW},v1={sig}");

        assert!(verify_signature(&secret(), &header, body, NOW + 10).is_ok());
    }

    #[test]
    fn test_any_v1_may_match() {
        let body = "{}";
        let sig = sign_payload(&secret(), NOW, body).unwrap();
        let header = format!("t={NOW},v1=deadbeef,v1={sig},v0=ignored");

        assert!(verify_signature(&secret(), &header, body, NOW).is_ok());
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let sig = sign_payload(&secret(), NOW, r#"{"amount":1}"#).unwrap();
        let header = format!("t={NOW},v1={sig}");

        let result = verify_signature(&secret(), &header, r#"{"amount":100}"#, NOW);
        assert!(matches!(result, Err(BillingError::InvalidSignature(ref m)) if m == "Signature mismatch"));
    }

    #[test]
    fn test_old_timestamp_is_rejected() {
        let body = "{}";
        let sig = sign_payload(&secret(), NOW, body).unwrap();
        let header = format!("t={NOW},v1={sig}");

        let result = verify_signature(&secret(), &header, body, NOW + SIGNATURE_TOLERANCE_SECS + 1);
        assert!(matches!(result, Err(BillingError::InvalidSignature(ref m)) if m.contains("tolerance")));
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        assert!(verify_signature(&secret(), "v1=abc", "{}", NOW).is_err());
        assert!(verify_signature(&secret(), "t=abc,v1=abc", "{}", NOW).is_err());
        assert!(verify_signature(&secret(), &format!("t={NOW}"), "{}", NOW).is_err());
    }
}
