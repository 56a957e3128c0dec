//! Bearer credential claim decoding.
//!
//! The credential is a JWT. Only the payload's `exp` claim is read; the signature
//! is the backend's concern.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: f64,
}

/// Expiry embedded in a credential, or `None` when the credential is malformed
/// or carries no usable `exp` claim.
pub fn decode_expiry(credential: &str) -> Option<DateTime<Utc>> {
    let mut parts = credential.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    if !claim.exp.is_finite() {
        return None;
    }

    let millis = (claim.exp * 1000.0).floor() as i64;
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// An unsigned credential whose `exp` claim is `expires_at`.
    pub fn credential_expiring_at(expires_at: DateTime<Utc>) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "exp": expires_at.timestamp(), "sub": "u1" }).to_string(),
        );
        format!("{header}.{payload}.signature")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::credential_expiring_at;
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_decode_expiry() {
        let expires_at = Utc.timestamp_opt(1_900_000_000, 0).unwrap();
        assert_eq!(
            decode_expiry(&credential_expiring_at(expires_at)),
            Some(expires_at)
        );
    }

    #[test]
    fn test_malformed_credentials() {
        assert_eq!(decode_expiry(""), None);
        assert_eq!(decode_expiry("not-a-jwt"), None);
        assert_eq!(decode_expiry("a.b"), None);
        assert_eq!(decode_expiry("a.!!!.c"), None);

        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"u1"}"#);
        assert_eq!(decode_expiry(&format!("h.{payload}.s")), None);

        let valid = credential_expiring_at(Utc::now() + Duration::hours(1));
        assert_eq!(decode_expiry(&format!("{valid}.extra")), None);
    }
}
