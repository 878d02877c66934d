//! HMAC-SHA256 request signatures.
//!
//! The signed message is `"{timestamp}.{canonical body}"`, so a signature
//! is bound to both the payload and the moment it was produced. Verification
//! rejects timestamps outside the skew window in either direction.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::debug;

use crate::canonical::canonical_json;
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Accepted distance between a request timestamp and server time.
pub const DEFAULT_SKEW: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct RequestSigner {
    secret: Vec<u8>,
    skew: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("skew", &self.skew)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        Ok(Self {
            secret,
            skew: DEFAULT_SKEW,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_skew(mut self, skew: Duration) -> Self {
        self.skew = skew;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn mac(&self, timestamp: i64, body: &Value) -> Result<HmacSha256, AuthError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::EmptySecret)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(canonical_json(body).as_bytes());
        Ok(mac)
    }

    /// Lowercase hex signature of `body` at `timestamp` (Unix seconds).
    pub fn sign(&self, timestamp: i64, body: &Value) -> Result<String, AuthError> {
        let mac = self.mac(timestamp, body)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks freshness, then the signature in constant time.
    pub fn verify(&self, timestamp: i64, body: &Value, signature: &str) -> Result<(), AuthError> {
        let now = self.clock.now_secs();
        let skew_secs = self.skew.as_secs();
        if now.abs_diff(timestamp) > skew_secs {
            debug!(timestamp, now, "rejecting stale signature");
            return Err(AuthError::StaleTimestamp {
                timestamp,
                now,
                skew_secs,
            });
        }

        let expected = hex::decode(signature.trim()).map_err(|_| AuthError::MalformedSignature)?;
        self.mac(timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| AuthError::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::clock::ManualClock;

    const NOW: u64 = 1_758_355_200;

    fn signer() -> RequestSigner {
        RequestSigner::new("s3cret")
            .unwrap()
            .with_clock(Arc::new(ManualClock::at_secs(NOW)))
    }

    #[test]
    fn signature_ignores_key_order() {
        let signer = signer();
        let a = signer.sign(1, &json!({"a": 1, "b": [1, 2]})).unwrap();
        let b = signer.sign(1, &json!({"b": [1, 2], "a": 1})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn fresh_signature_verifies() {
        let signer = signer();
        let body = json!({"headers": ["Load ID"], "rows": []});
        let ts = NOW as i64 - 300;
        let sig = signer.sign(ts, &body).unwrap();
        assert_eq!(signer.verify(ts, &body, &sig), Ok(()));
    }

    #[test]
    fn skew_is_enforced_both_ways() {
        let signer = signer();
        let body = json!({});
        for ts in [NOW as i64 - 301, NOW as i64 + 301] {
            let sig = signer.sign(ts, &body).unwrap();
            assert!(matches!(
                signer.verify(ts, &body, &sig),
                Err(AuthError::StaleTimestamp { .. })
            ));
        }
    }

    #[test]
    fn tampering_and_garbage_are_rejected() {
        let signer = signer();
        let ts = NOW as i64;
        let sig = signer.sign(ts, &json!({"id": "A1"})).unwrap();
        assert_eq!(
            signer.verify(ts, &json!({"id": "A2"}), &sig),
            Err(AuthError::SignatureMismatch)
        );
        assert_eq!(
            signer.verify(ts, &json!({"id": "A1"}), "zz-not-hex"),
            Err(AuthError::MalformedSignature)
        );
        assert_eq!(
            signer.verify(ts, &json!({"id": "A1"}), &sig[..10]),
            Err(AuthError::SignatureMismatch)
        );
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            RequestSigner::new(Vec::<u8>::new()),
            Err(AuthError::EmptySecret)
        ));
    }
}
