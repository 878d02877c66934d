use thiserror::Error;

/// Why a signed request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("signature is not valid hex")]
    MalformedSignature,
    #[error("signature does not match request body")]
    SignatureMismatch,
    #[error("timestamp {timestamp} is more than {skew_secs}s from server time {now}")]
    StaleTimestamp {
        timestamp: i64,
        now: i64,
        skew_secs: u64,
    },
}

/// A caller exhausted its token bucket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rate limit exceeded for '{key}'; retry in {retry_after_ms} ms")]
pub struct RateLimited {
    pub key: String,
    pub retry_after_ms: u64,
}
