//! Boundary collaborators for the intake service.
//!
//! - **canonical**: key-sorted compact JSON text used as signing input
//! - **signature**: HMAC-SHA256 request signatures with a replay skew window
//! - **rate_limit**: per-caller token buckets over an injectable clock and store

pub mod canonical;
pub mod clock;
pub mod error;
pub mod rate_limit;
pub mod signature;

pub use canonical::canonical_json;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, RateLimited};
pub use rate_limit::{Bucket, BucketStore, InMemoryBucketStore, RateLimiter};
pub use signature::{DEFAULT_SKEW, RequestSigner};
