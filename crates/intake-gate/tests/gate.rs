use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use intake_gate::{AuthError, ManualClock, RateLimiter, RequestSigner};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn concurrent_callers_never_share_the_last_token() {
    let clock = Arc::new(ManualClock::at_secs(1_000));
    let limiter = RateLimiter::new(1, Duration::from_secs(60)).with_clock(clock);
    let admitted = AtomicUsize::new(0);
    let barrier = Barrier::new(8);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                barrier.wait();
                if limiter.check("acme").is_ok() {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), 1);
}

#[test]
fn signed_request_flow() {
    let clock = Arc::new(ManualClock::at_secs(1_758_355_200));
    let signer = RequestSigner::new("s3cret")
        .expect("signer")
        .with_clock(clock.clone());
    let body = json!({"headers": ["Load ID"], "rows": [["A1"]]});
    let signature = signer.sign(1_758_355_200, &body).expect("sign");

    assert_eq!(signer.verify(1_758_355_200, &body, &signature), Ok(()));

    // Replaying the same request after the skew window is refused.
    clock.advance(Duration::from_secs(301));
    assert!(matches!(
        signer.verify(1_758_355_200, &body, &signature),
        Err(AuthError::StaleTimestamp { .. })
    ));
}

proptest! {
    #[test]
    fn burst_admits_at_most_capacity(capacity in 1u32..20, attempts in 0usize..60) {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let limiter = RateLimiter::new(capacity, Duration::from_secs(60)).with_clock(clock);
        let admitted = (0..attempts).filter(|_| limiter.check("k").is_ok()).count();
        prop_assert_eq!(admitted, attempts.min(capacity as usize));
    }
}
