use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp forced strictly increasing process-wide. Time-based
/// ids and upload names share this source, so two stamps taken in the same
/// millisecond still come out distinct.
pub fn next_millis() -> i64 {
    let mut prev = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let now = Utc::now().timestamp_millis();
        let next = if now > prev { now } else { prev + 1 };
        match LAST_STAMP.compare_exchange(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

pub fn next_id() -> String {
    next_millis().to_string()
}
