// SPDX-License-Identifier: MIT

//! Full-jitter exponential backoff between retry attempts.

use std::time::Duration;

/// `rand::random::<f64>() * base * 2^(attempt_index)`, capped well below
/// overflow. `attempt_index` is zero for the delay before the second try.
pub fn full_jitter(base: Duration, attempt_index: u32) -> Duration {
    let exp = attempt_index.min(20);
    let cap_ms = base.as_millis().saturating_mul(1u128 << exp).min(u64::MAX as u128) as u64;
    let jittered = (rand::random::<f64>() * cap_ms as f64) as u64;
    Duration::from_millis(jittered)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
