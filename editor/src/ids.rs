//! Injectable id generators and the wall clock.
//!
//! Factories and commands never reach for global state: callers pass an
//! [`IdGenerator`] and, when determinism matters, an explicit timestamp.

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;

use uuid::Uuid;
use web_time::{SystemTime, UNIX_EPOCH};

/// Source of fresh entity ids.
pub trait IdGenerator {
    /// Next id with the given prefix, e.g. `flight_1a`.
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Deterministic `<prefix>_<base36 counter>` ids. The counter is shared
/// across prefixes and starts at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after `counter`.
    #[must_use]
    pub fn starting_after(counter: u64) -> Self {
        Self { counter }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}_{}", to_base36(self.counter))
    }
}

/// Random `<prefix>_<uuid>` ids for multi-writer sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}_{}", Uuid::new_v4().simple())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Current wall-clock time in Unix milliseconds. Reads `Date.now()` on
/// wasm32, where the std clock is unavailable.
#[must_use]
pub fn now_ms() -> i64 {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX)
}
