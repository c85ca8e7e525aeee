//! Time-to-live math for absolute deadlines expressed in Unix seconds.

use chrono::Utc;
use serde::Serialize;
use std::fmt;

/// Current wall-clock time in Unix seconds.
pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

/// Seconds left until `deadline`, clamped at zero once it has passed.
pub fn remaining_secs(deadline: i64, now: i64) -> u64 {
    u64::try_from(deadline.saturating_sub(now)).unwrap_or(0)
}

/// True once `now` is strictly past `deadline`. A missing deadline never passes.
pub fn is_past(deadline: Option<i64>, now: i64) -> bool {
    deadline.is_some_and(|d| now > d)
}

/// Remaining time for an optional deadline, rendered as `"<n>s"` or `"n/a"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ttl(pub Option<u64>);

impl Ttl {
    pub fn of(deadline: Option<i64>, now: i64) -> Self {
        Ttl(deadline.map(|d| remaining_secs(d, now)))
    }

    pub fn secs(self) -> Option<u64> {
        self.0
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(secs) => write!(f, "{secs}s"),
            None => f.write_str("n/a"),
        }
    }
}
