//! Human-readable document number generation.
//!
//! Numbers keep the `PREFIX-<unix seconds>` shape operators are used to, with
//! a per-process counter suffix so two documents created within the same
//! second never collide. Uniqueness across processes is still backed by the
//! unique index on the number column.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;

pub struct NumberSequence {
    prefix: String,
    counter: AtomicU32,
}

impl NumberSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU32::new(0),
        }
    }

    pub fn next(&self) -> String {
        let seconds = Utc::now().timestamp();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) % 10_000;
        format!("{}-{}{:04}", self.prefix, seconds, seq)
    }
}
