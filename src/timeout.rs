// This file is part of the diffalign package.
//
// For the full copyright and license information, please view the LICENSE-*
// files that was distributed with this source code.

use std::cell::Cell;
use std::time::{Duration, Instant};

use tracing::debug;

/// The clock is only read once every this many probes.
pub(crate) const TIMEOUT_CHECK_INTERVAL: u32 = 64;

/// Time budget for a single diff computation.
///
/// A `Timeout` is created fresh for every call and never shared between
/// calls. Once it reports expiry it stays expired, so every algorithm that
/// runs after the budget ran out takes its cheap fallback path.
#[derive(Debug)]
pub struct Timeout {
    deadline: Option<Instant>,
    probes: Cell<u32>,
    expired: Cell<bool>,
}

impl Timeout {
    /// A budget of `max_ms` milliseconds starting now; `0` means unlimited.
    pub fn new(max_ms: u64) -> Self {
        let deadline = if max_ms == 0 {
            None
        } else {
            Instant::now().checked_add(Duration::from_millis(max_ms))
        };
        Self {
            deadline,
            probes: Cell::new(0),
            expired: Cell::new(false),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Returns `false` once the budget is used up.
    pub fn is_valid(&self) -> bool {
        let Some(deadline) = self.deadline else {
            return true;
        };
        if self.expired.get() {
            return false;
        }
        let probes = self.probes.get();
        self.probes.set(probes.wrapping_add(1));
        if probes % TIMEOUT_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
            debug!(probes = probes, "time budget exhausted");
            self.expired.set(true);
            return false;
        }
        true
    }

    pub fn is_expired(&self) -> bool {
        self.expired.get()
    }
}
