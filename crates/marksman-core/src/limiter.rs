//! Per-identity sliding-window rate limiting.
//!
//! One process-wide limiter gates admission for all grading requests. Each
//! identity owns an ascending window of request timestamps, pruned on every
//! check. All reads and mutations go through a single lock because
//! concurrent requests from the same identity race on the same record.
//!
//! Correctness is guaranteed within one process only; a deployment spanning
//! multiple processes needs this backed by a shared store.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Sweep cadence for dropping identities whose windows have fully expired.
const GC_EVERY_CHECKS: u64 = 1024;

/// Subscription tiers with their admission limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Basic,
    Premium,
}

impl Tier {
    /// Requests admitted per window.
    pub fn limit(&self) -> usize {
        match self {
            Tier::Free => 5,
            Tier::Basic => 15,
            Tier::Premium => 50,
        }
    }

    /// Window duration.
    pub fn window(&self) -> Duration {
        Duration::from_secs(60)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Basic => write!(f, "basic"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "basic" => Ok(Tier::Basic),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    /// Whether the request was admitted.
    pub allowed: bool,
    /// Admissions left in the current window (0 when denied).
    pub remaining: usize,
    /// When capacity next frees up: the oldest retained timestamp plus the
    /// window duration.
    pub reset_at: Instant,
}

impl RateDecision {
    /// Seconds until capacity frees up, for a `Retry-After` header.
    pub fn retry_after_secs(&self, now: Instant) -> u64 {
        self.reset_at.saturating_duration_since(now).as_secs()
    }
}

struct LimiterState {
    records: HashMap<String, VecDeque<Instant>>,
    checks: u64,
}

/// Process-wide sliding-window rate limiter.
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LimiterState {
                records: HashMap::new(),
                checks: 0,
            }),
        }
    }

    /// Check admission for `identity` at `tier`.
    ///
    /// Synchronous and non-suspending: never waits for capacity. Admits by
    /// appending the current time to the identity's window.
    pub fn check(&self, identity: &str, tier: Tier) -> RateDecision {
        self.check_at(identity, tier, Instant::now())
    }

    fn check_at(&self, identity: &str, tier: Tier, now: Instant) -> RateDecision {
        let limit = tier.limit();
        let window = tier.window();

        let mut state = self.state.lock().expect("rate limiter lock poisoned");

        state.checks += 1;
        if state.checks % GC_EVERY_CHECKS == 0 {
            // Stale identities are swept lazily rather than on a timer.
            state
                .records
                .retain(|_, times| times.back().is_some_and(|t| now < *t + window));
        }

        let times = state.records.entry(identity.to_string()).or_default();
        while times.front().is_some_and(|t| now >= *t + window) {
            times.pop_front();
        }

        if times.len() < limit {
            times.push_back(now);
            let oldest = *times.front().expect("window non-empty after admission");
            RateDecision {
                allowed: true,
                remaining: limit - times.len(),
                reset_at: oldest + window,
            }
        } else {
            let oldest = *times.front().expect("window full");
            RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: oldest + window,
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
