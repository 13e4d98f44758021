// src/leaky_bucket.rs

// leaky-limiter: a single-tenant leaky bucket with lazy, timestamp-driven leaking.

// dependencies
use crate::clock::{Clock, SystemClock};
use crate::config::LeakyBucketConfig;
use crate::errors::{LeakyBucketError, require_positive};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// A single leaky bucket.
/// C is the clock type, defaulting to SystemClock.
/// The level only changes inside `check_cost`, under the bucket's mutex, so
/// concurrent callers can never hold more than `capacity` units between them.
#[derive(Debug)]
pub struct LeakyBucket<C = SystemClock>
where
    C: Clock,
{
    capacity: f64,
    leak_rate: f64,
    state: Mutex<BucketState>,
    clock: C,
}

// mutable part of a bucket; `last_update_nanos` stays None until the first decision
#[derive(Debug, Clone, Copy, Default)]
struct BucketState {
    level: f64,
    last_update_nanos: Option<u64>,
}

impl BucketState {
    // level after draining up to `now`, without recording anything
    fn leaked_level(&self, now_nanos: u64, leak_rate: f64) -> f64 {
        match self.last_update_nanos {
            None => self.level,
            Some(last) => {
                // a clock that stepped backwards counts as zero elapsed time
                let elapsed_nanos = now_nanos.saturating_sub(last) as f64;
                let drained = elapsed_nanos * leak_rate / NANOS_PER_SECOND;
                (self.level - drained).max(0.0)
            }
        }
    }

    fn leak(&mut self, now_nanos: u64, leak_rate: f64) {
        if let Some(last) = self.last_update_nanos {
            if now_nanos < last {
                warn!(
                    last_update_nanos = last,
                    now_nanos, "clock went backwards; treating elapsed time as zero"
                );
            }
        }
        self.level = self.leaked_level(now_nanos, leak_rate);
        self.last_update_nanos = Some(now_nanos);
    }

    // whole nanoseconds after the last update until `cost` fits, checked with
    // the same arithmetic the next leak will use; `cost` must not exceed capacity
    fn nanos_until_fits(&self, cost: f64, capacity: f64, leak_rate: f64) -> u64 {
        let start = self.last_update_nanos.unwrap_or(0);
        let fits_after = |nanos: u64| {
            self.leaked_level(start.saturating_add(nanos), leak_rate) + cost <= capacity
        };

        let excess = self.level + cost - capacity;
        let mut nanos = (excess * NANOS_PER_SECOND / leak_rate).ceil().max(0.0) as u64;
        let mut step = 1u64;
        while !fits_after(nanos) && nanos < u64::MAX {
            nanos = nanos.saturating_add(step);
            step = step.saturating_mul(2);
        }
        nanos
    }
}

// methods for the LeakyBucket type
impl<C> LeakyBucket<C>
where
    C: Clock,
{
    /// Create a bucket holding at most `capacity` units and draining
    /// `leak_rate` units per second. Both must be positive and finite.
    pub fn new(capacity: f64, leak_rate: f64, clock: C) -> Result<Self, LeakyBucketError> {
        let capacity = require_positive("capacity", capacity)?;
        let leak_rate = require_positive("leak_rate", leak_rate)?;
        Ok(Self::from_validated(capacity, leak_rate, clock))
    }

    // parameters already checked by the caller
    pub(crate) fn from_validated(capacity: f64, leak_rate: f64, clock: C) -> Self {
        Self {
            capacity,
            leak_rate,
            state: Mutex::new(BucketState::default()),
            clock,
        }
    }

    // method to create a new bucket from a config object
    pub fn with_config(config: LeakyBucketConfig, clock: C) -> Result<Self, LeakyBucketError> {
        config.validate()?;
        Ok(Self::from_validated(config.capacity, config.leak_rate, clock))
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn leak_rate(&self) -> f64 {
        self.leak_rate
    }

    /// Try to admit a single unit.
    pub fn allow(&self) -> Result<bool, LeakyBucketError> {
        self.allow_cost(1.0)
    }

    /// Try to admit `cost` units. Returns `Ok(false)` when the bucket has no
    /// room; that is the normal answer under overload, not an error.
    pub fn allow_cost(&self, cost: f64) -> Result<bool, LeakyBucketError> {
        self.check_cost(cost).map(|decision| decision.allowed)
    }

    /// Like `allow`, but returns the decision with its metadata.
    pub fn check(&self) -> Result<LeakyBucketDecision, LeakyBucketError> {
        self.check_cost(1.0)
    }

    /// Leak, then admit `cost` units if `level + cost <= capacity`.
    /// Invalid costs and clock failures leave the bucket untouched.
    pub fn check_cost(&self, cost: f64) -> Result<LeakyBucketDecision, LeakyBucketError> {
        let cost = require_positive("cost", cost)?;

        let mut state = self.state.lock();
        // read the clock under the lock so timestamps are ordered with updates
        let now_nanos = self.clock.now()?;
        state.leak(now_nanos, self.leak_rate);

        if state.level + cost <= self.capacity {
            state.level += cost;
            trace!(level = state.level, cost, "admitted");

            Ok(LeakyBucketDecision {
                allowed: true,
                level: state.level,
                remaining_capacity: self.capacity - state.level,
                retry_after_seconds: None,
                retry_after_nanos: None,
            })
        } else {
            debug!(
                level = state.level,
                cost,
                capacity = self.capacity,
                "rejected"
            );

            // a cost above capacity never fits, however long the caller waits
            let retry_after_nanos = (cost <= self.capacity)
                .then(|| state.nanos_until_fits(cost, self.capacity, self.leak_rate));

            Ok(LeakyBucketDecision {
                allowed: false,
                level: state.level,
                remaining_capacity: self.capacity - state.level,
                retry_after_seconds: retry_after_nanos
                    .map(|nanos| nanos as f64 / NANOS_PER_SECOND),
                retry_after_nanos,
            })
        }
    }

    /// Current level after leaking up to now. Does not record the leak, so
    /// peeking never changes what the next decision sees.
    pub fn peek_level(&self) -> Result<f64, LeakyBucketError> {
        let state = self.state.lock();
        let now_nanos = self.clock.now()?;
        Ok(state.leaked_level(now_nanos, self.leak_rate))
    }

    // untouched for at least `max_idle_nanos` and fully drained at `now`
    pub(crate) fn is_idle(&self, now_nanos: u64, max_idle_nanos: u64) -> bool {
        let state = self.state.lock();
        match state.last_update_nanos {
            // never decided, so it holds nothing and dropping it loses nothing
            None => true,
            Some(last) => {
                now_nanos.saturating_sub(last) >= max_idle_nanos
                    && state.leaked_level(now_nanos, self.leak_rate) <= 0.0
            }
        }
    }
}

/// Result of a bucket decision, with metadata for callers that report back
/// (e.g. a `Retry-After` header)
#[derive(Debug, Clone, PartialEq)]
pub struct LeakyBucketDecision {
    /// Whether the request was admitted
    pub allowed: bool,
    /// Bucket level after the decision
    pub level: f64,
    /// Units that could still be admitted right now
    pub remaining_capacity: f64,
    /// Seconds until a rejected cost would fit; None when admitted, or when
    /// the cost exceeds capacity and can never fit
    pub retry_after_seconds: Option<f64>,
    /// Same wait in whole nanoseconds of the bucket's clock, rounded up so
    /// that retrying after exactly this long is admitted
    pub retry_after_nanos: Option<u64>,
}
