// src/keyed.rs

// keyed registry: one leaky bucket per client key, created on first use

// dependencies
use crate::clock::{Clock, SystemClock};
use crate::config::LeakyBucketConfig;
use crate::errors::{LeakyBucketError, require_positive};
use crate::leaky_bucket::{LeakyBucket, LeakyBucketDecision};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;
use tracing::debug;

/// A registry of independent leaky buckets.
/// K is the type used to identify clients (e.g., String, u64, etc.).
/// C is the clock type, defaulting to SystemClock; each bucket gets a clone.
/// Buckets are only removed by `remove` or `cleanup_idle_buckets`.
#[derive(Debug)]
pub struct KeyedLeakyBucket<K, C = SystemClock>
where
    K: Hash + Eq,
    C: Clock + Clone,
{
    capacity: f64,
    leak_rate: f64,
    buckets: DashMap<K, LeakyBucket<C>>,
    clock: C,
}

impl<K, C> KeyedLeakyBucket<K, C>
where
    K: Hash + Eq,
    C: Clock + Clone,
{
    pub fn new(capacity: f64, leak_rate: f64, clock: C) -> Result<Self, LeakyBucketError> {
        Self::with_config(LeakyBucketConfig::new(capacity, leak_rate), clock)
    }

    // method to create a new registry from a config object
    pub fn with_config(config: LeakyBucketConfig, clock: C) -> Result<Self, LeakyBucketError> {
        config.validate()?;
        Ok(Self {
            capacity: config.capacity,
            leak_rate: config.leak_rate,
            buckets: DashMap::new(),
            clock,
        })
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn leak_rate(&self) -> f64 {
        self.leak_rate
    }

    pub fn allow(&self, key: K) -> Result<bool, LeakyBucketError> {
        self.allow_cost(key, 1.0)
    }

    pub fn allow_cost(&self, key: K, cost: f64) -> Result<bool, LeakyBucketError> {
        self.check_cost(key, cost).map(|decision| decision.allowed)
    }

    pub fn check(&self, key: K) -> Result<LeakyBucketDecision, LeakyBucketError> {
        self.check_cost(key, 1.0)
    }

    /// Decide for `key`, creating its bucket on first sight.
    /// A new key is only inserted once its first decision has succeeded, so
    /// invalid costs and clock failures never grow the map.
    pub fn check_cost(&self, key: K, cost: f64) -> Result<LeakyBucketDecision, LeakyBucketError> {
        let cost = require_positive("cost", cost)?;

        // fast path: shared shard lock only
        if let Some(bucket) = self.buckets.get(&key) {
            return bucket.check_cost(cost);
        }

        // the vacant entry holds the shard write lock, so only one caller creates the bucket
        match self.buckets.entry(key) {
            Entry::Occupied(entry) => entry.get().check_cost(cost),
            Entry::Vacant(entry) => {
                let bucket = self.new_bucket();
                let decision = bucket.check_cost(cost)?;
                entry.insert(bucket);
                Ok(decision)
            }
        }
    }

    /// Level of an existing bucket after leaking up to now, or None for an
    /// unknown key. Never creates a bucket.
    pub fn peek_level(&self, key: &K) -> Result<Option<f64>, LeakyBucketError> {
        match self.buckets.get(key) {
            Some(bucket) => bucket.peek_level().map(Some),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.buckets.contains_key(key)
    }

    /// Forget a key. Returns whether it was present.
    pub fn remove(&self, key: &K) -> bool {
        self.buckets.remove(key).is_some()
    }

    /// Remove buckets untouched for at least `max_idle_nanos` whose level has
    /// fully drained. A fresh bucket behaves exactly like a drained one, so
    /// this never changes a later decision. Returns the number removed.
    pub fn cleanup_idle_buckets(&self, max_idle_nanos: u64) -> Result<usize, LeakyBucketError> {
        let now_nanos = self.clock.now()?;
        let mut removed = 0;
        self.buckets.retain(|_, bucket| {
            let idle = bucket.is_idle(now_nanos, max_idle_nanos);
            if idle {
                removed += 1;
            }
            !idle
        });
        debug!(removed, remaining = self.buckets.len(), "cleaned up idle buckets");
        Ok(removed)
    }

    fn new_bucket(&self) -> LeakyBucket<C> {
        LeakyBucket::from_validated(self.capacity, self.leak_rate, self.clock.clone())
    }
}
