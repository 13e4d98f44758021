// src/lib.rs

//! # Leaky Limiter
//!
//! A thread-safe leaky-bucket rate limiter. Each bucket holds a level that
//! drains continuously at a fixed rate; a request is admitted only if its cost
//! still fits under the bucket's capacity. Leaking is computed lazily from
//! timestamps at decision time, so no background thread is needed and any
//! [`Clock`] can be injected.
//!
//! ## Quick Example
//!
//! ```rust
//! use leaky_limiter::{LeakyBucket, LeakyBucketConfig, SystemClock};
//!
//! let config = LeakyBucketConfig::new(10.0, 2.0);
//! let bucket = LeakyBucket::with_config(config, SystemClock).unwrap();
//!
//! let decision = bucket.check().unwrap();
//! if decision.allowed {
//!     println!("Request allowed");
//! } else {
//!     println!("Rate limited - retry after {:.2}s",
//!              decision.retry_after_seconds.unwrap_or(0.0));
//! }
//! ```
//!
//! ## Per-client buckets
//!
//! ```rust
//! use leaky_limiter::{KeyedLeakyBucket, MonotonicClock};
//!
//! let limiter = KeyedLeakyBucket::new(5.0, 1.0, MonotonicClock::new()).unwrap();
//! assert!(limiter.allow("user_123").unwrap());
//! assert!(limiter.allow_cost("user_456", 5.0).unwrap());
//! ```

// private modules
mod clock;
mod config;
mod errors;
mod keyed;
mod leaky_bucket;

// public API exports
pub use clock::{Clock, ClockError, MonotonicClock, SystemClock};
pub use config::LeakyBucketConfig;
pub use errors::LeakyBucketError;
pub use keyed::KeyedLeakyBucket;
pub use leaky_bucket::{LeakyBucket, LeakyBucketDecision};
