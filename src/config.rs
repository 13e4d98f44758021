// src/config.rs

//! Configuration types for leaky buckets

// dependencies
use crate::errors::{LeakyBucketError, require_positive};

/// Configuration shared by single buckets and keyed registries
#[derive(Debug, Clone, PartialEq)]
pub struct LeakyBucketConfig {
    pub(crate) capacity: f64,
    pub(crate) leak_rate: f64,
}

impl LeakyBucketConfig {
    /// Create a new configuration with capacity and leak rate (units per second)
    pub fn new(capacity: f64, leak_rate: f64) -> Self {
        Self {
            capacity,
            leak_rate,
        }
    }

    /// Builder-style: set capacity
    pub fn capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builder-style: set leak rate
    pub fn leak_rate(mut self, leak_rate: f64) -> Self {
        self.leak_rate = leak_rate;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LeakyBucketError> {
        require_positive("capacity", self.capacity)?;
        require_positive("leak_rate", self.leak_rate)?;
        Ok(())
    }
}
