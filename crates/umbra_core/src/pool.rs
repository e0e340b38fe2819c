//! Scratch pools: arenas of reusable values for the allocation-free hot path.
//!
//! A pool hands values out with [`Pool::borrow`] and takes them back with
//! [`Pool::reuse`]. A borrowed value belongs to the caller until it is
//! returned; once returned it must not be touched again, the next borrower
//! overwrites it.
//!
//! `available + borrowed == capacity` holds after every call.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// What a pool does when a borrow finds no spare value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Fail with [`PoolError::Exhausted`].
    Fixed,
    /// Grow capacity by `increment + floor(capacity * scale)` and keep going.
    Flexible { increment: usize, scale: f32 },
}

impl OverflowPolicy {
    /// Number of slots added when a pool of `capacity` overflows.
    pub fn growth(&self, capacity: usize) -> usize {
        match *self {
            OverflowPolicy::Fixed => 0,
            OverflowPolicy::Flexible { increment, scale } => {
                increment + (capacity as f32 * scale.max(0.0)).floor() as usize
            }
        }
    }
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::Flexible {
            increment: 8,
            scale: 0.5,
        }
    }
}

/// Sizing shared by every pool in a scratch bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Values created up front in each pool.
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 32,
            overflow: OverflowPolicy::default(),
        }
    }
}

/// A pool of reusable values of one type.
pub struct Pool<T> {
    name: &'static str,
    spares: VecDeque<T>,
    capacity: usize,
    policy: OverflowPolicy,
    factory: fn() -> T,
}

impl<T> Pool<T> {
    /// Create a pool holding `capacity` values built by `factory`.
    pub fn new(name: &'static str, capacity: usize, policy: OverflowPolicy, factory: fn() -> T) -> Self {
        let spares = (0..capacity).map(|_| factory()).collect();
        Self {
            name,
            spares,
            capacity,
            policy,
            factory,
        }
    }

    /// Create a pool from a shared [`PoolConfig`].
    pub fn with_config(name: &'static str, config: &PoolConfig, factory: fn() -> T) -> Self {
        Self::new(name, config.capacity, config.overflow, factory)
    }

    /// Take a value out of the pool.
    ///
    /// The value keeps whatever contents its last user left behind. Callers
    /// overwrite it before reading.
    pub fn borrow(&mut self) -> PoolResult<T> {
        if let Some(value) = self.spares.pop_front() {
            return Ok(value);
        }

        let growth = self.policy.growth(self.capacity);
        if growth == 0 {
            return Err(PoolError::Exhausted {
                pool: self.name,
                capacity: self.capacity,
            });
        }

        self.capacity += growth;
        // One of the new slots goes straight to the caller.
        for _ in 1..growth {
            self.spares.push_back((self.factory)());
        }
        log::debug!(
            "Pool '{}' grew by {} to capacity {}",
            self.name,
            growth,
            self.capacity
        );

        Ok((self.factory)())
    }

    /// Return a value. Returned values go to the front, so the most recently
    /// used value is handed out next.
    pub fn reuse(&mut self, value: T) -> PoolResult<()> {
        if self.spares.len() >= self.capacity {
            return Err(PoolError::Overfill {
                pool: self.name,
                capacity: self.capacity,
            });
        }
        self.spares.push_front(value);
        Ok(())
    }

    /// Return several values at once.
    pub fn reuse_all<I: IntoIterator<Item = T>>(&mut self, values: I) -> PoolResult<()> {
        for value in values {
            self.reuse(value)?;
        }
        Ok(())
    }

    /// Forget outstanding borrows and refill every slot with a fresh value.
    ///
    /// Values still held by callers must not be returned afterwards; doing so
    /// is reported as an overfill.
    pub fn clear(&mut self) {
        self.spares.clear();
        self.spares.extend((0..self.capacity).map(|_| (self.factory)()));
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn available(&self) -> usize {
        self.spares.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn borrowed(&self) -> usize {
        self.capacity - self.spares.len()
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("available", &self.available())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}
