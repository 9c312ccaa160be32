use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use common::ByteCount;

use super::collector::{DEFAULT_BUCKET_LIMIT, DEFAULT_MEMORY_LIMIT};
use crate::AggregationError;

/// Aggregation memory limit after which the request fails. Defaults to DEFAULT_MEMORY_LIMIT
/// (500MB). The limit is shared by all the executions holding a guard of the same instance.
pub struct AggregationLimits {
    /// The counter which is shared between the aggregations for one request.
    memory_consumption: Arc<AtomicU64>,
    /// The memory_limit in bytes
    memory_limit: ByteCount,
    /// The maximum number of buckets a single aggregator may hold.
    bucket_limit: u32,
}

impl Clone for AggregationLimits {
    fn clone(&self) -> Self {
        Self {
            memory_consumption: Arc::clone(&self.memory_consumption),
            memory_limit: self.memory_limit,
            bucket_limit: self.bucket_limit,
        }
    }
}

impl Default for AggregationLimits {
    fn default() -> Self {
        Self {
            memory_consumption: Default::default(),
            memory_limit: DEFAULT_MEMORY_LIMIT.into(),
            bucket_limit: DEFAULT_BUCKET_LIMIT,
        }
    }
}

impl AggregationLimits {
    /// *memory_limit*
    /// memory_limit is defined in bytes.
    /// Aggregation fails when the estimated memory consumption of the bucket counters is higher
    /// than memory_limit.
    /// memory_limit will default to `DEFAULT_MEMORY_LIMIT` (500MB)
    ///
    /// *bucket_limit*
    /// Limits the number of buckets a single aggregator may grow to.
    /// bucket_limit will default to `DEFAULT_BUCKET_LIMIT` (65000)
    ///
    /// Note: The returned instance contains a Arc shared counter to track memory consumption.
    pub fn new(memory_limit: Option<u64>, bucket_limit: Option<u32>) -> Self {
        Self {
            memory_consumption: Default::default(),
            memory_limit: memory_limit.unwrap_or(DEFAULT_MEMORY_LIMIT).into(),
            bucket_limit: bucket_limit.unwrap_or(DEFAULT_BUCKET_LIMIT),
        }
    }

    /// Create a new ResourceLimitGuard, that will release the memory when dropped.
    pub fn new_guard(&self) -> ResourceLimitGuard {
        ResourceLimitGuard {
            memory_consumption: Arc::clone(&self.memory_consumption),
            memory_limit: self.memory_limit,
            bucket_limit: self.bucket_limit,
            allocated_with_the_guard: 0,
        }
    }

    /// Memory currently accounted for by all the live guards, in bytes.
    pub fn memory_consumed(&self) -> u64 {
        self.memory_consumption.load(Ordering::Relaxed)
    }

    /// The maximum number of buckets a single aggregator may hold.
    pub fn bucket_limit(&self) -> u32 {
        self.bucket_limit
    }
}

fn validate_memory_consumption(
    memory_consumed: u64,
    memory_limit: ByteCount,
) -> Result<(), AggregationError> {
    let memory_consumed: ByteCount = memory_consumed.into();
    if memory_consumed > memory_limit {
        return Err(AggregationError::MemoryExceeded {
            limit: memory_limit,
            current: memory_consumed,
        });
    }
    Ok(())
}

/// Accounts the memory of one execution against its [`AggregationLimits`].
pub struct ResourceLimitGuard {
    /// The counter which is shared between the aggregations for one request.
    memory_consumption: Arc<AtomicU64>,
    /// The memory_limit in bytes
    memory_limit: ByteCount,
    bucket_limit: u32,
    /// Allocated memory with this guard.
    allocated_with_the_guard: u64,
}

impl ResourceLimitGuard {
    /// Charges `num_bytes` to the shared counter.
    ///
    /// A charge exceeding the limit is rolled back before the error is returned.
    pub(crate) fn add_memory_consumed(&mut self, num_bytes: u64) -> crate::Result<()> {
        let memory_consumed = self
            .memory_consumption
            .fetch_add(num_bytes, Ordering::Relaxed)
            + num_bytes;
        if let Err(err) = validate_memory_consumption(memory_consumed, self.memory_limit) {
            self.memory_consumption
                .fetch_sub(num_bytes, Ordering::Relaxed);
            return Err(err);
        }
        self.allocated_with_the_guard += num_bytes;
        Ok(())
    }

    pub(crate) fn bucket_limit(&self) -> u32 {
        self.bucket_limit
    }

    /// Memory accounted for by this guard, in bytes.
    pub fn allocated(&self) -> u64 {
        self.allocated_with_the_guard
    }
}

impl Drop for ResourceLimitGuard {
    /// Removes the memory consumed tracked by this _instance_ of AggregationLimits.
    /// This is used to clear the execution specific memory consumption all at once.
    fn drop(&mut self) {
        self.memory_consumption
            .fetch_sub(self.allocated_with_the_guard, Ordering::Relaxed);
    }
}
