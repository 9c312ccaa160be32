use super::agg_limits::ResourceLimitGuard;
use super::BucketOrdinal;
use crate::AggregationError;

/// Expected bucket counts above this are not trusted when pre-sizing.
const MAX_PRESIZED_BUCKETS: usize = 1 << 16;

/// Document count per bucket ordinal.
///
/// The store grows on demand when an ordinal beyond its size is collected and
/// never shrinks. Ordinals that were never grown to read as zero.
#[derive(Clone, Debug, Default)]
pub(crate) struct BucketCounts {
    counts: Vec<u64>,
}

impl BucketCounts {
    /// Creates an empty store with room for `expected_buckets` ordinals.
    ///
    /// The hint only reserves capacity. It is an estimate and may be wrong.
    pub fn with_expected_buckets(expected_buckets: usize) -> BucketCounts {
        BucketCounts {
            counts: Vec::with_capacity(expected_buckets.min(MAX_PRESIZED_BUCKETS)),
        }
    }

    /// Number of ordinals the store currently accommodates.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Count of `ordinal`, zero if the store never grew that far.
    #[inline]
    pub fn get(&self, ordinal: BucketOrdinal) -> u64 {
        usize::try_from(ordinal)
            .ok()
            .and_then(|ordinal| self.counts.get(ordinal))
            .copied()
            .unwrap_or(0)
    }

    /// Grows the store so that `ordinal` becomes addressable.
    ///
    /// Growth is geometric, so collecting increasing ordinals one after the other
    /// resizes a logarithmic number of times. The new slots are charged to `limits`.
    pub fn grow(
        &mut self,
        ordinal: BucketOrdinal,
        limits: &mut ResourceLimitGuard,
    ) -> crate::Result<()> {
        let num_buckets = ordinal.saturating_add(1);
        if num_buckets <= self.counts.len() as u64 {
            return Ok(());
        }
        let bucket_limit = limits.bucket_limit();
        if num_buckets > u64::from(bucket_limit) {
            return Err(AggregationError::BucketLimitExceeded {
                limit: bucket_limit,
                current: num_buckets,
            });
        }
        let old_len = self.counts.len();
        let new_len = (num_buckets as usize)
            .max(old_len * 2)
            .min(bucket_limit as usize);
        limits.add_memory_consumed(((new_len - old_len) * std::mem::size_of::<u64>()) as u64)?;
        trace!("growing bucket counts from {old_len} to {new_len}");
        self.counts.resize(new_len, 0);
        Ok(())
    }

    /// Increments the count of `ordinal`, growing the store first if needed.
    #[inline]
    pub fn increment(
        &mut self,
        ordinal: BucketOrdinal,
        limits: &mut ResourceLimitGuard,
    ) -> crate::Result<()> {
        self.grow(ordinal, limits)?;
        self.counts[ordinal as usize] += 1;
        Ok(())
    }
}
