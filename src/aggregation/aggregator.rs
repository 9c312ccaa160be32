use std::fmt;

use super::bucket_collector::BucketCollector;
use super::bucket_counts::BucketCounts;
use super::{BucketMode, BucketOrdinal, FactoryId};
use crate::{AggregationError, DocId, Segment, SegmentOrdinal};

/// Index of an aggregator within its [`AggregationContext`](super::AggregationContext).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregatorId(pub(crate) usize);

impl fmt::Display for AggregatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live counterpart of an [`AggregatorFactory`](super::AggregatorFactory).
///
/// An aggregator belongs to a single execution. It holds the document count of
/// every bucket ordinal it was collected with, and the ids of its
/// sub-aggregators. Collection itself goes through the owning
/// [`AggregationContext`](super::AggregationContext), which owns the whole tree.
#[derive(Debug)]
pub struct Aggregator {
    name: String,
    agg_type: String,
    bucket_mode: BucketMode,
    factory: FactoryId,
    parent: Option<AggregatorId>,
    pub(crate) doc_counts: BucketCounts,
    pub(crate) collector: BucketCollector,
}

impl Aggregator {
    pub(crate) fn new(
        name: &str,
        agg_type: &str,
        bucket_mode: BucketMode,
        factory: FactoryId,
        parent: Option<AggregatorId>,
        doc_counts: BucketCounts,
        collector: BucketCollector,
    ) -> Aggregator {
        Aggregator {
            name: name.to_string(),
            agg_type: agg_type.to_string(),
            bucket_mode,
            factory,
            parent,
            doc_counts,
            collector,
        }
    }

    /// The aggregation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The aggregation type.
    pub fn agg_type(&self) -> &str {
        &self.agg_type
    }

    /// Bucket mode declared by the factory.
    pub fn bucket_mode(&self) -> BucketMode {
        self.bucket_mode
    }

    /// The factory this aggregator was created from.
    pub fn factory(&self) -> FactoryId {
        self.factory
    }

    /// The parent aggregator, `None` for top level aggregators.
    pub fn parent(&self) -> Option<AggregatorId> {
        self.parent
    }

    /// The sub-aggregators, in registration order.
    pub fn sub_aggregators(&self) -> &[AggregatorId] {
        self.collector.sub_aggregators()
    }

    /// Number of documents collected under `ordinal` so far.
    pub fn doc_count(&self, ordinal: BucketOrdinal) -> u64 {
        self.doc_counts.get(ordinal)
    }

    /// Number of ordinals the bucket counts currently accommodate.
    pub fn num_buckets(&self) -> usize {
        self.doc_counts.len()
    }

    /// The segment the aggregator is bound to, `None` if it cannot collect.
    pub fn segment_ord(&self) -> Option<SegmentOrdinal> {
        self.collector.segment_ord()
    }

    /// Rebinds the aggregator to `segment`.
    ///
    /// The membership test of the previous segment is dropped first. If the new
    /// one cannot be resolved, the aggregator refuses to collect until it is
    /// successfully bound to a segment again.
    pub fn on_segment_changed(&mut self, segment: &Segment) -> crate::Result<()> {
        debug!(
            "binding {} aggregator [{}] to segment {}",
            self.agg_type,
            self.name,
            segment.segment_ord()
        );
        self.collector.set_segment(segment).map_err(|io_error| {
            AggregationError::execution(
                &self.name,
                &self.agg_type,
                format!(
                    "could not resolve membership for segment {}",
                    segment.segment_ord()
                ),
                Some(io_error),
            )
        })
    }

    /// Drops the segment-local state. The aggregator refuses to collect until it is
    /// bound to a segment again.
    pub(crate) fn unbind(&mut self) {
        self.collector.unbind();
    }

    /// Returns whether `doc` falls into the bucket of this aggregator.
    #[inline]
    pub(crate) fn accept(&self, doc: DocId) -> crate::Result<bool> {
        self.collector.accept(doc).ok_or_else(|| {
            AggregationError::execution(
                &self.name,
                &self.agg_type,
                "collect called while the aggregator is not bound to a segment",
                None,
            )
        })
    }
}
