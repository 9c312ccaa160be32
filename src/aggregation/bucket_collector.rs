use std::fmt;
use std::io;

use super::bucket::FilterAggregation;
use super::AggregatorId;
use crate::{DocId, Membership, Segment, SegmentOrdinal};

/// Segment-local state of a bucket collector.
enum MembershipState {
    /// No usable membership test. Either no segment was ever set, or rebinding
    /// to the last segment failed.
    AwaitingSegment,
    Ready {
        segment_ord: SegmentOrdinal,
        membership: Box<dyn Membership>,
    },
}

/// Decides which documents fall into the bucket of an aggregator and knows the
/// sub-aggregators accepted documents are forwarded to.
pub(crate) struct BucketCollector {
    filter: FilterAggregation,
    state: MembershipState,
    sub_aggregators: Vec<AggregatorId>,
}

impl fmt::Debug for BucketCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segment_ord = match &self.state {
            MembershipState::AwaitingSegment => None,
            MembershipState::Ready { segment_ord, .. } => Some(*segment_ord),
        };
        f.debug_struct("BucketCollector")
            .field("segment_ord", &segment_ord)
            .field("sub_aggregators", &self.sub_aggregators)
            .finish()
    }
}

impl BucketCollector {
    pub fn new(filter: FilterAggregation) -> BucketCollector {
        BucketCollector {
            filter,
            state: MembershipState::AwaitingSegment,
            sub_aggregators: Vec::new(),
        }
    }

    /// Drops the membership test of the previous segment and resolves the one of `segment`.
    ///
    /// On error the collector stays unbound.
    pub fn set_segment(&mut self, segment: &Segment) -> io::Result<()> {
        self.unbind();
        let membership = self.filter.resolve(segment)?;
        self.state = MembershipState::Ready {
            segment_ord: segment.segment_ord(),
            membership,
        };
        Ok(())
    }

    /// Drops the membership test of the current segment, if any.
    pub fn unbind(&mut self) {
        self.state = MembershipState::AwaitingSegment;
    }

    /// Returns whether `doc` falls into the bucket, `None` if the collector is
    /// not bound to a segment.
    #[inline]
    pub fn accept(&self, doc: DocId) -> Option<bool> {
        match &self.state {
            MembershipState::AwaitingSegment => None,
            MembershipState::Ready { membership, .. } => Some(membership.contains(doc)),
        }
    }

    pub fn segment_ord(&self) -> Option<SegmentOrdinal> {
        match &self.state {
            MembershipState::AwaitingSegment => None,
            MembershipState::Ready { segment_ord, .. } => Some(*segment_ord),
        }
    }

    /// Sub-aggregators in registration order.
    #[inline]
    pub fn sub_aggregators(&self) -> &[AggregatorId] {
        &self.sub_aggregators
    }

    pub fn set_sub_aggregators(&mut self, sub_aggregators: Vec<AggregatorId>) {
        self.sub_aggregators = sub_aggregators;
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::BucketCollector;
    use crate::aggregation::FilterAggregation;
    use crate::{docs_to_bitset, Membership, Segment};

    #[test]
    fn test_unbound_collector_has_no_answer() {
        let collector = BucketCollector::new(FilterAggregation::match_all());
        assert_eq!(collector.accept(0), None);
        assert_eq!(collector.segment_ord(), None);
    }

    #[test]
    fn test_membership_is_rebuilt_per_segment() -> io::Result<()> {
        let num_resolutions = Arc::new(AtomicUsize::new(0));
        let num_resolutions_clone = Arc::clone(&num_resolutions);
        let resolver = move |segment: &Segment| -> io::Result<Box<dyn Membership>> {
            num_resolutions_clone.fetch_add(1, Ordering::SeqCst);
            let docs = if segment.segment_ord() == 0 {
                vec![1]
            } else {
                vec![2]
            };
            Ok(Box::new(docs_to_bitset(segment.max_doc(), docs)))
        };
        let filter = FilterAggregation::new(resolver);
        let mut collector = BucketCollector::new(filter);
        collector.set_segment(&Segment::new(0, 4))?;
        assert_eq!(collector.accept(1), Some(true));
        assert_eq!(collector.accept(2), Some(false));
        collector.set_segment(&Segment::new(1, 4))?;
        assert_eq!(collector.segment_ord(), Some(1));
        assert_eq!(collector.accept(1), Some(false));
        assert_eq!(collector.accept(2), Some(true));
        assert_eq!(num_resolutions.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_failed_rebinding_leaves_collector_unbound() {
        let resolver = |segment: &Segment| -> io::Result<Box<dyn Membership>> {
            if segment.segment_ord() == 0 {
                Ok(Box::new(|_doc: u32| true))
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "segment gone"))
            }
        };
        let filter = FilterAggregation::new(resolver);
        let mut collector = BucketCollector::new(filter);
        collector.set_segment(&Segment::new(0, 1)).unwrap();
        assert_eq!(collector.accept(0), Some(true));
        assert!(collector.set_segment(&Segment::new(1, 1)).is_err());
        assert_eq!(collector.accept(0), None);
    }
}
