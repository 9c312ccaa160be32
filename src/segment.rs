use crate::{DocId, SegmentOrdinal};

/// Handle on the segment the document source is currently visiting.
///
/// Aggregators receive it when the source switches segments and use it to
/// rebuild their segment-local state, typically the membership predicate of a
/// filter bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    segment_ord: SegmentOrdinal,
    max_doc: DocId,
}

impl Segment {
    /// Creates a segment handle. Document ids of the segment lie in `[0, max_doc)`.
    pub fn new(segment_ord: SegmentOrdinal, max_doc: DocId) -> Segment {
        Segment {
            segment_ord,
            max_doc,
        }
    }

    /// Ordinal of the segment within the searched index.
    #[inline]
    pub fn segment_ord(&self) -> SegmentOrdinal {
        self.segment_ord
    }

    /// Returns one more than the highest document id of the segment.
    #[inline]
    pub fn max_doc(&self) -> DocId {
        self.max_doc
    }
}
