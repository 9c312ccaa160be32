use std::io;

use common::BitSet;

use crate::{DocId, Segment};

/// Per-segment membership test of a bucket.
///
/// A `Membership` is resolved for one segment and is only valid for the
/// documents of that segment.
pub trait Membership: Send {
    /// Returns true if `doc` belongs to the bucket.
    fn contains(&self, doc: DocId) -> bool;
}

impl Membership for BitSet {
    /// Docs beyond `max_value` are not contained.
    #[inline]
    fn contains(&self, doc: DocId) -> bool {
        doc < self.max_value() && BitSet::contains(self, doc)
    }
}

/// Builds the `BitSet` of a segment of `max_doc` documents from the matching doc ids.
///
/// Ids outside of `[0, max_doc)` are ignored.
pub fn docs_to_bitset(max_doc: u32, docs: impl IntoIterator<Item = DocId>) -> BitSet {
    let mut bitset = BitSet::with_max_value(max_doc);
    for doc in docs {
        if doc < max_doc {
            bitset.insert(doc);
        }
    }
    bitset
}

impl<F> Membership for F
where F: Fn(DocId) -> bool + Send
{
    #[inline]
    fn contains(&self, doc: DocId) -> bool {
        self(doc)
    }
}

/// Resolves the membership test of a bucket for a given segment.
///
/// Resolution may touch the index and can therefore fail with an io error.
/// Resolvers are shared by all the executions created from the same
/// aggregations and must be `Send + Sync`.
pub trait MembershipResolver: Send + Sync {
    /// Builds the membership test for `segment`.
    fn resolve(&self, segment: &Segment) -> io::Result<Box<dyn Membership>>;
}

impl<F> MembershipResolver for F
where F: Fn(&Segment) -> io::Result<Box<dyn Membership>> + Send + Sync
{
    fn resolve(&self, segment: &Segment) -> io::Result<Box<dyn Membership>> {
        self(segment)
    }
}

/// Membership matching every document.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllDocs;

impl Membership for AllDocs {
    #[inline]
    fn contains(&self, _doc: DocId) -> bool {
        true
    }
}

impl MembershipResolver for AllDocs {
    fn resolve(&self, _segment: &Segment) -> io::Result<Box<dyn Membership>> {
        Ok(Box::new(AllDocs))
    }
}
