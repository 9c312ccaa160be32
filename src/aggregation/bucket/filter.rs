use std::fmt::{self, Debug};
use std::io;
use std::sync::Arc;

use crate::{AllDocs, DocId, Membership, MembershipResolver, Segment};

/// Type of the aggregations created by
/// [`AggregatorFactory::filter`](crate::aggregation::AggregatorFactory::filter).
pub const FILTER_AGG_TYPE: &str = "filter";

/// Filter aggregation creates a single bucket containing the documents that match a filter.
///
/// The filter itself is opaque: a [`MembershipResolver`] turns it into a
/// membership test every time the document source enters a new segment.
///
/// # Result
/// The filter aggregation returns a single bucket with:
/// - `doc_count`: Number of documents matching the filter
/// - Sub-aggregation results computed on the filtered document set
#[derive(Clone)]
pub struct FilterAggregation {
    resolver: Arc<dyn MembershipResolver>,
}

impl FilterAggregation {
    /// Create a new filter aggregation from the resolver of its membership test.
    pub fn new(resolver: impl MembershipResolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Create a filter aggregation sharing an existing resolver.
    pub fn from_resolver(resolver: Arc<dyn MembershipResolver>) -> Self {
        Self { resolver }
    }

    /// Create a filter aggregation from a predicate on document ids.
    ///
    /// The predicate does not depend on the segment.
    pub fn from_fn<F>(predicate: F) -> Self
    where F: Fn(DocId) -> bool + Clone + Send + Sync + 'static {
        Self::new(move |_: &Segment| -> io::Result<Box<dyn Membership>> {
            Ok(Box::new(predicate.clone()))
        })
    }

    /// Filter aggregation accepting every document.
    pub fn match_all() -> Self {
        Self::new(AllDocs)
    }

    /// Builds the membership test of `segment`.
    pub(crate) fn resolve(&self, segment: &Segment) -> io::Result<Box<dyn Membership>> {
        self.resolver.resolve(segment)
    }
}

impl Debug for FilterAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterAggregation").finish_non_exhaustive()
    }
}
