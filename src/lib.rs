#![warn(missing_docs)]
#![allow(clippy::len_without_is_empty)]

//! Segment-aware bucket aggregation.
//!
//! This crate contains the bucket collection substrate of tantivy's aggregations:
//! a tree of [`AggregatorFactory`](aggregation::AggregatorFactory) definitions is
//! validated once, then instantiated into live aggregators for every execution.
//! Aggregators count the documents falling into each of their buckets and forward
//! accepted documents to their sub-aggregators, while the document source walks
//! the index one segment at a time.
//!
//! ```rust
//! use tantivy_bucket_agg::aggregation::{
//!     AggregationContext, Aggregations, AggregatorFactory, FilterAggregation,
//! };
//! use tantivy_bucket_agg::{AllDocs, Segment};
//!
//! # fn main() -> tantivy_bucket_agg::Result<()> {
//! let mut aggs = Aggregations::default();
//! let even = aggs.add_factory(AggregatorFactory::filter(
//!     "even",
//!     FilterAggregation::from_fn(|doc| doc % 2 == 0),
//! ));
//! let all = aggs.add_factory(AggregatorFactory::filter(
//!     "all",
//!     FilterAggregation::new(AllDocs),
//! ));
//! aggs.register_children(all, vec![even].into())?;
//! aggs.validate()?;
//!
//! let mut ctx = AggregationContext::default();
//! let roots = aggs.create_top_level(&mut ctx)?;
//! ctx.set_segment(&Segment::new(0, 10))?;
//! for doc in 0..10 {
//!     ctx.collect(roots[0], doc, 0)?;
//! }
//! let result = ctx.build_result(roots[0], 0);
//! assert_eq!(result.doc_count, 10);
//! assert_eq!(result.sub_aggregations.get("even").unwrap().doc_count, 5);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod aggregation;
mod error;
mod membership;
mod segment;

pub use common::BitSet;
pub use crate::error::AggregationError;
pub use crate::membership::{docs_to_bitset, AllDocs, Membership, MembershipResolver};
pub use crate::segment::Segment;

/// A `u32` identifying a document within a segment.
pub type DocId = u32;

/// Ordinal of a segment within the searched index.
pub type SegmentOrdinal = u32;

/// Aggregation result type.
pub type Result<T> = std::result::Result<T, AggregationError>;
