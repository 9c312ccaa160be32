//! # Bucket aggregations
//!
//! A bucket aggregation groups documents into buckets and counts, for every
//! bucket, the documents that fell into it. Buckets can hold sub-aggregations,
//! which are computed on the documents of their parent's bucket only.
//!
//! ## Two phases
//!
//! Aggregations are described once by a tree of [`AggregatorFactory`] stored in
//! an [`Aggregations`] arena. The arena is built and [validated](Aggregations::validate)
//! up front, then shared (read-only) between executions. Every execution creates
//! its own tree of live [`Aggregator`]s inside an [`AggregationContext`].
//!
//! ## Collection
//!
//! The document source walks the index segment by segment. Before the documents
//! of a segment are collected, [`AggregationContext::set_segment`] rebinds the
//! segment-local state of every aggregator, e.g. the membership test of a filter.
//! Each document is then [collected](AggregationContext::collect) under a bucket
//! ordinal chosen by the caller. An aggregator accepting the document increments
//! the count of that ordinal and forwards the document to its sub-aggregators,
//! in registration order, under the same ordinal.
//!
//! ## Results
//!
//! [`AggregationContext::build_result`] turns the counts of an ordinal into a
//! [`BucketResult`], sub-aggregations included. Ordinals that were never
//! collected simply report a count of zero.
//!
//! [`AggregationCollector`] packages the whole lifecycle for the common case of
//! top-level aggregations collected at ordinal 0.

mod agg_limits;
mod agg_req;
pub mod agg_result;
mod aggregator;
pub mod bucket;
mod bucket_collector;
mod bucket_counts;
mod collector;
mod context;
mod factory;


pub use agg_limits::{AggregationLimits, ResourceLimitGuard};
pub use agg_req::Aggregations;
pub use agg_result::{AggregationResults, BucketResult};
pub use aggregator::{Aggregator, AggregatorId};
pub use bucket::{FilterAggregation, FILTER_AGG_TYPE};
pub use collector::{
    AggregationCollector, AggregationSegmentCollector, DEFAULT_BUCKET_LIMIT, DEFAULT_MEMORY_LIMIT,
};
pub use context::AggregationContext;
pub use factory::{AggregatorFactories, AggregatorFactory, ChildPolicy, FactoryId};

/// Identifies a bucket within the bucket space of the parent aggregator.
pub type BucketOrdinal = u64;

/// How many buckets an aggregator may route a single document into.
///
/// This is declarative metadata. It tells the parent how the ordinals of the
/// sub-aggregations relate to its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketMode {
    /// Every accepted document lands in exactly one bucket, under the ordinal it
    /// was collected with.
    Single,
    /// A document may land in several buckets at once.
    Multi,
}
