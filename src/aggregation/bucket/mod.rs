//! Module for all bucket aggregations.
//!
//! BucketAggregations create buckets of documents. Each bucket is associated with a rule which
//! determines whether or not a document falls into it. In other words, the buckets effectively
//! define document sets. Buckets are not necessarily disjunct, therefore a document can fall into
//! multiple buckets. In addition to the buckets themselves, the bucket aggregations also compute
//! and return the number of documents for each bucket. Bucket aggregations, as opposed to metric
//! aggregations, can hold sub-aggregations. These sub-aggregations will be aggregated for the
//! buckets created by their "parent" bucket aggregation.
//!
//! ## Supported Bucket Aggregations
//! - [Filter](FilterAggregation)

mod filter;

pub use filter::{FilterAggregation, FILTER_AGG_TYPE};
