//! Definition of the aggregation error and result.

use std::io;

use common::ByteCount;
use itertools::Itertools;
use thiserror::Error;

/// The library's error enum.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// An aggregation definition is structurally invalid.
    #[error("Aggregator [{name}] of type [{agg_type}]: {reason}")]
    InvalidConfiguration {
        /// Name of the offending aggregation.
        name: String,
        /// Type of the offending aggregation.
        agg_type: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Validation found more than one problem in the aggregation tree.
    ///
    /// The violations are listed in the order the tree was visited.
    #[error("{} invalid aggregations: {}", .0.len(), .0.iter().join("; "))]
    InvalidAggregations(Vec<AggregationError>),
    /// Collection failed. The current execution must be aborted.
    #[error("Failed to aggregate {agg_type} aggregator [{name}]: {reason}")]
    Execution {
        /// Name of the aggregation that failed.
        name: String,
        /// Type of the aggregation that failed.
        agg_type: String,
        /// What went wrong.
        reason: String,
        /// The underlying error, if any.
        #[source]
        source: Option<io::Error>,
    },
    /// Memory limit exceeded.
    #[error(
        "Aborting aggregation because memory limit was exceeded. Limit: {limit}, Current: \
         {current}"
    )]
    MemoryExceeded {
        /// Memory consumption limit.
        limit: ByteCount,
        /// Estimated memory consumption.
        current: ByteCount,
    },
    /// Bucket limit exceeded.
    #[error(
        "Aborting aggregation because bucket limit was exceeded. Limit: {limit}, Current: \
         {current}"
    )]
    BucketLimitExceeded {
        /// Maximum number of buckets a single aggregator may hold.
        limit: u32,
        /// Number of buckets requested.
        current: u64,
    },
}

impl AggregationError {
    pub(crate) fn invalid_configuration(
        name: &str,
        agg_type: &str,
        reason: impl Into<String>,
    ) -> AggregationError {
        AggregationError::InvalidConfiguration {
            name: name.to_string(),
            agg_type: agg_type.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn execution(
        name: &str,
        agg_type: &str,
        reason: impl Into<String>,
        source: Option<io::Error>,
    ) -> AggregationError {
        AggregationError::Execution {
            name: name.to_string(),
            agg_type: agg_type.to_string(),
            reason: reason.into(),
            source,
        }
    }

    /// Turns a list of violations into a result.
    ///
    /// A single violation is returned as is, several are wrapped into
    /// [`AggregationError::InvalidAggregations`].
    pub(crate) fn from_violations(mut violations: Vec<AggregationError>) -> crate::Result<()> {
        match violations.len() {
            0 => Ok(()),
            1 => Err(violations.remove(0)),
            _ => Err(AggregationError::InvalidAggregations(violations)),
        }
    }

    /// Returns the individual errors wrapped in this error.
    ///
    /// Every error other than [`AggregationError::InvalidAggregations`] is its own single
    /// violation.
    pub fn into_violations(self) -> Vec<AggregationError> {
        match self {
            AggregationError::InvalidAggregations(violations) => violations
                .into_iter()
                .flat_map(AggregationError::into_violations)
                .collect(),
            error => vec![error],
        }
    }

    /// Name of the aggregation the error originates from, if it is tied to one.
    pub fn aggregation_name(&self) -> Option<&str> {
        match self {
            AggregationError::InvalidConfiguration { name, .. }
            | AggregationError::Execution { name, .. } => Some(name),
            _ => None,
        }
    }
}
