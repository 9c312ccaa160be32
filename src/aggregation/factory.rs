use std::fmt;
use std::slice;

use super::bucket::{FilterAggregation, FILTER_AGG_TYPE};
use super::BucketMode;

/// Index of a factory within its [`Aggregations`](super::Aggregations) arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(pub(crate) usize);

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a factory may hold sub-aggregations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Sub-aggregations can be registered.
    AcceptsChildren,
    /// The aggregation can only be used as a leaf. Registering sub-aggregations fails.
    LeafOnly,
}

/// Ordered list of sibling factories.
///
/// The order is the registration order. It is the order in which the
/// aggregators are created, collected and reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregatorFactories {
    factories: Vec<FactoryId>,
}

impl AggregatorFactories {
    /// The empty list. Does not allocate.
    pub const EMPTY: AggregatorFactories = AggregatorFactories {
        factories: Vec::new(),
    };

    /// Number of factories in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Iterates over the factories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = FactoryId> + '_ {
        self.factories.iter().copied()
    }

    pub(crate) fn as_slice(&self) -> &[FactoryId] {
        &self.factories
    }
}

impl From<Vec<FactoryId>> for AggregatorFactories {
    fn from(factories: Vec<FactoryId>) -> Self {
        AggregatorFactories { factories }
    }
}

impl FromIterator<FactoryId> for AggregatorFactories {
    fn from_iter<T: IntoIterator<Item = FactoryId>>(iter: T) -> Self {
        AggregatorFactories {
            factories: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AggregatorFactories {
    type Item = &'a FactoryId;
    type IntoIter = slice::Iter<'a, FactoryId>;

    fn into_iter(self) -> Self::IntoIter {
        self.factories.iter()
    }
}

/// Definition of one aggregation node.
///
/// A factory knows how to create the [`Aggregator`](super::Aggregator) of its
/// aggregation. It is immutable once its sub-factories are registered and can
/// then create any number of aggregators, possibly for concurrent executions.
#[derive(Clone)]
pub struct AggregatorFactory {
    name: String,
    agg_type: String,
    child_policy: ChildPolicy,
    bucket_mode: BucketMode,
    filter: FilterAggregation,
    pub(crate) parent: Option<FactoryId>,
    pub(crate) sub_factories: AggregatorFactories,
}

impl fmt::Debug for AggregatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatorFactory")
            .field("name", &self.name)
            .field("agg_type", &self.agg_type)
            .field("child_policy", &self.child_policy)
            .field("bucket_mode", &self.bucket_mode)
            .field("parent", &self.parent)
            .field("sub_factories", &self.sub_factories)
            .finish()
    }
}

impl AggregatorFactory {
    /// Creates a factory for an aggregation named `name` of type `agg_type`,
    /// bucketing the documents accepted by `filter`.
    pub fn new(
        name: impl Into<String>,
        agg_type: impl Into<String>,
        child_policy: ChildPolicy,
        filter: FilterAggregation,
    ) -> AggregatorFactory {
        AggregatorFactory {
            name: name.into(),
            agg_type: agg_type.into(),
            child_policy,
            bucket_mode: BucketMode::Single,
            filter,
            parent: None,
            sub_factories: AggregatorFactories::EMPTY,
        }
    }

    /// Creates a `filter` aggregation factory, accepting sub-aggregations.
    pub fn filter(name: impl Into<String>, filter: FilterAggregation) -> AggregatorFactory {
        AggregatorFactory::new(name, FILTER_AGG_TYPE, ChildPolicy::AcceptsChildren, filter)
    }

    /// Creates a factory that cannot hold sub-aggregations.
    pub fn leaf_only(
        name: impl Into<String>,
        agg_type: impl Into<String>,
        filter: FilterAggregation,
    ) -> AggregatorFactory {
        AggregatorFactory::new(name, agg_type, ChildPolicy::LeafOnly, filter)
    }

    /// Overrides the declared bucket mode. Defaults to [`BucketMode::Single`].
    #[must_use]
    pub fn with_bucket_mode(mut self, bucket_mode: BucketMode) -> AggregatorFactory {
        self.bucket_mode = bucket_mode;
        self
    }

    /// The aggregation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The aggregation type.
    pub fn agg_type(&self) -> &str {
        &self.agg_type
    }

    /// Whether sub-aggregations can be registered on this factory.
    pub fn child_policy(&self) -> ChildPolicy {
        self.child_policy
    }

    /// The bucket mode of the aggregators this factory creates.
    pub fn bucket_mode(&self) -> BucketMode {
        self.bucket_mode
    }

    /// The factory this one is registered under, `None` for top level factories.
    pub fn parent(&self) -> Option<FactoryId> {
        self.parent
    }

    /// The registered sub-factories.
    pub fn sub_factories(&self) -> &AggregatorFactories {
        &self.sub_factories
    }

    pub(crate) fn filter_aggregation(&self) -> &FilterAggregation {
        &self.filter
    }

    /// Number of buckets the sub-aggregators should expect, given that this
    /// aggregator expects `expected_buckets` owning buckets.
    pub(crate) fn sub_aggregation_hint(&self, expected_buckets: usize) -> usize {
        match self.bucket_mode {
            BucketMode::Single => expected_buckets.max(1),
            // The derived ordinal space is only known while collecting.
            BucketMode::Multi => 0,
        }
    }

    /// Checks the constraints local to this node. Sub-factories are not visited.
    pub(crate) fn local_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.name.is_empty() {
            violations.push("aggregation name must not be empty".to_string());
        } else if let Some(forbidden) = self.name.chars().find(|c| matches!(c, '[' | ']' | '>')) {
            violations.push(format!(
                "invalid aggregation name, '{forbidden}' is not allowed in aggregation names"
            ));
        }
        if self.agg_type.is_empty() {
            violations.push("aggregation type must not be empty".to_string());
        }
        violations
    }
}
