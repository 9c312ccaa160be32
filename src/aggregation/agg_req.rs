//! Contains the aggregation request tree.
//!
//! The tree is stored flat: every [`AggregatorFactory`] lives in the [`Aggregations`]
//! arena and refers to its parent and sub-factories by [`FactoryId`].
//!
//! ```rust
//! use tantivy_bucket_agg::aggregation::{Aggregations, AggregatorFactory, FilterAggregation};
//!
//! let mut aggs = Aggregations::default();
//! let sales = aggs.add_factory(AggregatorFactory::filter(
//!     "sales",
//!     FilterAggregation::match_all(),
//! ));
//! let even = aggs.add_factory(AggregatorFactory::filter(
//!     "even",
//!     FilterAggregation::from_fn(|doc| doc % 2 == 0),
//! ));
//! aggs.register_children(sales, vec![even].into()).unwrap();
//! assert_eq!(aggs.path(even), "sales>even");
//! assert!(aggs.validate().is_ok());
//! ```

use rustc_hash::FxHashSet;

use super::bucket_collector::BucketCollector;
use super::bucket_counts::BucketCounts;
use super::{
    AggregationContext, Aggregator, AggregatorFactories, AggregatorFactory, AggregatorId,
    ChildPolicy, FactoryId,
};
use crate::AggregationError;

/// The aggregation requests.
///
/// Arena owning a forest of [`AggregatorFactory`]. Factories are added first, then
/// wired together with [`Aggregations::register_children`]. Factories without a parent
/// are the top level aggregations.
///
/// Once built, an `Aggregations` is meant to be shared, e.g. in an `Arc`, and used
/// read-only to create the aggregators of any number of executions, possibly on
/// different threads.
#[derive(Clone, Debug, Default)]
pub struct Aggregations {
    factories: Vec<AggregatorFactory>,
}

impl Aggregations {
    /// Adds a factory to the arena. It is top level until registered as a sub-factory.
    pub fn add_factory(&mut self, mut factory: AggregatorFactory) -> FactoryId {
        factory.parent = None;
        factory.sub_factories = AggregatorFactories::EMPTY;
        self.factories.push(factory);
        FactoryId(self.factories.len() - 1)
    }

    /// Returns the factory with the given id.
    ///
    /// # Panics
    /// If the id was not returned by this arena.
    pub fn factory(&self, id: FactoryId) -> &AggregatorFactory {
        &self.factories[id.0]
    }

    /// Number of factories in the arena.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if the arena holds no factory.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// The factories without parent, in insertion order.
    pub fn top_level(&self) -> AggregatorFactories {
        self.factories
            .iter()
            .enumerate()
            .filter(|(_, factory)| factory.parent.is_none())
            .map(|(ord, _)| FactoryId(ord))
            .collect()
    }

    /// Renders the path of a factory, e.g. `sales>in_stock`.
    pub fn path(&self, id: FactoryId) -> String {
        let mut names = vec![self.factory(id).name()];
        let mut current = self.factory(id).parent;
        while let Some(parent) = current {
            names.push(self.factory(parent).name());
            current = self.factory(parent).parent;
        }
        names.reverse();
        names.join(">")
    }

    /// Registers `children` as the sub-factories of `parent`.
    ///
    /// The sub-factories create the sub-aggregators of the aggregators created by
    /// `parent`, in the given order. Registering an empty list is a no-op.
    ///
    /// Fails, without modifying anything, if `parent` is unknown, leaf only, already has
    /// sub-factories, or if one of the children is unknown, listed twice, already
    /// registered somewhere, or an ancestor of `parent`.
    pub fn register_children(
        &mut self,
        parent: FactoryId,
        children: AggregatorFactories,
    ) -> crate::Result<()> {
        let Some(parent_factory) = self.factories.get(parent.0) else {
            return Err(AggregationError::invalid_configuration(
                &parent.to_string(),
                "",
                "unknown aggregation",
            ));
        };
        if children.is_empty() {
            return Ok(());
        }
        let invalid = |reason: String| {
            AggregationError::invalid_configuration(
                parent_factory.name(),
                parent_factory.agg_type(),
                reason,
            )
        };
        if parent_factory.child_policy() == ChildPolicy::LeafOnly {
            return Err(invalid("cannot accept sub-aggregations".to_string()));
        }
        if !parent_factory.sub_factories.is_empty() {
            return Err(invalid("sub-aggregations are already registered".to_string()));
        }
        let mut seen = FxHashSet::default();
        for child in children.iter() {
            let Some(child_factory) = self.factories.get(child.0) else {
                return Err(invalid(format!("unknown sub-aggregation {child}")));
            };
            if !seen.insert(child) {
                return Err(invalid(format!(
                    "sub-aggregation [{}] is listed twice",
                    child_factory.name()
                )));
            }
            if let Some(registered_under) = child_factory.parent {
                return Err(invalid(format!(
                    "sub-aggregation [{}] is already registered under [{}]",
                    child_factory.name(),
                    self.path(registered_under)
                )));
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(invalid(format!(
                    "registering [{}] as sub-aggregation would create a cycle",
                    child_factory.name()
                )));
            }
        }
        debug!(
            "registering {} sub-aggregations under [{}]",
            children.len(),
            self.path(parent)
        );
        for child in children.iter() {
            self.factories[child.0].parent = Some(parent);
        }
        self.factories[parent.0].sub_factories = children;
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: FactoryId, factory: FactoryId) -> bool {
        let mut current = Some(factory);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.factory(id).parent;
        }
        false
    }

    /// Validates all the top level aggregations and their sub-aggregations.
    pub fn validate(&self) -> crate::Result<()> {
        self.validate_factories(&self.top_level())
    }

    /// Validates `factory`, then its sub-factories, depth first.
    ///
    /// All the violations found in the subtree are reported, not only the first one.
    pub fn validate_factory(&self, factory: FactoryId) -> crate::Result<()> {
        let mut violations = Vec::new();
        self.collect_violations(factory, &mut violations);
        AggregationError::from_violations(violations)
    }

    /// Validates sibling factories, in order.
    pub fn validate_factories(&self, factories: &AggregatorFactories) -> crate::Result<()> {
        let mut violations = Vec::new();
        self.collect_sibling_violations(factories.as_slice(), &mut violations);
        for factory in factories.iter() {
            self.collect_violations(factory, &mut violations);
        }
        if !violations.is_empty() {
            debug!("aggregation validation found {} violations", violations.len());
        }
        AggregationError::from_violations(violations)
    }

    fn collect_violations(&self, id: FactoryId, violations: &mut Vec<AggregationError>) {
        let factory = self.factory(id);
        violations.extend(factory.local_violations().into_iter().map(|reason| {
            AggregationError::invalid_configuration(factory.name(), factory.agg_type(), reason)
        }));
        let sub_factories = factory.sub_factories.as_slice();
        self.collect_sibling_violations(sub_factories, violations);
        for &sub_factory in sub_factories {
            self.collect_violations(sub_factory, violations);
        }
    }

    /// Sibling aggregations are reported by name and must therefore be unique.
    fn collect_sibling_violations(
        &self,
        siblings: &[FactoryId],
        violations: &mut Vec<AggregationError>,
    ) {
        let mut names = FxHashSet::default();
        for &sibling in siblings {
            let factory = self.factory(sibling);
            if !names.insert(factory.name()) {
                let scope = match factory.parent {
                    Some(parent) => format!("under [{}]", self.path(parent)),
                    None => "at top level".to_string(),
                };
                violations.push(AggregationError::invalid_configuration(
                    factory.name(),
                    factory.agg_type(),
                    format!("duplicate aggregation name {scope}"),
                ));
            }
        }
    }

    /// Creates the aggregator of `factory`, and recursively those of its sub-factories,
    /// in `ctx`.
    ///
    /// `expected_buckets` estimates how many bucket ordinals the parent aggregator
    /// will collect the new aggregator with. It is only used to pre-size data
    /// structures. Top level aggregators expect 0.
    pub fn create(
        &self,
        factory: FactoryId,
        ctx: &mut AggregationContext,
        parent: Option<AggregatorId>,
        expected_buckets: usize,
    ) -> crate::Result<AggregatorId> {
        let agg_factory = self.factory(factory);
        let aggregator = Aggregator::new(
            agg_factory.name(),
            agg_factory.agg_type(),
            agg_factory.bucket_mode(),
            factory,
            parent,
            BucketCounts::with_expected_buckets(expected_buckets),
            BucketCollector::new(agg_factory.filter_aggregation().clone()),
        );
        let aggregator_id = ctx.push_aggregator(aggregator);
        ctx.register_segment_listener(aggregator_id)?;
        let sub_aggregators = self.create_all(
            &agg_factory.sub_factories,
            ctx,
            Some(aggregator_id),
            agg_factory.sub_aggregation_hint(expected_buckets),
        )?;
        ctx.set_sub_aggregators(aggregator_id, sub_aggregators);
        Ok(aggregator_id)
    }

    /// Creates the aggregators of sibling factories, in order.
    pub fn create_all(
        &self,
        factories: &AggregatorFactories,
        ctx: &mut AggregationContext,
        parent: Option<AggregatorId>,
        expected_buckets: usize,
    ) -> crate::Result<Vec<AggregatorId>> {
        factories
            .iter()
            .map(|factory| self.create(factory, ctx, parent, expected_buckets))
            .collect()
    }

    /// Creates the aggregators of all the top level factories.
    pub fn create_top_level(
        &self,
        ctx: &mut AggregationContext,
    ) -> crate::Result<Vec<AggregatorId>> {
        self.create_all(&self.top_level(), ctx, None, 0)
    }
}
