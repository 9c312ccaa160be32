use itertools::Itertools;

use super::agg_limits::{AggregationLimits, ResourceLimitGuard};
use super::agg_result::{AggregationResults, BucketResult};
use super::{Aggregator, AggregatorId, BucketOrdinal};
use crate::{DocId, Segment};

/// State of one aggregation execution.
///
/// The context owns the aggregators created for the execution, the list of
/// aggregators to notify when the document source switches segments, and the
/// guard accounting their memory. It is driven by a single thread.
pub struct AggregationContext {
    aggregators: Vec<Aggregator>,
    segment_listeners: Vec<AggregatorId>,
    segment: Option<Segment>,
    limits: ResourceLimitGuard,
}

impl Default for AggregationContext {
    fn default() -> Self {
        AggregationContext::new(&AggregationLimits::default())
    }
}

impl AggregationContext {
    /// Creates an empty context whose memory is accounted against `limits`.
    pub fn new(limits: &AggregationLimits) -> AggregationContext {
        AggregationContext {
            aggregators: Vec::new(),
            segment_listeners: Vec::new(),
            segment: None,
            limits: limits.new_guard(),
        }
    }

    pub(crate) fn push_aggregator(&mut self, aggregator: Aggregator) -> AggregatorId {
        self.aggregators.push(aggregator);
        AggregatorId(self.aggregators.len() - 1)
    }

    /// Registers `aggregator` to be rebound whenever the segment changes.
    ///
    /// If the context is already bound to a segment, the aggregator is bound to it
    /// right away.
    pub fn register_segment_listener(&mut self, aggregator: AggregatorId) -> crate::Result<()> {
        self.segment_listeners.push(aggregator);
        if let Some(segment) = self.segment {
            self.aggregators[aggregator.0].on_segment_changed(&segment)?;
        }
        Ok(())
    }

    /// Notifies every registered aggregator, in registration order, that the
    /// document source moved to `segment`.
    ///
    /// Must complete before any document of the new segment is collected. All the
    /// aggregators drop the state of the previous segment first. Rebinding stops at
    /// the first aggregator failing, and the ones after it stay unbound.
    pub fn set_segment(&mut self, segment: &Segment) -> crate::Result<()> {
        debug!(
            "aggregation context entering segment {} ({} listeners)",
            segment.segment_ord(),
            self.segment_listeners.len()
        );
        self.segment = None;
        for &listener in &self.segment_listeners {
            self.aggregators[listener.0].unbind();
        }
        for &listener in &self.segment_listeners {
            self.aggregators[listener.0].on_segment_changed(segment)?;
        }
        self.segment = Some(*segment);
        Ok(())
    }

    /// The segment the context is currently bound to, `None` before the first segment
    /// or after a failed switch.
    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    /// Collects `doc` into `aggregator` under `ordinal`.
    ///
    /// If the document falls into the aggregator's bucket, the count of `ordinal`
    /// is incremented and the document is collected, under the same ordinal, by
    /// the sub-aggregators in registration order. Otherwise nothing in the subtree
    /// changes.
    pub fn collect(
        &mut self,
        aggregator: AggregatorId,
        doc: DocId,
        ordinal: BucketOrdinal,
    ) -> crate::Result<()> {
        let Self {
            aggregators,
            limits,
            ..
        } = self;
        collect_doc(aggregators, limits, aggregator, doc, ordinal)
    }

    /// Collects a block of documents into `aggregator` under `ordinal`.
    pub fn collect_block(
        &mut self,
        aggregator: AggregatorId,
        docs: &[DocId],
        ordinal: BucketOrdinal,
    ) -> crate::Result<()> {
        let Self {
            aggregators,
            limits,
            ..
        } = self;
        for &doc in docs {
            collect_doc(aggregators, limits, aggregator, doc, ordinal)?;
        }
        Ok(())
    }

    /// Builds the result of `aggregator` for `ordinal`.
    ///
    /// Sub-aggregations are built first, for the same ordinal. Ordinals that were
    /// never collected report a count of zero. This does not modify the context and
    /// can be called any number of times.
    pub fn build_result(&self, aggregator: AggregatorId, ordinal: BucketOrdinal) -> BucketResult {
        let agg = &self.aggregators[aggregator.0];
        let sub_aggregations: AggregationResults = agg
            .sub_aggregators()
            .iter()
            .map(|&sub_aggregator| self.build_result(sub_aggregator, ordinal))
            .collect();
        BucketResult {
            name: agg.name().to_string(),
            agg_type: agg.agg_type().to_string(),
            doc_count: agg.doc_count(ordinal),
            sub_aggregations,
        }
    }

    /// Returns the aggregator with the given id.
    pub fn aggregator(&self, aggregator: AggregatorId) -> &Aggregator {
        &self.aggregators[aggregator.0]
    }

    /// Returns the aggregator with the given id.
    pub fn aggregator_mut(&mut self, aggregator: AggregatorId) -> &mut Aggregator {
        &mut self.aggregators[aggregator.0]
    }

    pub(crate) fn set_sub_aggregators(
        &mut self,
        aggregator: AggregatorId,
        sub_aggregators: Vec<AggregatorId>,
    ) {
        self.aggregators[aggregator.0]
            .collector
            .set_sub_aggregators(sub_aggregators);
    }

    /// Number of aggregators created in this context.
    pub fn num_aggregators(&self) -> usize {
        self.aggregators.len()
    }

    /// Aggregators notified on segment changes, in registration order.
    pub fn segment_listeners(&self) -> &[AggregatorId] {
        &self.segment_listeners
    }

    /// Renders the path of an aggregator, e.g. `sales>in_stock`.
    pub fn path(&self, aggregator: AggregatorId) -> String {
        let mut names = Vec::new();
        let mut current = Some(aggregator);
        while let Some(id) = current {
            let agg = &self.aggregators[id.0];
            names.push(agg.name());
            current = agg.parent();
        }
        names.iter().rev().join(">")
    }

    /// Memory accounted for the bucket counts of this execution, in bytes.
    pub fn memory_consumed(&self) -> u64 {
        self.limits.allocated()
    }
}

fn collect_doc(
    aggregators: &mut [Aggregator],
    limits: &mut ResourceLimitGuard,
    aggregator: AggregatorId,
    doc: DocId,
    ordinal: BucketOrdinal,
) -> crate::Result<()> {
    let agg = &mut aggregators[aggregator.0];
    if !agg.accept(doc)? {
        return Ok(());
    }
    agg.doc_counts.increment(ordinal, limits)?;
    let num_sub_aggregators = agg.sub_aggregators().len();
    for idx in 0..num_sub_aggregators {
        let sub_aggregator = aggregators[aggregator.0].sub_aggregators()[idx];
        collect_doc(aggregators, limits, sub_aggregator, doc, ordinal)?;
    }
    Ok(())
}
