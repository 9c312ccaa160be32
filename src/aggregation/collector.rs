use std::sync::Arc;

use super::agg_limits::AggregationLimits;
use super::agg_req::Aggregations;
use super::agg_result::AggregationResults;
use super::{AggregationContext, AggregatorId};
use crate::{AggregationError, DocId, Segment};

/// The default max bucket count, before the aggregation fails.
pub const DEFAULT_BUCKET_LIMIT: u32 = 65000;

/// The default memory limit in bytes before the aggregation fails. 500MB
pub const DEFAULT_MEMORY_LIMIT: u64 = 500_000_000;

/// Collector for aggregations.
///
/// The collector collects all the top level aggregations of the underlying request at
/// bucket ordinal 0. The request is shared: every call to
/// [`AggregationCollector::prepare`] starts an independent execution, so one collector
/// can serve several threads.
#[derive(Clone)]
pub struct AggregationCollector {
    aggs: Arc<Aggregations>,
    limits: AggregationLimits,
}

impl AggregationCollector {
    /// Create collector from aggregation request.
    ///
    /// Aggregation fails when the limits in `AggregationLimits` is exceeded. (memory limit and
    /// bucket limit)
    pub fn from_aggs(aggs: impl Into<Arc<Aggregations>>, limits: AggregationLimits) -> Self {
        Self {
            aggs: aggs.into(),
            limits,
        }
    }

    /// The aggregation request.
    pub fn aggregations(&self) -> &Aggregations {
        &self.aggs
    }

    /// Validates the request and creates the aggregators of a new execution.
    pub fn prepare(&self) -> crate::Result<AggregationSegmentCollector> {
        self.aggs.validate()?;
        let mut ctx = AggregationContext::new(&self.limits);
        let roots = self.aggs.create_top_level(&mut ctx)?;
        Ok(AggregationSegmentCollector {
            ctx,
            roots,
            error: None,
        })
    }
}

/// `AggregationSegmentCollector` does the aggregation collection of one execution.
///
/// Documents are collected segment after segment. [`set_segment`](Self::set_segment)
/// has to be called before the documents of a segment are pushed.
///
/// Collection errors do not interrupt the caller. The first one is kept and returned by
/// [`harvest`](Self::harvest), and later documents are ignored.
pub struct AggregationSegmentCollector {
    ctx: AggregationContext,
    roots: Vec<AggregatorId>,
    error: Option<AggregationError>,
}

impl AggregationSegmentCollector {
    /// Rebinds all the aggregators to `segment`.
    ///
    /// A failure is kept like a collection error: later documents are ignored and
    /// [`harvest`](Self::harvest) returns it.
    pub fn set_segment(&mut self, segment: &Segment) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.ctx.set_segment(segment) {
            self.error = Some(err);
        }
    }

    /// Collects `doc` into every top level aggregation.
    #[inline]
    pub fn collect(&mut self, doc: DocId) {
        if self.error.is_some() {
            return;
        }
        for &root in &self.roots {
            if let Err(err) = self.ctx.collect(root, doc, 0) {
                self.error = Some(err);
                return;
            }
        }
    }

    /// The document source pushes blocks of documents to the collector via this method.
    pub fn collect_block(&mut self, docs: &[DocId]) {
        if self.error.is_some() {
            return;
        }
        for &root in &self.roots {
            if let Err(err) = self.ctx.collect_block(root, docs, 0) {
                self.error = Some(err);
                return;
            }
        }
    }

    /// The context of the execution.
    pub fn context(&self) -> &AggregationContext {
        &self.ctx
    }

    /// Builds the results of the top level aggregations.
    pub fn harvest(self) -> crate::Result<AggregationResults> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(self
            .roots
            .iter()
            .map(|&root| self.ctx.build_result(root, 0))
            .collect())
    }
}
