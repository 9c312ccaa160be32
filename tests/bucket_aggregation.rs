use std::io;
use std::sync::Arc;
use std::thread;

use serde_json::json;
use tantivy_bucket_agg::aggregation::{
    AggregationCollector, AggregationLimits, Aggregations, AggregatorFactory, ChildPolicy,
    FilterAggregation,
};
use tantivy_bucket_agg::{docs_to_bitset, AggregationError, Membership, Segment};

/// Two segments of 8 documents each. `in_stock` matches a different set of documents in
/// each segment, `discounted` matches doc ids divisible by 4.
fn shop_aggregations() -> tantivy_bucket_agg::Result<Aggregations> {
    let in_stock = |segment: &Segment| -> io::Result<Box<dyn Membership>> {
        let docs: Vec<u32> = if segment.segment_ord() == 0 {
            vec![0, 1, 4, 5]
        } else {
            vec![2, 4, 6]
        };
        Ok(Box::new(docs_to_bitset(segment.max_doc(), docs)))
    };
    let mut aggs = Aggregations::default();
    let in_stock = aggs.add_factory(AggregatorFactory::filter(
        "in_stock",
        FilterAggregation::new(in_stock),
    ));
    let discounted = aggs.add_factory(AggregatorFactory::filter(
        "discounted",
        FilterAggregation::from_fn(|doc| doc % 4 == 0),
    ));
    aggs.add_factory(AggregatorFactory::filter(
        "all",
        FilterAggregation::match_all(),
    ));
    aggs.register_children(in_stock, vec![discounted].into())?;
    Ok(aggs)
}

fn run(collector: &AggregationCollector) -> tantivy_bucket_agg::Result<serde_json::Value> {
    let mut segment_collector = collector.prepare()?;
    for segment_ord in 0..2 {
        segment_collector.set_segment(&Segment::new(segment_ord, 8));
        segment_collector.collect_block(&[0, 1, 2, 3, 4, 5, 6, 7]);
    }
    let results = segment_collector.harvest()?;
    Ok(serde_json::to_value(results).unwrap())
}

#[test]
fn test_collect_two_segments() -> tantivy_bucket_agg::Result<()> {
    let collector =
        AggregationCollector::from_aggs(shop_aggregations()?, AggregationLimits::default());
    assert_eq!(
        run(&collector)?,
        json!({
            "in_stock": {
                "doc_count": 7,
                "discounted": { "doc_count": 3 }
            },
            "all": { "doc_count": 16 }
        })
    );
    Ok(())
}

#[test]
fn test_shared_aggregations_across_threads() -> tantivy_bucket_agg::Result<()> {
    let aggs = Arc::new(shop_aggregations()?);
    let limits = AggregationLimits::default();
    let collector = AggregationCollector::from_aggs(Arc::clone(&aggs), limits.clone());
    let results: Vec<serde_json::Value> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| run(&collector)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<tantivy_bucket_agg::Result<Vec<_>>>()
    })?;
    assert_eq!(results.len(), 4);
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(limits.memory_consumed(), 0);
    Ok(())
}

#[test]
fn test_invalid_request_reports_every_violation() {
    let mut aggs = Aggregations::default();
    let parent = aggs.add_factory(AggregatorFactory::filter(
        "parent[0]",
        FilterAggregation::match_all(),
    ));
    let child = aggs.add_factory(AggregatorFactory::new(
        "child",
        "",
        ChildPolicy::LeafOnly,
        FilterAggregation::match_all(),
    ));
    aggs.register_children(parent, vec![child].into()).unwrap();
    let collector = AggregationCollector::from_aggs(aggs, AggregationLimits::default());
    let err = collector.prepare().err().unwrap();
    let violations = err.into_violations();
    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .all(|violation| matches!(violation, AggregationError::InvalidConfiguration { .. })));
}

#[test]
fn test_bucket_limit_is_reported_at_harvest() -> tantivy_bucket_agg::Result<()> {
    let mut aggs = Aggregations::default();
    aggs.add_factory(AggregatorFactory::filter(
        "all",
        FilterAggregation::match_all(),
    ));
    let collector = AggregationCollector::from_aggs(aggs, AggregationLimits::new(None, Some(0)));
    let mut segment_collector = collector.prepare()?;
    segment_collector.set_segment(&Segment::new(0, 1));
    segment_collector.collect(0);
    assert!(matches!(
        segment_collector.harvest(),
        Err(AggregationError::BucketLimitExceeded { limit: 0, .. })
    ));
    Ok(())
}
