//! Contains the final aggregation tree.
//!
//! A [`BucketResult`] is built per aggregator and bucket ordinal by
//! [`AggregationContext::build_result`](super::AggregationContext::build_result).
//! Results serialize into elasticsearch-like JSON: the document count of a bucket next to
//! the results of its sub-aggregations, keyed by name.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Results of sibling aggregations, in registration order.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct AggregationResults(Vec<BucketResult>);

impl AggregationResults {
    /// Returns the result of the aggregation named `name`.
    pub fn get(&self, name: &str) -> Option<&BucketResult> {
        self.0.iter().find(|result| result.name == name)
    }

    /// Iterates over the results in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BucketResult> {
        self.0.iter()
    }

    /// Names of the aggregations, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|result| result.name.as_str())
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<BucketResult> for AggregationResults {
    fn from_iter<T: IntoIterator<Item = BucketResult>>(iter: T) -> Self {
        AggregationResults(iter.into_iter().collect())
    }
}

impl IntoIterator for AggregationResults {
    type Item = BucketResult;
    type IntoIter = std::vec::IntoIter<BucketResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for AggregationResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for result in &self.0 {
            map.serialize_entry(&result.name, result)?;
        }
        map.end()
    }
}

/// Result of one aggregator for one bucket ordinal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketResult {
    /// The aggregation name.
    pub name: String,
    /// The aggregation type.
    pub agg_type: String,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    /// Results of the sub-aggregations for the same bucket.
    pub sub_aggregations: AggregationResults,
}

impl Serialize for BucketResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.sub_aggregations.len()))?;
        map.serialize_entry("doc_count", &self.doc_count)?;
        for sub_aggregation in self.sub_aggregations.iter() {
            map.serialize_entry(&sub_aggregation.name, sub_aggregation)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AggregationResults, BucketResult};

    fn leaf(name: &str, doc_count: u64) -> BucketResult {
        BucketResult {
            name: name.to_string(),
            agg_type: "filter".to_string(),
            doc_count,
            sub_aggregations: AggregationResults::default(),
        }
    }

    #[test]
    fn test_results_keep_registration_order() {
        let results: AggregationResults = vec![leaf("zeta", 1), leaf("alpha", 2)]
            .into_iter()
            .collect();
        assert_eq!(results.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(results.get("alpha").map(|res| res.doc_count), Some(2));
        assert!(results.get("beta").is_none());
    }

    #[test]
    fn test_serialize_nested_result() {
        let sub_aggregations = std::iter::once(leaf("even", 5)).collect();
        let result = BucketResult {
            name: "all".to_string(),
            agg_type: "filter".to_string(),
            doc_count: 10,
            sub_aggregations,
        };
        let results: AggregationResults = std::iter::once(result).collect();
        assert_eq!(
            serde_json::to_value(&results).unwrap(),
            json!({
                "all": {
                    "doc_count": 10,
                    "even": { "doc_count": 5 }
                }
            })
        );
    }
}
