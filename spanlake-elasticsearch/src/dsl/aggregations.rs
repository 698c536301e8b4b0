// Copyright (C) 2024 Spanlake, Inc.
//
// Spanlake is offered under the AGPL v3.0 and as commercial software.
// For commercial licensing, contact us at hello@spanlake.io.
//
// AGPL:
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dsl::one_field_map::OneFieldMap;
use crate::search::SortOrder;

/// A named aggregation node with optional sub-aggregations.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Aggregation {
    #[serde(flatten)]
    pub kind: AggregationKind,
    #[serde(rename = "aggs", skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_aggregations: BTreeMap<String, Aggregation>,
}

impl Aggregation {
    pub fn new(kind: impl Into<AggregationKind>) -> Aggregation {
        Aggregation {
            kind: kind.into(),
            sub_aggregations: BTreeMap::new(),
        }
    }

    pub fn sub_aggregation(mut self, name: impl ToString, aggregation: Aggregation) -> Aggregation {
        self.sub_aggregations.insert(name.to_string(), aggregation);
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum AggregationKind {
    #[serde(rename = "terms")]
    Terms(TermsAggregation),
    #[serde(rename = "max")]
    Max(MaxAggregation),
}

impl From<TermsAggregation> for AggregationKind {
    fn from(terms_aggregation: TermsAggregation) -> Self {
        AggregationKind::Terms(terms_aggregation)
    }
}

impl From<MaxAggregation> for AggregationKind {
    fn from(max_aggregation: MaxAggregation) -> Self {
        AggregationKind::Max(max_aggregation)
    }
}

/// Groups documents by the distinct values of a field.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TermsAggregation {
    pub field: String,
    pub size: Option<u64>,
    /// Orders buckets by the value of a sub-aggregation.
    pub order: Option<OneFieldMap<SortOrder>>,
}

impl TermsAggregation {
    pub fn from_field(field: impl ToString) -> TermsAggregation {
        TermsAggregation {
            field: field.to_string(),
            size: None,
            order: None,
        }
    }

    pub fn size(mut self, size: u64) -> TermsAggregation {
        self.size = Some(size);
        self
    }

    pub fn order_by(mut self, sub_aggregation_name: impl ToString, order: SortOrder) -> TermsAggregation {
        self.order = Some(OneFieldMap {
            field: sub_aggregation_name.to_string(),
            value: order,
        });
        self
    }
}

/// The maximum value of a field across a bucket.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MaxAggregation {
    pub field: String,
}

impl MaxAggregation {
    pub fn from_field(field: impl ToString) -> MaxAggregation {
        MaxAggregation {
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_terms_aggregation_with_ordering_sub_aggregation() {
        let aggregation = Aggregation::new(
            TermsAggregation::from_field("traceID")
                .size(100)
                .order_by("startTime", SortOrder::Desc),
        )
        .sub_aggregation(
            "startTime",
            Aggregation::new(MaxAggregation::from_field("startTime")),
        );
        assert_eq!(
            serde_json::to_value(&aggregation).unwrap(),
            json!({
                "terms": {
                    "field": "traceID",
                    "size": 100,
                    "order": {"startTime": "desc"}
                },
                "aggs": {
                    "startTime": {"max": {"field": "startTime"}}
                }
            })
        );
    }

    #[test]
    fn test_terms_aggregation_minimal() {
        let aggregation = Aggregation::new(TermsAggregation::from_field("serviceName").size(1000));
        assert_eq!(
            serde_json::to_value(&aggregation).unwrap(),
            json!({"terms": {"field": "serviceName", "size": 1000}})
        );
    }
}
