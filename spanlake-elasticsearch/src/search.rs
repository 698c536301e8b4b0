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
use serde_json::Value as JsonValue;

use crate::dsl::{Aggregation, ElasticQuery, OneFieldMap};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One element of a search body `sort` array:
/// `{"startTime": {"order": "asc"}}`.
pub type SortClause = OneFieldMap<SortClauseParams>;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SortClauseParams {
    pub order: SortOrder,
}

impl SortClause {
    pub fn ascending(field: impl ToString) -> SortClause {
        OneFieldMap {
            field: field.to_string(),
            value: SortClauseParams {
                order: SortOrder::Asc,
            },
        }
    }
}

/// The body of a `_search` request.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SearchSource {
    pub query: Option<ElasticQuery>,
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,
    pub search_after: Option<Vec<JsonValue>>,
    pub track_total_hits: Option<bool>,
    #[serde(rename = "aggs", skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregations: BTreeMap<String, Aggregation>,
}

/// A single search sent to a set of indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub indices: Vec<String>,
    /// Skip index names that do not exist instead of failing the request.
    pub ignore_unavailable: bool,
    pub source: SearchSource,
}

/// A batch of independent searches sharing one index set. Responses come back
/// in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSearchRequest {
    pub indices: Vec<String>,
    pub items: Vec<MultiSearchItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiSearchItem {
    pub ignore_unavailable: bool,
    pub source: SearchSource,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dsl::TermQuery;

    #[test]
    fn test_search_source_serialize() {
        let source = SearchSource {
            query: Some(TermQuery::from_field_value("traceID", "abc").into()),
            size: Some(10_000),
            sort: vec![SortClause::ascending("startTime")],
            search_after: Some(vec![json!(1_485_467_191_639_875u64)]),
            track_total_hits: Some(true),
            aggregations: BTreeMap::new(),
        };
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            json!({
                "query": {"term": {"traceID": {"value": "abc"}}},
                "size": 10_000,
                "sort": [{"startTime": {"order": "asc"}}],
                "search_after": [1_485_467_191_639_875u64],
                "track_total_hits": true
            })
        );
    }

    #[test]
    fn test_search_source_serialize_empty() {
        assert_eq!(
            serde_json::to_value(SearchSource::default()).unwrap(),
            json!({})
        );
    }
}
