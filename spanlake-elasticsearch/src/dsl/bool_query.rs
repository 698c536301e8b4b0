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

use serde::Serialize;

use crate::dsl::ElasticQuery;

/// Boolean combination of queries. The read path only emits `must` and
/// `should` clauses.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<ElasticQuery>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<ElasticQuery>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dsl::TermQuery;

    #[test]
    fn test_bool_query_serialize() {
        let bool_query = BoolQuery {
            must: vec![TermQuery::from_field_value("traceID", "abc").into()],
            should: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&bool_query).unwrap(),
            json!({"must": [{"term": {"traceID": {"value": "abc"}}}]})
        );
    }

    #[test]
    fn test_bool_query_skips_empty_clause_lists() {
        let bool_query = BoolQuery::default();
        assert_eq!(serde_json::to_value(&bool_query).unwrap(), json!({}));
    }
}
