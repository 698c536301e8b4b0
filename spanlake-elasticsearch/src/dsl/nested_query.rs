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

/// Wraps a query so it runs within the scope of a nested-array field.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NestedQuery {
    pub path: String,
    pub query: Box<ElasticQuery>,
}

impl NestedQuery {
    pub fn new(path: impl ToString, query: impl Into<ElasticQuery>) -> NestedQuery {
        NestedQuery {
            path: path.to_string(),
            query: Box::new(query.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dsl::{BoolQuery, MatchQuery};

    #[test]
    fn test_nested_query_serialize() {
        let nested_query = NestedQuery::new(
            "tags",
            BoolQuery {
                must: vec![MatchQuery::from_field_value("tags.key", "error").into()],
                should: Vec::new(),
            },
        );
        assert_eq!(
            serde_json::to_value(&nested_query).unwrap(),
            json!({
                "path": "tags",
                "query": {"bool": {"must": [{"match": {"tags.key": {"query": "error"}}}]}}
            })
        );
    }
}
