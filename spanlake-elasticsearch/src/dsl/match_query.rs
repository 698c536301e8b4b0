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

use crate::dsl::one_field_map::OneFieldMap;

pub type MatchQuery = OneFieldMap<MatchQueryParams>;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MatchQueryParams {
    pub query: String,
}

impl MatchQuery {
    pub fn from_field_value(field: impl ToString, query: impl ToString) -> MatchQuery {
        OneFieldMap {
            field: field.to_string(),
            value: MatchQueryParams {
                query: query.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_match_query_serialize() {
        let match_query = MatchQuery::from_field_value("process.serviceName", "checkout");
        assert_eq!(
            serde_json::to_value(&match_query).unwrap(),
            json!({"process.serviceName": {"query": "checkout"}})
        );
    }
}
