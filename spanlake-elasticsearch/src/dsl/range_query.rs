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

pub type RangeQuery = OneFieldMap<RangeQueryParams>;

/// An inclusive numeric range. Only the bounds the read path actually emits
/// are modeled.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeQueryParams {
    pub gte: Option<u64>,
    pub lte: Option<u64>,
}

impl RangeQuery {
    pub fn from_field_bounds(field: impl ToString, gte: u64, lte: u64) -> RangeQuery {
        OneFieldMap {
            field: field.to_string(),
            value: RangeQueryParams {
                gte: Some(gte),
                lte: Some(lte),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_range_query_serialize() {
        let range_query = RangeQuery::from_field_bounds("duration", 0, 86_400_000_000);
        assert_eq!(
            serde_json::to_value(&range_query).unwrap(),
            json!({"duration": {"gte": 0, "lte": 86_400_000_000u64}})
        );
    }
}
