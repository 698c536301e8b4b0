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

use serde::ser::SerializeMap;
use serde::Serialize;

/// Helper to serialize the `{"my_field": {..}}` object shape pervasive in the
/// Elasticsearch DSL.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct OneFieldMap<V> {
    pub field: String,
    pub value: V,
}

impl<V: Serialize> Serialize for OneFieldMap<V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::OneFieldMap;

    #[derive(Serialize, Debug, Clone, PartialEq, Eq)]
    struct Property {
        count: usize,
    }

    #[test]
    fn test_one_field_map_serialize() {
        let one_field_map = OneFieldMap {
            field: "my-field".to_string(),
            value: Property { count: 2 },
        };
        let json = serde_json::to_value(one_field_map).unwrap();
        assert_eq!(&json, &serde_json::json!({"my-field": {"count": 2}}));
    }
}
