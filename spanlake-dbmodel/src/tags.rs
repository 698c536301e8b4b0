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

use std::collections::HashMap;
use std::mem;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::span::Span;

/// A span or process tag.
///
/// Serializes to the nested representation: `{"key": ..., "type": ...,
/// "value": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(flatten)]
    pub value: TagValue,
}

/// A typed tag value.
///
/// Binary values are never actually returned by the store; they arrive
/// pre-encoded as base64 strings and are carried through as such.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TagValue {
    String(String),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Binary(String),
}

/// Reversible substitution of a replacement token for literal dots in tag
/// keys. Dots are not permitted in object field names of the storage schema,
/// so elevated tag keys are stored with the token in place of each dot.
#[derive(Clone, Debug)]
pub struct DotReplacer {
    replacement: String,
}

impl DotReplacer {
    pub fn new(replacement: impl Into<String>) -> Self {
        DotReplacer {
            replacement: replacement.into(),
        }
    }

    /// Encodes a tag key for storage: `http.status_code` -> `http@status_code`
    /// with a `@` replacement.
    pub fn replace_dot(&self, key: &str) -> String {
        key.replace('.', &self.replacement)
    }

    /// Decodes a storage key back to the original tag key.
    pub fn replace_dot_replacement(&self, key: &str) -> String {
        key.replace(&self.replacement, ".")
    }
}

/// Reconciles the two historical tag representations into one canonical
/// nested list per tag scope.
#[derive(Clone, Debug)]
pub struct TagNormalizer {
    dot_replacer: DotReplacer,
}

impl TagNormalizer {
    pub fn new(dot_replacement: impl Into<String>) -> Self {
        TagNormalizer {
            dot_replacer: DotReplacer::new(dot_replacement),
        }
    }

    pub fn dot_replacer(&self) -> &DotReplacer {
        &self.dot_replacer
    }

    /// Folds the elevated tag maps of a span into its nested tag lists, for
    /// both the span scope and the process scope. The elevated maps are left
    /// empty afterwards.
    pub fn normalize_span(&self, span: &mut Span) {
        let nested = mem::take(&mut span.tags);
        let elevated = mem::take(&mut span.tag);
        span.tags = self.merge_nested_and_elevated(nested, elevated);

        let nested = mem::take(&mut span.process.tags);
        let elevated = mem::take(&mut span.process.tag);
        span.process.tags = self.merge_nested_and_elevated(nested, elevated);
    }

    /// Returns a unified tag list: all nested entries first, in their original
    /// order, followed by one entry per elevated key. The iteration order of
    /// the elevated map is not specified and is not preserved.
    pub fn merge_nested_and_elevated(
        &self,
        nested: Vec<KeyValue>,
        elevated: HashMap<String, JsonValue>,
    ) -> Vec<KeyValue> {
        let mut merged = Vec::with_capacity(nested.len() + elevated.len());
        merged.extend(nested);
        for (key, value) in elevated {
            merged.push(self.convert_tag_field(&key, value));
        }
        merged
    }

    /// Converts one elevated tag into a typed key/value, decoding the key.
    ///
    /// Numbers attempt an integer interpretation before falling back to
    /// floating point: the store does not keep a decimal point on whole
    /// floats, so `1.0` comes back as the integer `1`. A value of any other
    /// shape degrades to a string-typed diagnostic rather than failing the
    /// whole span.
    fn convert_tag_field(&self, key: &str, value: JsonValue) -> KeyValue {
        let key = self.dot_replacer.replace_dot_replacement(key);
        let value = match value {
            JsonValue::String(value) => TagValue::String(value),
            JsonValue::Bool(value) => TagValue::Bool(value),
            JsonValue::Number(number) => {
                if let Some(value) = number.as_i64() {
                    TagValue::Int64(value)
                } else if let Some(value) = number.as_f64() {
                    TagValue::Float64(value)
                } else {
                    TagValue::String(format!("invalid tag type in {number}: unrepresentable number"))
                }
            }
            value => TagValue::String(format!("invalid tag type in {value}")),
        };
        KeyValue { key, value }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_dot_replacer_round_trip() {
        let dot_replacer = DotReplacer::new("@");
        for key in ["http.status_code", "peer.ipv4", "plain", "a.b.c"] {
            let encoded = dot_replacer.replace_dot(key);
            assert!(!encoded.contains('.') || !key.contains('.'));
            assert_eq!(dot_replacer.replace_dot_replacement(&encoded), key);
        }
    }

    #[test]
    fn test_key_value_serde_shape() {
        let key_value = KeyValue {
            key: "http.status_code".to_string(),
            value: TagValue::Int64(500),
        };
        let serialized = serde_json::to_value(&key_value).unwrap();
        assert_eq!(
            serialized,
            json!({"key": "http.status_code", "type": "int64", "value": 500})
        );
        let deserialized: KeyValue = serde_json::from_value(serialized).unwrap();
        assert_eq!(deserialized, key_value);
    }

    #[test]
    fn test_key_value_deserialize_all_types() {
        let tags: Vec<KeyValue> = serde_json::from_value(json!([
            {"key": "a", "type": "string", "value": "foo"},
            {"key": "b", "type": "bool", "value": true},
            {"key": "c", "type": "int64", "value": -7},
            {"key": "d", "type": "float64", "value": 2.5},
            {"key": "e", "type": "binary", "value": "AQID"}
        ]))
        .unwrap();
        assert_eq!(tags[0].value, TagValue::String("foo".to_string()));
        assert_eq!(tags[1].value, TagValue::Bool(true));
        assert_eq!(tags[2].value, TagValue::Int64(-7));
        assert_eq!(tags[3].value, TagValue::Float64(2.5));
        assert_eq!(tags[4].value, TagValue::Binary("AQID".to_string()));
    }

    #[test]
    fn test_merge_nested_and_elevated() {
        let normalizer = TagNormalizer::new("@");
        let nested = vec![
            KeyValue {
                key: "first".to_string(),
                value: TagValue::String("1".to_string()),
            },
            KeyValue {
                key: "second".to_string(),
                value: TagValue::Bool(false),
            },
        ];
        let elevated = HashMap::from_iter([
            ("http@status_code".to_string(), json!(200)),
            ("sampler@param".to_string(), json!(true)),
        ]);
        let merged = normalizer.merge_nested_and_elevated(nested, elevated);
        assert_eq!(merged.len(), 4);
        // Nested entries come first and keep their order.
        assert_eq!(merged[0].key, "first");
        assert_eq!(merged[1].key, "second");
        let decoded_keys: Vec<&str> = merged[2..].iter().map(|tag| tag.key.as_str()).collect();
        assert!(decoded_keys.contains(&"http.status_code"));
        assert!(decoded_keys.contains(&"sampler.param"));
    }

    #[test]
    fn test_normalize_span_drains_elevated_maps() {
        let normalizer = TagNormalizer::new("@");
        let mut span: Span = serde_json::from_value(json!({
            "traceID": "abc",
            "spanID": "1",
            "operationName": "op",
            "startTime": 1u64,
            "startTimeMillis": 0u64,
            "duration": 0,
            "tags": [{"key": "nested", "type": "string", "value": "kept"}],
            "tag": {"retry_count": 3},
            "process": {"serviceName": "svc", "tag": {"host@name": "node-1"}}
        }))
        .unwrap();
        normalizer.normalize_span(&mut span);
        assert!(span.tag.is_empty());
        assert!(span.process.tag.is_empty());
        assert_eq!(span.tags.len(), 2);
        assert_eq!(span.tags[0].key, "nested");
        assert_eq!(span.tags[1].key, "retry_count");
        assert_eq!(span.tags[1].value, TagValue::Int64(3));
        assert_eq!(span.process.tags.len(), 1);
        assert_eq!(span.process.tags[0].key, "host.name");
    }

    #[test]
    fn test_convert_tag_field_integer_before_float() {
        let normalizer = TagNormalizer::new("@");
        let merged =
            normalizer.merge_nested_and_elevated(Vec::new(), HashMap::from_iter([
                ("retry_count".to_string(), json!(3)),
            ]));
        assert_eq!(merged[0].value, TagValue::Int64(3));

        let merged =
            normalizer.merge_nested_and_elevated(Vec::new(), HashMap::from_iter([
                ("ratio".to_string(), json!(0.25)),
            ]));
        assert_eq!(merged[0].value, TagValue::Float64(0.25));
    }

    #[test]
    fn test_convert_tag_field_degrades_to_diagnostic() {
        let normalizer = TagNormalizer::new("@");
        let merged =
            normalizer.merge_nested_and_elevated(Vec::new(), HashMap::from_iter([
                ("bad".to_string(), json!([1, 2, 3])),
            ]));
        match &merged[0].value {
            TagValue::String(diagnostic) => {
                assert!(diagnostic.starts_with("invalid tag type in"));
                assert!(diagnostic.contains("[1,2,3]"));
            }
            value => panic!("expected a string diagnostic, got {value:?}"),
        }
    }
}
