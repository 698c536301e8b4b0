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
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::tags::KeyValue;

/// Opaque trace identifier.
///
/// Two encodings may refer to the same logical trace: the canonical
/// fixed-width zero-padded form, and a legacy form with the leading zeros
/// stripped, written before the canonical padding was introduced.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TraceId {
    fn from(trace_id: String) -> Self {
        TraceId(trace_id)
    }
}

impl From<&str> for TraceId {
    fn from(trace_id: &str) -> Self {
        TraceId(trace_id.to_string())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// One unit of work within a trace, materialized from a stored document.
///
/// `start_time` and `duration` are microsecond counts; `start_time_millis`
/// mirrors `start_time` as a millisecond date field used for range queries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "traceID")]
    pub trace_id: TraceId,
    #[serde(rename = "spanID")]
    pub span_id: String,
    #[serde(rename = "parentSpanID", default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(default)]
    pub flags: u32,
    #[serde(rename = "operationName")]
    pub operation_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(rename = "startTime")]
    pub start_time: u64,
    #[serde(rename = "startTimeMillis")]
    pub start_time_millis: u64,
    pub duration: u64,
    /// Nested representation of span tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<KeyValue>,
    /// Elevated representation of span tags: one object field per tag key,
    /// with dots in keys replaced by the configured substitution token.
    #[serde(rename = "tag", default, skip_serializing_if = "HashMap::is_empty")]
    pub tag: HashMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<Log>,
    pub process: Process,
}

/// The process that emitted a span.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<KeyValue>,
    #[serde(rename = "tag", default, skip_serializing_if = "HashMap::is_empty")]
    pub tag: HashMap<String, JsonValue>,
}

/// A timed event attached to a span. Fields only exist in the nested
/// representation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Log {
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<KeyValue>,
}

/// A causal reference to another span.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "refType")]
    pub ref_type: RefType,
    #[serde(rename = "traceID")]
    pub trace_id: TraceId,
    #[serde(rename = "spanID")]
    pub span_id: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RefType {
    #[serde(rename = "CHILD_OF")]
    ChildOf,
    #[serde(rename = "FOLLOWS_FROM")]
    FollowsFrom,
}

/// An ordered collection of spans sharing a trace ID, assembled from
/// per-trace document batches. Spans are ordered by ascending start time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    pub spans: Vec<Span>,
}

/// An operation name recorded for a service.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
}
