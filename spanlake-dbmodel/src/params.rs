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

use time::{Duration, OffsetDateTime};

/// Search predicates for a trace query.
///
/// `start_time_min` and `start_time_max` are required. `service_name` is
/// required as soon as any tag predicate is present. Each tag predicate is an
/// exact-key / regex-value match.
#[derive(Clone, Debug, Default)]
pub struct TraceQueryParameters {
    pub service_name: String,
    pub operation_name: String,
    pub tags: HashMap<String, String>,
    pub start_time_min: Option<OffsetDateTime>,
    pub start_time_max: Option<OffsetDateTime>,
    pub duration_min: Option<Duration>,
    pub duration_max: Option<Duration>,
    /// Maximum number of traces to return. Zero means the engine default.
    pub num_traces: usize,
}

/// Parameters of an operation-name lookup.
#[derive(Clone, Debug, Default)]
pub struct OperationQueryParameters {
    pub service_name: String,
    /// Not pushed down yet.
    // TODO: filter by span kind once the service index records it.
    pub span_kind: String,
}
