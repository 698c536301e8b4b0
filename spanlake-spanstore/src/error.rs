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

use spanlake_elasticsearch::ElasticsearchError;
use thiserror::Error;

/// Possible SpanStoreError
#[derive(Error, Debug)]
pub enum SpanStoreError {
    /// The request object is missing entirely or structurally unusable.
    #[error("malformed request object")]
    MalformedRequestObject,
    /// A query carries tag predicates without naming a service.
    #[error("service name must be set")]
    ServiceNameNotSet,
    /// A query is missing its start or end time bound.
    #[error("start and end time must be set")]
    StartAndEndTimeNotSet,
    #[error("start time minimum is above maximum")]
    StartTimeMinGreaterThanMax,
    #[error("duration minimum is above maximum")]
    DurationMinGreaterThanMax,
    /// A structurally successful response is missing the trace-ID
    /// aggregation it was asked for: a store-contract violation, not an
    /// absence of results.
    #[error("could not find aggregation of traceIDs")]
    UnableToFindTraceIdAggregation,
    #[error("could not find aggregation of services")]
    UnableToFindServicesAggregation,
    #[error("could not find aggregation of operations")]
    UnableToFindOperationsAggregation,
    #[error("non-string key found in aggregation")]
    NonStringAggregationKey,
    #[error("search failed: {0}")]
    Elasticsearch(#[from] ElasticsearchError),
    /// A stored document does not decode into a span. One bad document fails
    /// the containing batch.
    #[error("marshalling JSON to span object failed: {source}")]
    SpanDecode {
        #[source]
        source: serde_json::Error,
    },
}
