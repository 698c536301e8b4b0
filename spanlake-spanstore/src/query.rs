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

//! Compiles structured trace queries into the document store's query DSL.

use spanlake_dbmodel::{
    duration_micros, to_epoch_micros, DotReplacer, TraceId, TraceQueryParameters,
};
use spanlake_elasticsearch::dsl::{
    Aggregation, BoolQuery, ElasticQuery, MatchQuery, MaxAggregation, NestedQuery, RangeQuery,
    RegexpQuery, TermQuery, TermsAggregation,
};
use spanlake_elasticsearch::SortOrder;
use time::OffsetDateTime;

use crate::SpanStoreError;

pub(crate) const TRACE_ID_FIELD: &str = "traceID";
pub(crate) const DURATION_FIELD: &str = "duration";
pub(crate) const START_TIME_FIELD: &str = "startTime";
pub(crate) const START_TIME_MILLIS_FIELD: &str = "startTimeMillis";
pub(crate) const SERVICE_NAME_FIELD: &str = "process.serviceName";
pub(crate) const OPERATION_NAME_FIELD: &str = "operationName";

const OBJECT_TAGS_FIELD: &str = "tag";
const OBJECT_PROCESS_TAGS_FIELD: &str = "process.tag";
const NESTED_TAGS_FIELD: &str = "tags";
const NESTED_PROCESS_TAGS_FIELD: &str = "process.tags";
const NESTED_LOG_FIELDS_FIELD: &str = "logs.fields";
const TAG_KEY_FIELD: &str = "key";
const TAG_VALUE_FIELD: &str = "value";

/// Tag layouts with one object field per tag key.
const OBJECT_TAG_FIELDS: [&str; 2] = [OBJECT_TAGS_FIELD, OBJECT_PROCESS_TAGS_FIELD];

/// Tag layouts stored as nested key/value arrays.
const NESTED_TAG_FIELDS: [&str; 3] = [
    NESTED_TAGS_FIELD,
    NESTED_PROCESS_TAGS_FIELD,
    NESTED_LOG_FIELDS_FIELD,
];

/// Default ceiling for the duration range when only a minimum is given:
/// 24 hours in microseconds.
const DEFAULT_MAX_DURATION_MICROS: u64 = 86_400_000_000;

const LEGACY_TRACE_ID_BOOST: f32 = 2.0;

/// Rejects malformed or contradictory query parameters before any store
/// interaction. Returns the required time bounds on success.
pub(crate) fn validate_query(
    query: &TraceQueryParameters,
) -> crate::Result<(OffsetDateTime, OffsetDateTime)> {
    if query.service_name.is_empty() && !query.tags.is_empty() {
        return Err(SpanStoreError::ServiceNameNotSet);
    }
    let (Some(start_time_min), Some(start_time_max)) =
        (query.start_time_min, query.start_time_max)
    else {
        return Err(SpanStoreError::StartAndEndTimeNotSet);
    };
    if start_time_max < start_time_min {
        return Err(SpanStoreError::StartTimeMinGreaterThanMax);
    }
    if let (Some(duration_min), Some(duration_max)) = (query.duration_min, query.duration_max) {
        if duration_min > duration_max {
            return Err(SpanStoreError::DurationMinGreaterThanMax);
        }
    }
    Ok((start_time_min, start_time_max))
}

/// Builds the conjunctive predicate matching every search criterion of a
/// trace query.
pub(crate) fn build_find_trace_ids_query(
    query: &TraceQueryParameters,
    start_time_min: OffsetDateTime,
    start_time_max: OffsetDateTime,
    dot_replacer: &DotReplacer,
) -> BoolQuery {
    let mut bool_query = BoolQuery::default();

    if query.duration_min.is_some() || query.duration_max.is_some() {
        bool_query
            .must
            .push(build_duration_query(query.duration_min, query.duration_max));
    }

    bool_query
        .must
        .push(build_start_time_query(start_time_min, start_time_max));

    if !query.service_name.is_empty() {
        bool_query
            .must
            .push(MatchQuery::from_field_value(SERVICE_NAME_FIELD, &query.service_name).into());
    }

    if !query.operation_name.is_empty() {
        bool_query
            .must
            .push(MatchQuery::from_field_value(OPERATION_NAME_FIELD, &query.operation_name).into());
    }

    for (key, value) in &query.tags {
        bool_query.must.push(build_tag_query(key, value, dot_replacer));
    }
    bool_query
}

fn build_duration_query(
    duration_min: Option<time::Duration>,
    duration_max: Option<time::Duration>,
) -> ElasticQuery {
    let min_duration_micros = duration_min.map(duration_micros).unwrap_or(0);
    let max_duration_micros = duration_max
        .map(duration_micros)
        .unwrap_or(DEFAULT_MAX_DURATION_MICROS);
    RangeQuery::from_field_bounds(DURATION_FIELD, min_duration_micros, max_duration_micros).into()
}

/// Builds the start-time range conjunct against the millisecond date field:
/// ranging on a date field lets Elasticsearch skip shards that cannot match.
pub(crate) fn build_start_time_query(
    start_time_min: OffsetDateTime,
    start_time_max: OffsetDateTime,
) -> ElasticQuery {
    RangeQuery::from_field_bounds(
        START_TIME_MILLIS_FIELD,
        to_epoch_micros(start_time_min) / 1000,
        to_epoch_micros(start_time_max) / 1000,
    )
    .into()
}

/// Compiles one tag predicate into a disjunction over every tag storage
/// layout at once: the schema evolved over time and indices may hold data
/// written under either layout, so queries must stay correct against mixed
/// layouts without a migration step.
fn build_tag_query(key: &str, value: &str, dot_replacer: &DotReplacer) -> ElasticQuery {
    let encoded_key = dot_replacer.replace_dot(key);
    let mut queries: Vec<ElasticQuery> =
        Vec::with_capacity(OBJECT_TAG_FIELDS.len() + NESTED_TAG_FIELDS.len());
    for field in OBJECT_TAG_FIELDS {
        queries.push(build_object_tag_query(field, &encoded_key, value));
    }
    for field in NESTED_TAG_FIELDS {
        queries.push(build_nested_tag_query(field, key, value));
    }
    BoolQuery {
        must: Vec::new(),
        should: queries,
    }
    .into()
}

fn build_nested_tag_query(field: &str, key: &str, value: &str) -> ElasticQuery {
    let key_field = format!("{field}.{TAG_KEY_FIELD}");
    let value_field = format!("{field}.{TAG_VALUE_FIELD}");
    let tag_bool_query = BoolQuery {
        must: vec![
            MatchQuery::from_field_value(key_field, key).into(),
            RegexpQuery::from_field_value(value_field, value).into(),
        ],
        should: Vec::new(),
    };
    NestedQuery::new(field, tag_bool_query).into()
}

fn build_object_tag_query(field: &str, encoded_key: &str, value: &str) -> ElasticQuery {
    let key_field = format!("{field}.{encoded_key}");
    BoolQuery {
        must: vec![RegexpQuery::from_field_value(key_field, value).into()],
        should: Vec::new(),
    }
    .into()
}

/// Builds the trace-ID discovery aggregation: group by trace ID, rank groups
/// by their most recent span start time, keep the `num_traces` most recent.
pub(crate) fn build_trace_id_aggregation(num_traces: usize) -> Aggregation {
    Aggregation::new(
        TermsAggregation::from_field(TRACE_ID_FIELD)
            .size(num_traces as u64)
            .order_by(START_TIME_FIELD, SortOrder::Desc),
    )
    .sub_aggregation(
        START_TIME_FIELD,
        Aggregation::new(MaxAggregation::from_field(START_TIME_FIELD)),
    )
}

/// Resolves the trace-ID encodings to search for one trace.
///
/// IDs written before fixed-width zero padding was introduced lack the
/// leading zeros, so when legacy lookup is enabled an ID starting with '0'
/// also matches its stripped form, with the canonical form boosted above it.
pub(crate) fn build_trace_by_id_query(
    trace_id: &TraceId,
    lookup_legacy_trace_ids: bool,
) -> ElasticQuery {
    let trace_id_str = trace_id.as_str();
    if !trace_id_str.starts_with('0') || !lookup_legacy_trace_ids {
        return TermQuery::from_field_value(TRACE_ID_FIELD, trace_id_str).into();
    }
    let legacy_trace_id = trace_id_str.trim_start_matches('0');
    BoolQuery {
        must: Vec::new(),
        should: vec![
            TermQuery::from_field_value(TRACE_ID_FIELD, trace_id_str)
                .boost(LEGACY_TRACE_ID_BOOST)
                .into(),
            TermQuery::from_field_value(TRACE_ID_FIELD, legacy_trace_id).into(),
        ],
    }
    .into()
}
