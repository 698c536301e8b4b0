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

use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::sync::Arc;

use itertools::Itertools;
use serde_json::Value as JsonValue;
use spanlake_dbmodel::{
    to_epoch_micros, Operation, OperationQueryParameters, Span, TagNormalizer, Trace, TraceId,
    TraceQueryParameters,
};
use spanlake_elasticsearch::dsl::BoolQuery;
use spanlake_elasticsearch::{
    ElasticsearchClientProvider, Hit, IndexOptions, IndexPrefix, MultiSearchItem,
    MultiSearchRequest, SearchRequest, SearchSource, SortClause,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument};

use crate::index::TimeRangeIndices;
use crate::query::{
    build_find_trace_ids_query, build_start_time_query, build_trace_by_id_query,
    build_trace_id_aggregation, validate_query, START_TIME_FIELD,
};
use crate::service_ops::{bucket_keys_to_strings, EsServiceOperationStorage};
use crate::{ServiceOperationStorage, SpanStoreError};

const SPAN_INDEX_BASE_NAME: &str = "spanlake-span-";
const SERVICE_INDEX_BASE_NAME: &str = "spanlake-service-";

const TRACE_ID_AGGREGATION: &str = "traceIDs";

const DEFAULT_NUM_TRACES: usize = 100;

/// The oldest span the read alias can serve. Because partitions are by day,
/// this is effectively unbounded; alias mode delegates partition pruning to
/// the store, so the wide window does not widen any actual scan.
const DAWN_OF_TIME_SPAN_AGE: Duration = Duration::hours(24 * 365 * 50);

/// Constructor parameters for [`SpanReader`].
pub struct SpanReaderParams {
    pub client: ElasticsearchClientProvider,
    /// The age of the oldest span the reader will look for. Rounded down to
    /// a partition boundary by the index router.
    pub max_span_age: Duration,
    /// Page size of a single fetch round, per trace.
    pub max_doc_count: u64,
    pub index_prefix: IndexPrefix,
    pub span_index: IndexOptions,
    pub service_index: IndexOptions,
    /// Token substituted for dots in elevated tag keys.
    pub tag_dot_replacement: String,
    /// Alias suffix in read/write-alias mode; defaults to `read`.
    pub read_alias_suffix: Option<String>,
    pub use_read_write_aliases: bool,
    pub remote_read_clusters: Vec<String>,
    /// Also search the zero-stripped legacy encoding of trace IDs written
    /// before fixed-width padding was introduced. Boot-time migration aid,
    /// immutable for the lifetime of the reader.
    pub lookup_legacy_trace_ids: bool,
}

/// Queries for and loads traces from Elasticsearch.
pub struct SpanReader {
    client: ElasticsearchClientProvider,
    max_span_age: Duration,
    service_operation_storage: Arc<dyn ServiceOperationStorage>,
    span_index_prefix: String,
    service_index_prefix: String,
    span_index: IndexOptions,
    service_index: IndexOptions,
    time_range_indices: TimeRangeIndices,
    max_doc_count: u64,
    use_read_write_aliases: bool,
    lookup_legacy_trace_ids: bool,
    tag_normalizer: TagNormalizer,
}

impl SpanReader {
    pub fn new(params: SpanReaderParams) -> SpanReader {
        let SpanReaderParams {
            client,
            max_span_age,
            max_doc_count,
            index_prefix,
            span_index,
            service_index,
            tag_dot_replacement,
            read_alias_suffix,
            use_read_write_aliases,
            remote_read_clusters,
            lookup_legacy_trace_ids,
        } = params;
        // Everything the "read" alias serves must stay reachable by queries
        // (query window = [now - max_span_age, now]).
        let max_span_age = if use_read_write_aliases {
            DAWN_OF_TIME_SPAN_AGE
        } else {
            max_span_age
        };
        let service_operation_storage = Arc::new(EsServiceOperationStorage::new(client.clone()));
        SpanReader {
            span_index_prefix: index_prefix.apply(SPAN_INDEX_BASE_NAME),
            service_index_prefix: index_prefix.apply(SERVICE_INDEX_BASE_NAME),
            time_range_indices: TimeRangeIndices::new(
                use_read_write_aliases,
                read_alias_suffix,
                remote_read_clusters,
            ),
            tag_normalizer: TagNormalizer::new(tag_dot_replacement),
            client,
            max_span_age,
            service_operation_storage,
            span_index,
            service_index,
            max_doc_count,
            use_read_write_aliases,
            lookup_legacy_trace_ids,
        }
    }

    /// Swaps the service/operation storage, e.g. for an alternative aggregate
    /// layout or a test double.
    pub fn with_service_operation_storage(
        mut self,
        service_operation_storage: Arc<dyn ServiceOperationStorage>,
    ) -> SpanReader {
        self.service_operation_storage = service_operation_storage;
        self
    }

    /// Loads the traces associated with the given trace IDs, looking back
    /// `max_span_age` from now. Unknown IDs are skipped, not errors.
    #[instrument(skip_all)]
    pub async fn get_traces(&self, trace_ids: &[TraceId]) -> crate::Result<Vec<Trace>> {
        let unique_trace_ids: Vec<TraceId> = trace_ids.iter().cloned().unique().collect();
        let current_time = OffsetDateTime::now_utc();
        self.multi_read(
            unique_trace_ids,
            current_time - self.max_span_age,
            current_time,
        )
        .await
    }

    /// Returns all services with recorded spans, most frequent first.
    #[instrument(skip_all)]
    pub async fn get_services(&self) -> crate::Result<Vec<String>> {
        let current_time = OffsetDateTime::now_utc();
        let indices = self.time_range_indices.indices(
            &self.service_index_prefix,
            &self.service_index.date_layout,
            current_time - self.max_span_age,
            current_time,
            self.service_index.rollover_frequency.as_negative_duration(),
        );
        self.service_operation_storage
            .get_services(indices, self.max_doc_count)
            .await
    }

    /// Returns all operations recorded for a service.
    #[instrument(skip_all)]
    pub async fn get_operations(
        &self,
        query: OperationQueryParameters,
    ) -> crate::Result<Vec<Operation>> {
        let current_time = OffsetDateTime::now_utc();
        let indices = self.time_range_indices.indices(
            &self.service_index_prefix,
            &self.service_index.date_layout,
            current_time - self.max_span_age,
            current_time,
            self.service_index.rollover_frequency.as_negative_duration(),
        );
        let operations = self
            .service_operation_storage
            .get_operations(indices, query.service_name, self.max_doc_count)
            .await?;
        Ok(operations
            .into_iter()
            .map(|name| Operation { name })
            .collect())
    }

    /// Retrieves the traces matching the query.
    #[instrument(skip_all)]
    pub async fn find_traces(&self, query: &TraceQueryParameters) -> crate::Result<Vec<Trace>> {
        let (start_time_min, start_time_max) = validate_query(query)?;
        let trace_ids = self
            .find_trace_ids_aggregation(query, start_time_min, start_time_max)
            .await?;
        self.multi_read(trace_ids, start_time_min, start_time_max)
            .await
    }

    /// Retrieves the IDs of the traces matching the query, most recently
    /// started first.
    #[instrument(skip_all)]
    pub async fn find_trace_ids(
        &self,
        query: &TraceQueryParameters,
    ) -> crate::Result<Vec<TraceId>> {
        let (start_time_min, start_time_max) = validate_query(query)?;
        self.find_trace_ids_aggregation(query, start_time_min, start_time_max)
            .await
    }

    async fn find_trace_ids_aggregation(
        &self,
        query: &TraceQueryParameters,
        start_time_min: OffsetDateTime,
        start_time_max: OffsetDateTime,
    ) -> crate::Result<Vec<TraceId>> {
        let num_traces = if query.num_traces == 0 {
            DEFAULT_NUM_TRACES
        } else {
            query.num_traces
        };
        let bool_query = build_find_trace_ids_query(
            query,
            start_time_min,
            start_time_max,
            self.tag_normalizer.dot_replacer(),
        );
        let indices = self.time_range_indices.indices(
            &self.span_index_prefix,
            &self.span_index.date_layout,
            start_time_min,
            start_time_max,
            self.span_index.rollover_frequency.as_negative_duration(),
        );
        let source = SearchSource {
            query: Some(bool_query.into()),
            // Only the aggregation is wanted, no documents.
            size: Some(0),
            aggregations: BTreeMap::from_iter([(
                TRACE_ID_AGGREGATION.to_string(),
                build_trace_id_aggregation(num_traces),
            )]),
            ..Default::default()
        };
        let client = (self.client)();
        let response = match client
            .search(SearchRequest {
                indices,
                ignore_unavailable: true,
                source,
            })
            .await
        {
            Ok(response) => response,
            Err(error) => {
                info!(query = ?query, error = %error, "trace ID aggregation search failed");
                return Err(error.into());
            }
        };
        // A missing aggregations block means a truly empty index set: no
        // results. A present block missing our key is a contract violation.
        let Some(aggregations) = response.aggregations else {
            return Ok(Vec::new());
        };
        let terms = aggregations
            .terms(TRACE_ID_AGGREGATION)
            .ok_or(SpanStoreError::UnableToFindTraceIdAggregation)?;
        let trace_ids = bucket_keys_to_strings(terms.buckets)?
            .into_iter()
            .map(TraceId::from)
            .collect();
        Ok(trace_ids)
    }

    /// Fetches complete traces for a set of trace IDs through repeated
    /// batched multi-search rounds: each round requests one page per
    /// not-yet-exhausted trace, sorted by ascending start time with a
    /// search-after cursor, until every trace's reported total hit count is
    /// satisfied. Traces returning zero hits are dropped without error.
    #[instrument(skip_all)]
    async fn multi_read(
        &self,
        mut trace_ids: Vec<TraceId>,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
    ) -> crate::Result<Vec<Trace>> {
        let mut traces: Vec<Trace> = Vec::with_capacity(trace_ids.len());
        if trace_ids.is_empty() {
            return Ok(traces);
        }
        debug!(trace_ids = ?trace_ids, "fetching traces");
        let client = (self.client)();
        // Widen by an hour in both directions so that traces straddling two
        // partitions are retrieved, i.e. starting in one and ending in
        // another. Computed once per fetch, not per round.
        let indices = self.time_range_indices.indices(
            &self.span_index_prefix,
            &self.span_index.date_layout,
            start_time - Duration::hours(1),
            end_time + Duration::hours(1),
            self.span_index.rollover_frequency.as_negative_duration(),
        );
        let initial_search_after = to_epoch_micros(start_time - Duration::hours(1));
        let mut search_after_time: HashMap<TraceId, u64> = HashMap::new();
        let mut total_documents_fetched: HashMap<TraceId, u64> = HashMap::new();
        let mut trace_positions: HashMap<TraceId, usize> = HashMap::new();
        while !trace_ids.is_empty() {
            let mut items = Vec::with_capacity(trace_ids.len());
            for trace_id in &trace_ids {
                let mut bool_query = BoolQuery {
                    must: vec![build_trace_by_id_query(
                        trace_id,
                        self.lookup_legacy_trace_ids,
                    )],
                    should: Vec::new(),
                };
                if self.use_read_write_aliases {
                    // The read alias spans the whole retention window; guard
                    // the query to ±24h around the requested range.
                    bool_query.must.push(build_start_time_query(
                        start_time - Duration::hours(24),
                        end_time + Duration::hours(24),
                    ));
                }
                let search_after = search_after_time
                    .get(trace_id)
                    .copied()
                    .unwrap_or(initial_search_after);
                items.push(MultiSearchItem {
                    ignore_unavailable: true,
                    source: SearchSource {
                        query: Some(bool_query.into()),
                        size: Some(self.max_doc_count),
                        sort: vec![SortClause::ascending(START_TIME_FIELD)],
                        search_after: Some(vec![JsonValue::from(search_after)]),
                        track_total_hits: Some(true),
                        aggregations: BTreeMap::new(),
                    },
                });
            }
            let round_trace_ids = mem::take(&mut trace_ids);
            let results = client
                .multi_search(MultiSearchRequest {
                    indices: indices.clone(),
                    items,
                })
                .await?;
            if results.responses.is_empty() {
                break;
            }
            for (requested_trace_id, result) in round_trace_ids.iter().zip(results.responses) {
                let page = result.response.and_then(|response| {
                    let total_hits = response.total_hits();
                    response
                        .hits
                        .map(|hits_metadata| (hits_metadata.hits, total_hits))
                });
                let Some((hits, total_hits)) = page else {
                    continue;
                };
                if hits.is_empty() {
                    // The trace may have expired or never existed. A
                    // transiently empty page lands here too and silently
                    // drops the trace.
                    debug!(trace_id = %requested_trace_id, "no hits for outstanding trace");
                    continue;
                }
                let num_hits = hits.len() as u64;
                let spans = self.collect_spans(hits)?;
                let last_span = spans.last().expect("the span batch is non-empty");
                let last_trace_id = last_span.trace_id.clone();
                let last_span_start_time = last_span.start_time;
                // Merging is keyed by the trace ID carried on the returned
                // documents, which may be the legacy encoding of the
                // requested one.
                match trace_positions.get(&last_trace_id) {
                    Some(&position) => traces[position].spans.extend(spans),
                    None => {
                        trace_positions.insert(last_trace_id.clone(), traces.len());
                        traces.push(Trace { spans });
                    }
                }
                let fetched = total_documents_fetched
                    .entry(last_trace_id.clone())
                    .or_insert(0);
                *fetched += num_hits;
                if *fetched < total_hits {
                    search_after_time.insert(last_trace_id.clone(), last_span_start_time);
                    trace_ids.push(last_trace_id);
                }
            }
        }
        Ok(traces)
    }

    /// Decodes a page of documents into normalized spans. One malformed
    /// document fails the whole batch.
    fn collect_spans(&self, hits: Vec<Hit>) -> crate::Result<Vec<Span>> {
        let mut spans = Vec::with_capacity(hits.len());
        for hit in hits {
            let mut span: Span = serde_json::from_value(hit.source)
                .map_err(|error| SpanStoreError::SpanDecode { source: error })?;
            self.tag_normalizer.normalize_span(&mut span);
            spans.push(span);
        }
        Ok(spans)
    }
}
