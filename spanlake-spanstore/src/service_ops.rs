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

//! Retrieval of service and operation names from the service index, a
//! simpler keyed-lookup sibling of the span indices.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use spanlake_elasticsearch::dsl::{Aggregation, BoolQuery, MatchQuery, TermsAggregation};
use spanlake_elasticsearch::{
    ElasticsearchClientProvider, SearchRequest, SearchSource, TermsBucket,
};

use crate::SpanStoreError;

const SERVICE_NAME_AGGREGATION: &str = "distinct_services";
const OPERATION_NAME_AGGREGATION: &str = "distinct_operations";

const SERVICE_NAME_FIELD: &str = "serviceName";
const OPERATION_NAME_FIELD: &str = "operationName";

/// Narrow lookup contract over the service/operation aggregates written
/// alongside spans. Storage of the aggregates belongs to the write path; this
/// is the retrieval side only.
#[cfg_attr(any(test, feature = "testsuite"), mockall::automock)]
#[async_trait]
pub trait ServiceOperationStorage: Send + Sync + 'static {
    /// Returns the distinct service names recorded in the given indices,
    /// most frequent first.
    async fn get_services(
        &self,
        indices: Vec<String>,
        max_doc_count: u64,
    ) -> crate::Result<Vec<String>>;

    /// Returns the distinct operation names recorded for a service, most
    /// frequent first.
    async fn get_operations(
        &self,
        indices: Vec<String>,
        service_name: String,
        max_doc_count: u64,
    ) -> crate::Result<Vec<String>>;
}

/// [`ServiceOperationStorage`] over the Elasticsearch service index, using
/// terms aggregations on the service and operation name fields.
#[derive(Clone)]
pub struct EsServiceOperationStorage {
    client: ElasticsearchClientProvider,
}

impl EsServiceOperationStorage {
    pub fn new(client: ElasticsearchClientProvider) -> Self {
        EsServiceOperationStorage { client }
    }
}

#[async_trait]
impl ServiceOperationStorage for EsServiceOperationStorage {
    async fn get_services(
        &self,
        indices: Vec<String>,
        max_doc_count: u64,
    ) -> crate::Result<Vec<String>> {
        let aggregation =
            Aggregation::new(TermsAggregation::from_field(SERVICE_NAME_FIELD).size(max_doc_count));
        let source = SearchSource {
            size: Some(0),
            aggregations: BTreeMap::from_iter([(SERVICE_NAME_AGGREGATION.to_string(), aggregation)]),
            ..Default::default()
        };
        let client = (self.client)();
        let response = client
            .search(SearchRequest {
                indices,
                ignore_unavailable: true,
                source,
            })
            .await?;
        let Some(aggregations) = response.aggregations else {
            return Ok(Vec::new());
        };
        let terms = aggregations
            .terms(SERVICE_NAME_AGGREGATION)
            .ok_or(SpanStoreError::UnableToFindServicesAggregation)?;
        bucket_keys_to_strings(terms.buckets)
    }

    async fn get_operations(
        &self,
        indices: Vec<String>,
        service_name: String,
        max_doc_count: u64,
    ) -> crate::Result<Vec<String>> {
        let query = BoolQuery {
            must: vec![MatchQuery::from_field_value(SERVICE_NAME_FIELD, service_name).into()],
            should: Vec::new(),
        };
        let aggregation = Aggregation::new(
            TermsAggregation::from_field(OPERATION_NAME_FIELD).size(max_doc_count),
        );
        let source = SearchSource {
            query: Some(query.into()),
            size: Some(0),
            aggregations: BTreeMap::from_iter([(
                OPERATION_NAME_AGGREGATION.to_string(),
                aggregation,
            )]),
            ..Default::default()
        };
        let client = (self.client)();
        let response = client
            .search(SearchRequest {
                indices,
                ignore_unavailable: true,
                source,
            })
            .await?;
        let Some(aggregations) = response.aggregations else {
            return Ok(Vec::new());
        };
        let terms = aggregations
            .terms(OPERATION_NAME_AGGREGATION)
            .ok_or(SpanStoreError::UnableToFindOperationsAggregation)?;
        bucket_keys_to_strings(terms.buckets)
    }
}

/// Extracts aggregation bucket keys, requiring every key to be a string.
pub(crate) fn bucket_keys_to_strings(buckets: Vec<TermsBucket>) -> crate::Result<Vec<String>> {
    buckets
        .into_iter()
        .map(|bucket| match bucket.key {
            JsonValue::String(key) => Ok(key),
            _ => Err(SpanStoreError::NonStringAggregationKey),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use spanlake_elasticsearch::{static_client_provider, MockElasticsearchClient, SearchResponse};

    use super::*;

    fn search_response(body: JsonValue) -> SearchResponse {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_get_services() {
        let mut client = MockElasticsearchClient::new();
        client
            .expect_search()
            .times(1)
            .withf(|request| {
                let source = serde_json::to_value(&request.source).unwrap();
                request.indices == vec!["spanlake-service-2017-01-26".to_string()]
                    && source
                        == json!({
                            "size": 0,
                            "aggs": {"distinct_services": {
                                "terms": {"field": "serviceName", "size": 1000}
                            }}
                        })
            })
            .returning(|_| {
                Ok(search_response(json!({
                    "aggregations": {"distinct_services": {"buckets": [
                        {"key": "checkout", "doc_count": 7},
                        {"key": "frontend", "doc_count": 2}
                    ]}}
                })))
            });
        let storage = EsServiceOperationStorage::new(static_client_provider(Arc::new(client)));
        let services = storage
            .get_services(vec!["spanlake-service-2017-01-26".to_string()], 1000)
            .await
            .unwrap();
        assert_eq!(services, vec!["checkout", "frontend"]);
    }

    #[tokio::test]
    async fn test_get_operations_filters_by_service() {
        let mut client = MockElasticsearchClient::new();
        client
            .expect_search()
            .times(1)
            .withf(|request| {
                let source = serde_json::to_value(&request.source).unwrap();
                source["query"]
                    == json!({"bool": {"must": [
                        {"match": {"serviceName": {"query": "checkout"}}}
                    ]}})
            })
            .returning(|_| {
                Ok(search_response(json!({
                    "aggregations": {"distinct_operations": {"buckets": [
                        {"key": "get /api/checkout", "doc_count": 3}
                    ]}}
                })))
            });
        let storage = EsServiceOperationStorage::new(static_client_provider(Arc::new(client)));
        let operations = storage
            .get_operations(
                vec!["spanlake-service-2017-01-26".to_string()],
                "checkout".to_string(),
                1000,
            )
            .await
            .unwrap();
        assert_eq!(operations, vec!["get /api/checkout"]);
    }

    #[tokio::test]
    async fn test_get_services_missing_aggregation_is_a_contract_violation() {
        let mut client = MockElasticsearchClient::new();
        client
            .expect_search()
            .returning(|_| Ok(search_response(json!({"aggregations": {"wrong_name": {}}}))));
        let storage = EsServiceOperationStorage::new(static_client_provider(Arc::new(client)));
        let error = storage
            .get_services(vec!["spanlake-service-2017-01-26".to_string()], 1000)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            SpanStoreError::UnableToFindServicesAggregation
        ));
    }

    #[tokio::test]
    async fn test_get_services_without_aggregations_block_yields_empty() {
        let mut client = MockElasticsearchClient::new();
        client
            .expect_search()
            .returning(|_| Ok(search_response(json!({"took": 1}))));
        let storage = EsServiceOperationStorage::new(static_client_provider(Arc::new(client)));
        let services = storage
            .get_services(vec!["spanlake-service-2017-01-26".to_string()], 1000)
            .await
            .unwrap();
        assert!(services.is_empty());
    }

    #[test]
    fn test_bucket_keys_to_strings_rejects_non_string_keys() {
        let buckets: Vec<TermsBucket> = serde_json::from_value(json!([
            {"key": "fine", "doc_count": 1},
            {"key": 42, "doc_count": 1}
        ]))
        .unwrap();
        assert!(matches!(
            bucket_keys_to_strings(buckets),
            Err(SpanStoreError::NonStringAggregationKey)
        ));
    }
}
