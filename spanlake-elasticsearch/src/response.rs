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

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::ErrorCause;

/// The subset of a `_search` response the read path consumes.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub hits: Option<HitsMetadata>,
    #[serde(default)]
    pub aggregations: Option<AggregationResults>,
}

impl SearchResponse {
    /// The total hit count reported for the query, zero when absent.
    pub fn total_hits(&self) -> u64 {
        self.hits
            .as_ref()
            .and_then(|hits| hits.total.as_ref())
            .map(|total| total.value)
            .unwrap_or(0)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct HitsMetadata {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TotalHits {
    pub value: u64,
    #[serde(default)]
    pub relation: TotalHitsRelation,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TotalHitsRelation {
    #[default]
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: JsonValue,
    #[serde(default)]
    pub sort: Vec<JsonValue>,
}

/// The `aggregations` block of a search response, keyed by aggregation name.
/// Entries are decoded lazily by the accessors.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct AggregationResults(HashMap<String, JsonValue>);

impl AggregationResults {
    /// Decodes the named entry as a terms aggregation. Returns `None` when
    /// the entry is absent or does not have the terms bucket shape; callers
    /// treat both as a store-contract violation.
    pub fn terms(&self, name: &str) -> Option<TermsAggregationResult> {
        let entry = self.0.get(name)?;
        serde_json::from_value(entry.clone()).ok()
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TermsAggregationResult {
    #[serde(default)]
    pub buckets: Vec<TermsBucket>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TermsBucket {
    pub key: JsonValue,
    #[serde(default)]
    pub doc_count: u64,
}

/// Response to a multi-search request. Items come back in request order.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MultiSearchResponse {
    #[serde(default)]
    pub responses: Vec<MultiSearchSingleResponse>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MultiSearchSingleResponse {
    #[serde(default)]
    pub status: u16,
    #[serde(flatten)]
    pub response: Option<SearchResponse>,
    #[serde(default)]
    pub error: Option<ErrorCause>,
}
