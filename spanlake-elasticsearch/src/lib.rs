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

//! Read-side surface of the Elasticsearch collaborator.
//!
//! This crate owns everything the span store needs to talk to the document
//! store without owning the transport itself: a serialize-side query DSL, the
//! search and multi-search protocol types, the [`ElasticsearchClient`] trait
//! implemented by the transport, and the index configuration (prefix, date
//! layout, rollover frequency).

#![deny(clippy::disallowed_methods)]

mod client;
mod config;
pub mod dsl;
mod error;
mod response;
mod search;

pub use crate::client::{static_client_provider, ElasticsearchClient, ElasticsearchClientProvider};
#[cfg(any(test, feature = "testsuite"))]
pub use crate::client::MockElasticsearchClient;
pub use crate::config::{IndexDateLayout, IndexOptions, IndexPrefix, RolloverFrequency};
pub use crate::error::{ElasticsearchError, ErrorCause};
pub use crate::response::{
    AggregationResults, Hit, HitsMetadata, MultiSearchResponse, MultiSearchSingleResponse,
    SearchResponse, TermsAggregationResult, TermsBucket, TotalHits, TotalHitsRelation,
};
pub use crate::search::{
    MultiSearchItem, MultiSearchRequest, SearchRequest, SearchSource, SortClause, SortOrder,
};

/// Refer to this as `ElasticsearchResult<T>`.
pub type ElasticsearchResult<T> = std::result::Result<T, ElasticsearchError>;
