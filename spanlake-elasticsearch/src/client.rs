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

use std::sync::Arc;

use async_trait::async_trait;

use crate::response::{MultiSearchResponse, SearchResponse};
use crate::search::{MultiSearchRequest, SearchRequest};
use crate::ElasticsearchResult;

/// The transport-owning side of the Elasticsearch collaboration.
///
/// Implementations own connection management and any retry policy. Callers
/// drive cancellation by dropping the returned futures.
#[cfg_attr(any(test, feature = "testsuite"), mockall::automock)]
#[async_trait]
pub trait ElasticsearchClient: Send + Sync + 'static {
    /// Runs a single search, possibly carrying aggregations.
    async fn search(&self, request: SearchRequest) -> ElasticsearchResult<SearchResponse>;

    /// Runs a batch of independent searches against a shared index set.
    async fn multi_search(
        &self,
        request: MultiSearchRequest,
    ) -> ElasticsearchResult<MultiSearchResponse>;
}

/// Returns the client to use for one call. Providers may rotate the
/// underlying client between calls (e.g. connection rotation); a caller takes
/// one snapshot per call and uses it throughout.
pub type ElasticsearchClientProvider = Arc<dyn Fn() -> Arc<dyn ElasticsearchClient> + Send + Sync>;

/// Provider that always hands out the same client.
pub fn static_client_provider(client: Arc<dyn ElasticsearchClient>) -> ElasticsearchClientProvider {
    Arc::new(move || client.clone())
}
