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

//! Serialize-side subset of the Elasticsearch query DSL: exactly the query
//! and aggregation kinds the trace read path emits.

mod aggregations;
mod bool_query;
mod match_query;
mod nested_query;
mod one_field_map;
mod range_query;
mod regexp_query;
mod term_query;

use serde::Serialize;

pub use crate::dsl::aggregations::{
    Aggregation, AggregationKind, MaxAggregation, TermsAggregation,
};
pub use crate::dsl::bool_query::BoolQuery;
pub use crate::dsl::match_query::{MatchQuery, MatchQueryParams};
pub use crate::dsl::nested_query::NestedQuery;
pub use crate::dsl::one_field_map::OneFieldMap;
pub use crate::dsl::range_query::{RangeQuery, RangeQueryParams};
pub use crate::dsl::regexp_query::{RegexpQuery, RegexpQueryParams};
pub use crate::dsl::term_query::{TermQuery, TermQueryParams};

/// One node of the query DSL tree. Serializes to the externally tagged shape
/// Elasticsearch expects, e.g. `{"term": {...}}`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum ElasticQuery {
    #[serde(rename = "bool")]
    Bool(BoolQuery),
    #[serde(rename = "match")]
    Match(MatchQuery),
    #[serde(rename = "nested")]
    Nested(NestedQuery),
    #[serde(rename = "range")]
    Range(RangeQuery),
    #[serde(rename = "regexp")]
    Regexp(RegexpQuery),
    #[serde(rename = "term")]
    Term(TermQuery),
}

impl From<BoolQuery> for ElasticQuery {
    fn from(bool_query: BoolQuery) -> Self {
        ElasticQuery::Bool(bool_query)
    }
}

impl From<MatchQuery> for ElasticQuery {
    fn from(match_query: MatchQuery) -> Self {
        ElasticQuery::Match(match_query)
    }
}

impl From<NestedQuery> for ElasticQuery {
    fn from(nested_query: NestedQuery) -> Self {
        ElasticQuery::Nested(nested_query)
    }
}

impl From<RangeQuery> for ElasticQuery {
    fn from(range_query: RangeQuery) -> Self {
        ElasticQuery::Range(range_query)
    }
}

impl From<RegexpQuery> for ElasticQuery {
    fn from(regexp_query: RegexpQuery) -> Self {
        ElasticQuery::Regexp(regexp_query)
    }
}

impl From<TermQuery> for ElasticQuery {
    fn from(term_query: TermQuery) -> Self {
        ElasticQuery::Term(term_query)
    }
}
