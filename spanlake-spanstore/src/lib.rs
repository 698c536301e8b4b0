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

//! Trace-query engine over time-partitioned span indices.
//!
//! [`SpanReader`] is the read path: it routes a time range to the relevant
//! index partitions, compiles structured trace queries into the document
//! store's query DSL, discovers matching trace IDs through an aggregation,
//! and reassembles paginated per-trace document batches into complete traces.

#![deny(clippy::disallowed_methods)]

mod error;
mod index;
mod query;
mod reader;
mod service_ops;

pub use crate::error::SpanStoreError;
pub use crate::index::TimeRangeIndices;
pub use crate::reader::{SpanReader, SpanReaderParams};
pub use crate::service_ops::{EsServiceOperationStorage, ServiceOperationStorage};
#[cfg(any(test, feature = "testsuite"))]
pub use crate::service_ops::MockServiceOperationStorage;

/// Refer to this as `crate::Result<T>`.
pub type Result<T> = std::result::Result<T, SpanStoreError>;
