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

//! Document model for spans as they are stored in Elasticsearch.
//!
//! The structs in this crate mirror the persisted document layout one to one:
//! one document per span, with tags stored both as nested key/value arrays and
//! as "elevated" per-key object fields, depending on the writer configuration
//! that produced the document.

#![deny(clippy::disallowed_methods)]

mod params;
mod span;
mod tags;

use time::OffsetDateTime;

pub use crate::params::{OperationQueryParameters, TraceQueryParameters};
pub use crate::span::{Log, Operation, Process, Reference, RefType, Span, Trace, TraceId};
pub use crate::tags::{DotReplacer, KeyValue, TagNormalizer, TagValue};

/// Converts a point in time into the epoch microseconds stored in the
/// `startTime` span field.
pub fn to_epoch_micros(timestamp: OffsetDateTime) -> u64 {
    (timestamp.unix_timestamp_nanos() / 1_000) as u64
}

/// Converts a duration into the microsecond count stored in the `duration`
/// span field. Negative durations clamp to zero.
pub fn duration_micros(duration: time::Duration) -> u64 {
    duration.whole_microseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_to_epoch_micros() {
        assert_eq!(to_epoch_micros(OffsetDateTime::UNIX_EPOCH), 0);
        assert_eq!(
            to_epoch_micros(datetime!(2017-01-26 16:46:31.639875 UTC)),
            1_485_449_191_639_875
        );
    }

    #[test]
    fn test_duration_micros() {
        assert_eq!(duration_micros(time::Duration::hours(24)), 86_400_000_000);
        assert_eq!(duration_micros(time::Duration::microseconds(65)), 65);
        assert_eq!(duration_micros(time::Duration::seconds(-1)), 0);
    }
}
