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

use spanlake_elasticsearch::IndexDateLayout;
use time::{Duration, OffsetDateTime};
use tracing::debug;

const DEFAULT_READ_ALIAS_SUFFIX: &str = "read";

/// Routes a time range to the list of index partition names to search.
///
/// In read-alias mode partition enumeration is delegated to the store's alias
/// mechanism and the router returns a single alias name regardless of the
/// time range.
#[derive(Clone, Debug)]
pub struct TimeRangeIndices {
    use_read_write_aliases: bool,
    read_alias_suffix: String,
    remote_read_clusters: Vec<String>,
}

impl TimeRangeIndices {
    pub fn new(
        use_read_write_aliases: bool,
        read_alias_suffix: Option<String>,
        remote_read_clusters: Vec<String>,
    ) -> Self {
        let read_alias_suffix =
            read_alias_suffix.unwrap_or_else(|| DEFAULT_READ_ALIAS_SUFFIX.to_string());
        TimeRangeIndices {
            use_read_write_aliases,
            read_alias_suffix,
            remote_read_clusters,
        }
    }

    /// Computes the partition names covering `[start_time, end_time]`,
    /// newest first, with remote-cluster variants appended after the local
    /// names.
    pub fn indices(
        &self,
        index_prefix: &str,
        date_layout: &IndexDateLayout,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
        rollover_step: Duration,
    ) -> Vec<String> {
        let indices = if self.use_read_write_aliases {
            vec![format!("{index_prefix}{}", self.read_alias_suffix)]
        } else {
            time_range_indices(index_prefix, date_layout, start_time, end_time, rollover_step)
        };
        let indices = self.add_remote_read_clusters(indices);
        debug!(indices = ?indices, "reading from indices");
        indices
    }

    // Cross-cluster search addresses remote indices as `cluster:index`, e.g.
    // GET /twitter,cluster_one:twitter,cluster_two:twitter/_search.
    fn add_remote_read_clusters(&self, mut indices: Vec<String>) -> Vec<String> {
        if self.remote_read_clusters.is_empty() {
            return indices;
        }
        let local_indices = indices.clone();
        for index in &local_indices {
            for remote_cluster in &self.remote_read_clusters {
                indices.push(format!("{remote_cluster}:{index}"));
            }
        }
        indices
    }
}

/// Walks backwards from `end_time` to `start_time` in rollover steps,
/// emitting one partition name per step. The partition covering `start_time`
/// is always the last entry; adjacent duplicates are elided.
fn time_range_indices(
    index_prefix: &str,
    date_layout: &IndexDateLayout,
    start_time: OffsetDateTime,
    mut end_time: OffsetDateTime,
    rollover_step: Duration,
) -> Vec<String> {
    let mut indices = Vec::new();
    let first_index = index_with_date(index_prefix, date_layout, start_time);
    let mut current_index = index_with_date(index_prefix, date_layout, end_time);
    while current_index != first_index && end_time > start_time {
        if indices.last() != Some(&current_index) {
            indices.push(current_index);
        }
        end_time += rollover_step;
        current_index = index_with_date(index_prefix, date_layout, end_time);
    }
    indices.push(first_index);
    indices
}

fn index_with_date(
    index_prefix: &str,
    date_layout: &IndexDateLayout,
    date: OffsetDateTime,
) -> String {
    format!("{index_prefix}{}", date_layout.format(date))
}
