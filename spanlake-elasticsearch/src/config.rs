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

use std::fmt;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::OwnedFormatItem;
use time::{Duration, OffsetDateTime, UtcOffset};

const INDEX_PREFIX_SEPARATOR: &str = "-";

/// Optional user-level prefix applied to every index base name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexPrefix(String);

impl IndexPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        IndexPrefix(prefix.into())
    }

    /// Prepends the prefix to an index base name, separated with a dash:
    /// `IndexPrefix("tenant1").apply("spanlake-span-")` ->
    /// `"tenant1-spanlake-span-"`. An empty prefix leaves the name untouched.
    pub fn apply(&self, index_base_name: &str) -> String {
        if self.0.is_empty() {
            index_base_name.to_string()
        } else {
            format!("{}{}{}", self.0, INDEX_PREFIX_SEPARATOR, index_base_name)
        }
    }
}

/// How often the write path rolls over to a new index partition.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum RolloverFrequency {
    #[default]
    Daily,
    Hourly,
}

impl RolloverFrequency {
    pub fn as_str(&self) -> &str {
        match self {
            RolloverFrequency::Daily => "day",
            RolloverFrequency::Hourly => "hour",
        }
    }

    /// The negative step the index router walks backwards with, from the end
    /// of a time range to its start.
    pub fn as_negative_duration(&self) -> Duration {
        match self {
            RolloverFrequency::Daily => Duration::hours(-24),
            RolloverFrequency::Hourly => Duration::hours(-1),
        }
    }
}

impl Display for RolloverFrequency {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RolloverFrequency {
    type Err = String;

    fn from_str(frequency_str: &str) -> Result<Self, Self::Err> {
        match frequency_str.to_lowercase().as_str() {
            "day" => Ok(RolloverFrequency::Daily),
            "hour" => Ok(RolloverFrequency::Hourly),
            _ => Err(format!(
                "unknown rollover frequency: `{frequency_str}`. expected `day` or `hour`"
            )),
        }
    }
}

impl Serialize for RolloverFrequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RolloverFrequency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let frequency_str: String = Deserialize::deserialize(deserializer)?;
        frequency_str.parse().map_err(D::Error::custom)
    }
}

/// A date layout used to derive partition names, expressed in the `time`
/// crate format description syntax, e.g. `[year]-[month]-[day]`.
///
/// The layout is validated once at parse time; formatting afterwards cannot
/// fail.
#[derive(Clone)]
pub struct IndexDateLayout {
    items: Arc<OwnedFormatItem>,
    layout_str: String,
}

impl IndexDateLayout {
    /// Formats a date (normalized to UTC) according to the layout.
    pub fn format(&self, date: OffsetDateTime) -> String {
        date.to_offset(UtcOffset::UTC)
            .format(self.items.as_ref())
            .expect("the date layout was validated at parse time")
    }

    pub fn as_str(&self) -> &str {
        &self.layout_str
    }
}

impl FromStr for IndexDateLayout {
    type Err = String;

    fn from_str(layout_str: &str) -> Result<Self, Self::Err> {
        let items = time::format_description::parse_owned::<2>(layout_str)
            .map_err(|error| format!("invalid index date layout `{layout_str}`: {error}"))?;
        // Probe the layout once so `format` cannot fail later.
        OffsetDateTime::UNIX_EPOCH
            .format(&items)
            .map_err(|error| format!("invalid index date layout `{layout_str}`: {error}"))?;
        Ok(IndexDateLayout {
            items: Arc::new(items),
            layout_str: layout_str.to_string(),
        })
    }
}

impl fmt::Debug for IndexDateLayout {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_tuple("IndexDateLayout")
            .field(&self.layout_str)
            .finish()
    }
}

impl PartialEq for IndexDateLayout {
    fn eq(&self, other: &Self) -> bool {
        self.layout_str == other.layout_str
    }
}

impl Eq for IndexDateLayout {}

impl Hash for IndexDateLayout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.layout_str.hash(state);
    }
}

impl Serialize for IndexDateLayout {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        serializer.serialize_str(&self.layout_str)
    }
}

impl<'de> Deserialize<'de> for IndexDateLayout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let layout_str: String = Deserialize::deserialize(deserializer)?;
        layout_str.parse().map_err(D::Error::custom)
    }
}

/// Per-index-family settings: how partition names are dated and how often
/// they roll over.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    pub date_layout: IndexDateLayout,
    pub rollover_frequency: RolloverFrequency,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            date_layout: "[year]-[month]-[day]"
                .parse()
                .expect("the default date layout is valid"),
            rollover_frequency: RolloverFrequency::Daily,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_index_prefix_apply() {
        assert_eq!(IndexPrefix::default().apply("spanlake-span-"), "spanlake-span-");
        assert_eq!(
            IndexPrefix::new("tenant1").apply("spanlake-span-"),
            "tenant1-spanlake-span-"
        );
    }

    #[test]
    fn test_rollover_frequency_round_trip() {
        for (frequency_str, expected) in [
            ("day", RolloverFrequency::Daily),
            ("hour", RolloverFrequency::Hourly),
            ("HOUR", RolloverFrequency::Hourly),
        ] {
            let frequency: RolloverFrequency = frequency_str.parse().unwrap();
            assert_eq!(frequency, expected);
        }
        assert!("week".parse::<RolloverFrequency>().is_err());
        assert_eq!(RolloverFrequency::Daily.to_string(), "day");
    }

    #[test]
    fn test_rollover_frequency_negative_duration() {
        assert_eq!(
            RolloverFrequency::Daily.as_negative_duration(),
            Duration::hours(-24)
        );
        assert_eq!(
            RolloverFrequency::Hourly.as_negative_duration(),
            Duration::hours(-1)
        );
    }

    #[test]
    fn test_index_date_layout_format() {
        let layout: IndexDateLayout = "[year]-[month]-[day]".parse().unwrap();
        assert_eq!(layout.format(datetime!(2017-01-26 20:26:31 UTC)), "2017-01-26");

        let hourly_layout: IndexDateLayout = "[year]-[month]-[day]-[hour]".parse().unwrap();
        assert_eq!(
            hourly_layout.format(datetime!(2017-01-26 05:26:31 UTC)),
            "2017-01-26-05"
        );
    }

    #[test]
    fn test_index_date_layout_normalizes_to_utc() {
        let layout: IndexDateLayout = "[year]-[month]-[day]".parse().unwrap();
        // 23:30 at +02:00 is 21:30 UTC, still the same day.
        assert_eq!(layout.format(datetime!(2017-01-26 23:30:00 +02:00)), "2017-01-26");
        // 01:30 at +03:00 is 22:30 UTC the day before.
        assert_eq!(layout.format(datetime!(2017-01-27 01:30:00 +03:00)), "2017-01-26");
    }

    #[test]
    fn test_index_date_layout_rejects_malformed_layouts() {
        assert!("[year".parse::<IndexDateLayout>().is_err());
    }

    #[test]
    fn test_index_options_serde() {
        let options = IndexOptions {
            date_layout: "[year]-[month]-[day]-[hour]".parse().unwrap(),
            rollover_frequency: RolloverFrequency::Hourly,
        };
        let serialized = serde_json::to_value(&options).unwrap();
        assert_eq!(
            serialized,
            serde_json::json!({
                "date_layout": "[year]-[month]-[day]-[hour]",
                "rollover_frequency": "hour"
            })
        );
        let deserialized: IndexOptions = serde_json::from_value(serialized).unwrap();
        assert_eq!(deserialized, options);
    }
}
