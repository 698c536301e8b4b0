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

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Possible ElasticsearchError
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElasticsearchError {
    /// The request never produced a response: connection failure, timeout,
    /// cancelled call. Retry policy, if any, belongs to the transport.
    #[error("elasticsearch request failed: {reason}")]
    Transport { reason: String },
    /// Elasticsearch answered with an error body.
    #[error("elasticsearch responded with an error: {0}")]
    Response(ErrorCause),
    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode elasticsearch response: {reason}")]
    Decode { reason: String },
}

impl ElasticsearchError {
    pub fn transport(reason: impl ToString) -> Self {
        ElasticsearchError::Transport {
            reason: reason.to_string(),
        }
    }

    pub fn decode(reason: impl ToString) -> Self {
        ElasticsearchError::Decode {
            reason: reason.to_string(),
        }
    }
}

/// The `error` object of an Elasticsearch error body, including nested root
/// causes. Rendering an [`ElasticsearchError::Response`] surfaces the deepest
/// available reason so callers see the actual shard failure instead of the
/// generic wrapper exception.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorCause {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_cause: Vec<ErrorCause>,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match (&self.error_type, &self.reason) {
            (Some(error_type), Some(reason)) => write!(formatter, "{error_type}: {reason}")?,
            (Some(error_type), None) => write!(formatter, "{error_type}")?,
            (None, Some(reason)) => write!(formatter, "{reason}")?,
            (None, None) => write!(formatter, "unknown error")?,
        }
        if let Some(root_cause) = self.root_cause.first() {
            write!(formatter, " (caused by: {root_cause})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_error_cause_deserialize() {
        let error_body = json!({
            "type": "search_phase_execution_exception",
            "reason": "all shards failed",
            "root_cause": [
                {"type": "parsing_exception", "reason": "unknown field [foo]"}
            ]
        });
        let error_cause: ErrorCause = serde_json::from_value(error_body).unwrap();
        assert_eq!(
            error_cause.error_type.as_deref(),
            Some("search_phase_execution_exception")
        );
        assert_eq!(error_cause.root_cause.len(), 1);
    }

    #[test]
    fn test_error_cause_display_surfaces_root_cause() {
        let error_cause = ErrorCause {
            error_type: Some("search_phase_execution_exception".to_string()),
            reason: Some("all shards failed".to_string()),
            root_cause: vec![ErrorCause {
                error_type: Some("parsing_exception".to_string()),
                reason: Some("unknown field [foo]".to_string()),
                root_cause: Vec::new(),
            }],
        };
        assert_eq!(
            error_cause.to_string(),
            "search_phase_execution_exception: all shards failed (caused by: parsing_exception: \
             unknown field [foo])"
        );
    }

    #[test]
    fn test_elasticsearch_error_display() {
        let error = ElasticsearchError::transport("connection refused");
        assert_eq!(
            error.to_string(),
            "elasticsearch request failed: connection refused"
        );
        let error = ElasticsearchError::Response(ErrorCause {
            error_type: Some("index_not_found_exception".to_string()),
            reason: Some("no such index".to_string()),
            root_cause: Vec::new(),
        });
        assert_eq!(
            error.to_string(),
            "elasticsearch responded with an error: index_not_found_exception: no such index"
        );
        let error = ElasticsearchError::decode("expected a JSON object");
        assert_eq!(
            error.to_string(),
            "failed to decode elasticsearch response: expected a JSON object"
        );
    }
}
