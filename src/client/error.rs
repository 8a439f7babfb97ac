//! Errors returned by the Basis Theory API client.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RFC 7807 problem body returned for auth and conflict failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// HTTP status echoed by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// Short, human-readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Problem body returned for request validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationProblemDetails {
    /// HTTP status echoed by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// Short, human-readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Field name to the messages reported for it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Every way an API call can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 with a validation problem body.
    #[error("400 Bad Request")]
    Validation(ValidationProblemDetails),

    /// 401 with a problem body.
    #[error("401 Unauthorized")]
    Unauthorized(ProblemDetails),

    /// 403 with a problem body.
    #[error("403 Forbidden")]
    Forbidden(ProblemDetails),

    /// 409 with a problem body.
    #[error("409 Conflict")]
    Conflict(ProblemDetails),

    /// 422 with a problem body.
    #[error("422 Unprocessable Entity")]
    Unprocessable(ProblemDetails),

    /// Any other non-success status.
    #[error("{}", status_text(*.0))]
    Status(u16),

    /// The request never produced a response (connect failure, timeout, cancellation).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client could not be built from its settings.
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Classify a non-success response. Unparseable bodies fall back to empty details.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::Validation(parse_or_default(body)),
            StatusCode::UNAUTHORIZED => Self::Unauthorized(parse_or_default(body)),
            StatusCode::FORBIDDEN => Self::Forbidden(parse_or_default(body)),
            StatusCode::CONFLICT => Self::Conflict(parse_or_default(body)),
            StatusCode::UNPROCESSABLE_ENTITY => Self::Unprocessable(parse_or_default(body)),
            other => Self::Status(other.as_u16()),
        }
    }

    /// HTTP status code, when the failure came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation(_) => Some(400),
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::Conflict(_) => Some(409),
            Self::Unprocessable(_) => Some(422),
            Self::Status(code) => Some(*code),
            Self::Transport(_) | Self::Decode(_) | Self::Configuration(_) => None,
        }
    }
}

fn parse_or_default<T: Default + for<'de> Deserialize<'de>>(body: &str) -> T {
    serde_json::from_str(body).unwrap_or_default()
}

fn status_text(code: u16) -> String {
    match StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{} {}", code, reason),
        None => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_body_is_parsed() {
        let body = r#"{"status":400,"title":"One or more validation errors occurred.","errors":{"name":["The name field is required."]}}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);

        let ApiError::Validation(details) = err else {
            panic!("expected validation error");
        };
        assert_eq!(details.status, Some(400));
        assert_eq!(details.errors["name"], vec!["The name field is required."]);
    }

    #[test]
    fn test_problem_statuses_are_classified() {
        let body = r#"{"status":403,"title":"Forbidden","detail":"missing application:create"}"#;
        match ApiError::from_response(StatusCode::FORBIDDEN, body) {
            ApiError::Forbidden(details) => {
                assert_eq!(details.detail.as_deref(), Some("missing application:create"));
            },
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            ApiError::from_response(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::CONFLICT, "not json"),
            ApiError::Conflict(ProblemDetails { status: None, .. })
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, "{}"),
            ApiError::Unprocessable(_)
        ));
    }

    #[test]
    fn test_other_statuses_keep_only_the_code() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, r#"{"title":"Not Found"}"#);
        assert!(matches!(err, ApiError::Status(404)));
        assert_eq!(err.to_string(), "404 Not Found");
        assert_eq!(err.status_code(), Some(404));

        assert_eq!(ApiError::Status(599).to_string(), "599");
    }
}
