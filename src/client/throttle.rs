//! Maps failed platform responses onto [`ApiError`], telling the primary rate
//! limit apart from the abuse-detection (secondary) limit.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    documentation_url: Option<String>,
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Wait suggested by the response: `retry-after` first, then the primary
/// limit's reset time.
pub fn retry_hint(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    if let Some(seconds) = header_u64(headers, "retry-after") {
        return Some(Duration::from_secs(seconds));
    }

    let reset = header_u64(headers, "x-ratelimit-reset")?;
    let now = now.duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(Duration::from_secs(reset.saturating_sub(now)))
}

fn is_secondary_limit(body: &ErrorBody) -> bool {
    let message = body.message.as_deref().unwrap_or_default().to_lowercase();
    let docs = body.documentation_url.as_deref().unwrap_or_default();

    message.contains("secondary rate limit")
        || message.contains("abuse")
        || docs.contains("secondary-rate-limits")
        || docs.contains("abuse-rate-limits")
}

fn is_primary_limit(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && header_u64(headers, "x-ratelimit-remaining") == Some(0))
}

pub fn error_from_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: SystemTime,
) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("no message").to_string()
            } else {
                trimmed.to_string()
            }
        });

    let throttled = status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;

    if throttled && is_secondary_limit(&parsed) {
        return ApiError::Abuse {
            message,
            retry_after: retry_hint(headers, now),
        };
    }

    if is_primary_limit(status, headers) {
        return ApiError::RateLimited {
            message,
            retry_after: retry_hint(headers, now),
        };
    }

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Conflict { message },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Forbidden { message },
        s if s.is_server_error() => ApiError::Server {
            status: s.as_u16(),
            message,
        },
        s => ApiError::Unexpected {
            status: s.as_u16(),
            message,
        },
    }
}
