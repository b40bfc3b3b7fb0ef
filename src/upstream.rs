//! Client for the upstream completion API.
//!
//! Owns the single outbound POST and the extraction of the response body
//! into the fields the relay persists and returns. Extraction is a pure
//! function over the deserialized body, so defaults and shape failures
//! are testable without a network.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::RelayError;
use crate::types::RelayPayload;

/// Header carrying the configured API key on every upstream call.
const API_KEY_HEADER: &str = "api-key";

/// Model name recorded when the upstream omits one.
const UNKNOWN_MODEL: &str = "unknown";

/// Everything extracted from one successful upstream response.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_id: Option<String>,
    pub model_used: String,
    /// ISO-8601 UTC; upstream-reported creation time when present,
    /// otherwise the time of extraction.
    pub created_timestamp: String,
    pub content: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// Upstream completion API client, built once at startup and shared.
pub struct UpstreamClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Forward the payload and extract the completion.
    ///
    /// Exactly one POST per call; no retries. Transport failures and
    /// non-2xx statuses surface as [`RelayError::Upstream`] carrying the
    /// upstream's own error text where available.
    pub async fn complete(&self, payload: &RelayPayload) -> Result<Completion, RelayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream(format!(
                "upstream returned {}: {}",
                status, error_text
            )));
        }

        let body: UpstreamResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Upstream(format!("failed to decode upstream body: {}", e)))?;

        extract(body, Utc::now())
    }
}

/// Pull the persisted fields out of an upstream body.
///
/// Defaults: absent `id` stays absent, absent `model` becomes `"unknown"`,
/// absent `created` becomes `now`, absent usage fields become 0. The
/// generated content is the only required part; any level missing on the
/// path to it fails with the name of the missing key.
fn extract(body: UpstreamResponse, now: DateTime<Utc>) -> Result<Completion, RelayError> {
    let content = body
        .choices
        .as_ref()
        .and_then(|choices| choices.first())
        .ok_or(RelayError::ResponseShape { missing: "choices" })?
        .message
        .as_ref()
        .ok_or(RelayError::ResponseShape { missing: "message" })?
        .content
        .clone()
        .ok_or(RelayError::ResponseShape { missing: "content" })?;

    let created = match body.created {
        // Out-of-range values fall back to the handling time.
        Some(secs) => Utc.timestamp_opt(secs as i64, 0).single().unwrap_or(now),
        None => now,
    };

    let usage = body.usage.unwrap_or_default();

    Ok(Completion {
        completion_id: body.id,
        model_used: body.model.unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
        created_timestamp: created.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        content,
        prompt_tokens: usage.prompt_tokens.unwrap_or(0),
        completion_tokens: usage.completion_tokens.unwrap_or(0),
        total_tokens: usage.total_tokens.unwrap_or(0),
    })
}

// -----------------------------------------------------------------------------
// Upstream DTOs (Data Transfer Objects)
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    id: Option<String>,
    model: Option<String>,
    /// Unix seconds. Upstreams send integers; fractional values are
    /// tolerated and truncated.
    created: Option<f64>,
    choices: Option<Vec<UpstreamChoice>>,
    usage: Option<UpstreamUsage>,
}

#[derive(Debug, Deserialize)]
struct UpstreamChoice {
    message: Option<UpstreamMessage>,
}

#[derive(Debug, Deserialize)]
struct UpstreamMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamUsage {
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
    total_tokens: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> UpstreamResponse {
        serde_json::from_value(value).unwrap()
    }

    // Distinct from every `created` used below, so the assertions can tell
    // the upstream timestamp apart from the fallback clock.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn extracts_a_complete_body() {
        let completion = extract(
            body(json!({
                "id": "cmpl-abc",
                "model": "gpt-4o",
                "created": 1717243200,
                "choices": [ { "message": { "content": "Hello there." } } ],
                "usage": { "prompt_tokens": 12, "completion_tokens": 34, "total_tokens": 46 }
            })),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(completion.completion_id.as_deref(), Some("cmpl-abc"));
        assert_eq!(completion.model_used, "gpt-4o");
        assert_eq!(completion.created_timestamp, "2024-06-01T12:00:00Z");
        assert_eq!(completion.content, "Hello there.");
        assert_eq!(completion.prompt_tokens, 12);
        assert_eq!(completion.completion_tokens, 34);
        assert_eq!(completion.total_tokens, 46);
    }

    #[test]
    fn absent_id_and_model_use_defaults() {
        let completion = extract(
            body(json!({
                "choices": [ { "message": { "content": "hi" } } ]
            })),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(completion.completion_id, None);
        assert_eq!(completion.model_used, "unknown");
    }

    #[test]
    fn absent_created_falls_back_to_now() {
        let completion = extract(
            body(json!({
                "choices": [ { "message": { "content": "hi" } } ]
            })),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(completion.created_timestamp, "2024-06-02T09:30:00Z");
    }

    #[test]
    fn absent_usage_yields_zero_counts() {
        let completion = extract(
            body(json!({
                "choices": [ { "message": { "content": "hi" } } ]
            })),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(completion.prompt_tokens, 0);
        assert_eq!(completion.completion_tokens, 0);
        assert_eq!(completion.total_tokens, 0);
    }

    #[test]
    fn partial_usage_defaults_the_missing_fields() {
        let completion = extract(
            body(json!({
                "choices": [ { "message": { "content": "hi" } } ],
                "usage": { "prompt_tokens": 7 }
            })),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(completion.prompt_tokens, 7);
        assert_eq!(completion.completion_tokens, 0);
        assert_eq!(completion.total_tokens, 0);
    }

    #[test]
    fn missing_choices_is_a_shape_error() {
        let err = extract(body(json!({ "model": "gpt-4o" })), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            RelayError::ResponseShape { missing: "choices" }
        ));
    }

    #[test]
    fn empty_choices_is_a_shape_error() {
        let err = extract(body(json!({ "choices": [] })), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            RelayError::ResponseShape { missing: "choices" }
        ));
    }

    #[test]
    fn missing_message_is_a_shape_error() {
        let err = extract(body(json!({ "choices": [ {} ] })), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            RelayError::ResponseShape { missing: "message" }
        ));
    }

    #[test]
    fn missing_content_is_a_shape_error() {
        let err = extract(
            body(json!({ "choices": [ { "message": {} } ] })),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RelayError::ResponseShape { missing: "content" }
        ));
    }

    #[test]
    fn fractional_created_is_truncated() {
        let completion = extract(
            body(json!({
                "created": 1717243200.9,
                "choices": [ { "message": { "content": "hi" } } ]
            })),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(completion.created_timestamp, "2024-06-01T12:00:00Z");
    }
}
