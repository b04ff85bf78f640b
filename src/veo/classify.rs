//! Map failures to the message shown to the user.
//!
//! Service failures usually carry a JSON error object somewhere in their
//! text. This sniffs for it with a greedy brace match; text that merely
//! happens to contain braces can be misclassified.

use std::sync::OnceLock;

use regex::Regex;

use super::error::GenerationError;

/// Shown when the service reports `RESOURCE_EXHAUSTED`.
pub const QUOTA_EXCEEDED_MESSAGE: &str = "API Quota Exceeded: Your request could not be completed because the usage limit has been reached. Please check your Google AI project's quota and billing status for more information.";

/// Shown when there is no message to work with at all.
pub const GENERIC_ERROR_MESSAGE: &str =
    "An error occurred during video generation. Please try again.";

fn json_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON object pattern"))
}

/// Classify a raw failure message.
pub fn classify(message: &str) -> String {
    if message.is_empty() {
        return GENERIC_ERROR_MESSAGE.to_string();
    }

    let Some(found) = json_object_pattern().find(message) else {
        return wrap_raw(message);
    };

    let details: serde_json::Value = match serde_json::from_str(found.as_str()) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Embedded error payload is not valid JSON: {}", e);
            return wrap_raw(message);
        }
    };

    let api_error = details
        .get("error")
        .filter(|e| !e.is_null())
        .unwrap_or(&details);

    if api_error.get("status").and_then(|s| s.as_str()) == Some("RESOURCE_EXHAUSTED") {
        return QUOTA_EXCEEDED_MESSAGE.to_string();
    }

    match api_error.get("message").and_then(|m| m.as_str()) {
        Some(api_message) if !api_message.is_empty() => {
            format!("Video generation failed: {}", api_message)
        }
        _ => format!("An unexpected error occurred: {}", message),
    }
}

fn wrap_raw(message: &str) -> String {
    format!("An error occurred during video generation: {}", message)
}

/// Classify a generation error.
///
/// Validation errors are already user-facing and pass through unchanged.
pub fn classify_error(error: &GenerationError) -> String {
    match error {
        GenerationError::Validation(message) => message.clone(),
        other => classify(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_exhausted_yields_quota_text() {
        let message = r#"got {"error":{"status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(classify(message), QUOTA_EXCEEDED_MESSAGE);
    }

    #[test]
    fn test_top_level_status_without_error_wrapper() {
        let message = r#"{"status":"RESOURCE_EXHAUSTED","message":"slow down"}"#;
        assert_eq!(classify(message), QUOTA_EXCEEDED_MESSAGE);
    }

    #[test]
    fn test_api_message_is_reported() {
        let message = r#"Request failed with status 400: {"error":{"code":400,"message":"Prompt too long","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(classify(message), "Video generation failed: Prompt too long");
    }

    #[test]
    fn test_json_without_status_or_message_is_unexpected() {
        let message = r#"weird {"error":{"code":500}}"#;
        assert_eq!(
            classify(message),
            format!("An unexpected error occurred: {}", message)
        );
    }

    #[test]
    fn test_plain_text_is_wrapped() {
        let out = classify("network down");
        assert_eq!(out, "An error occurred during video generation: network down");
        assert!(out.contains("network down"));
    }

    #[test]
    fn test_invalid_json_is_wrapped() {
        let message = "bad payload {not json}";
        assert_eq!(
            classify(message),
            "An error occurred during video generation: bad payload {not json}"
        );
    }

    #[test]
    fn test_greedy_match_spans_multiple_lines() {
        let message = "failure:\n{\n  \"error\": {\n    \"message\": \"boom\"\n  }\n}\ntrailing";
        assert_eq!(classify(message), "Video generation failed: boom");
    }

    #[test]
    fn test_greedy_match_across_two_objects_fails_to_parse() {
        let message = r#"{"a":1} and {"b":2}"#;
        assert!(classify(message).starts_with("An error occurred during video generation:"));
    }

    #[test]
    fn test_empty_message_is_generic() {
        assert_eq!(classify(""), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_classify_error_passes_validation_through() {
        let err = GenerationError::Validation("Please enter a prompt to generate a video.".to_string());
        assert_eq!(
            classify_error(&err),
            "Please enter a prompt to generate a video."
        );
    }

    #[test]
    fn test_classify_error_request_with_quota_body() {
        let err = GenerationError::Request {
            status: 429,
            body: r#"{"error":{"code":429,"message":"Quota","status":"RESOURCE_EXHAUSTED"}}"#
                .to_string(),
        };
        assert_eq!(classify_error(&err), QUOTA_EXCEEDED_MESSAGE);
    }

    #[test]
    fn test_classify_error_missing_result() {
        assert_eq!(
            classify_error(&GenerationError::MissingResult),
            "An error occurred during video generation: Video generation failed: No download link found in the final response."
        );
    }
}
