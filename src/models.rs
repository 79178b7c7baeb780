//! Data models and structures
//!
//! Defines the request-scoped relay entities and the JSON payloads exchanged
//! with callers and upstream generation APIs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound prompt from a caller. Shared by the image and chat routes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub prompt: Option<String>,
}

impl GenerationRequest {
    /// Lenient body parsing: a body that is not JSON, or whose `prompt` is
    /// not a string, yields a request with no prompt.
    pub fn from_json_bytes(body: &[u8]) -> Self {
        let prompt = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v.get("prompt").and_then(Value::as_str).map(str::to_string));
        Self { prompt }
    }
}

/// Error reported by the upstream in a structured body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// HTTP status the upstream answered with.
    pub code: u16,
    pub message: String,
}

/// Outcome of one upstream image call: image bytes or the upstream's own error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Image {
        bytes: Vec<u8>,
        content_type: String,
    },
    Error(UpstreamFailure),
}

impl GenerationResult {
    pub fn image_bytes(&self) -> Option<&[u8]> {
        match self {
            GenerationResult::Image { bytes, .. } => Some(bytes),
            GenerationResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&UpstreamFailure> {
        match self {
            GenerationResult::Image { .. } => None,
            GenerationResult::Error(failure) => Some(failure),
        }
    }
}

/// JSON error body returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub status: String,
}

impl ChatReply {
    pub fn success(response: String) -> Self {
        Self {
            response,
            status: "success".to_string(),
        }
    }
}

// Upstream API request/response models

/// JSON body for the image upstream.
#[derive(Debug, Serialize)]
pub struct UpstreamImageRequest<'a> {
    pub prompt: &'a str,
}

/// Request body for an Ollama-style `/api/generate` endpoint.
#[derive(Debug, Serialize)]
pub struct ChatGenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatGenerateResponse {
    pub response: Option<String>,
}

/// Pull a human-readable message out of an upstream JSON error body.
///
/// Looks at `detail`, then `error`, then `message`. Only string values count;
/// FastAPI validation errors carry an array in `detail` and are not relayed.
pub fn extract_error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_json_bytes() {
        let req = GenerationRequest::from_json_bytes(br#"{"prompt":"a red fox"}"#);
        assert_eq!(req.prompt.as_deref(), Some("a red fox"));
    }

    #[test]
    fn test_request_non_string_prompt_is_absent() {
        assert_eq!(
            GenerationRequest::from_json_bytes(br#"{"prompt":42}"#).prompt,
            None
        );
        assert_eq!(GenerationRequest::from_json_bytes(b"{}").prompt, None);
        assert_eq!(GenerationRequest::from_json_bytes(b"not json").prompt, None);
        assert_eq!(GenerationRequest::from_json_bytes(b"").prompt, None);
    }

    #[test]
    fn test_extract_detail_prefers_detail_field() {
        let body = br#"{"detail":"quota exceeded","message":"other"}"#;
        assert_eq!(extract_error_detail(body).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_extract_detail_falls_back_to_error_and_message() {
        assert_eq!(
            extract_error_detail(br#"{"error":"model not loaded"}"#).as_deref(),
            Some("model not loaded")
        );
        assert_eq!(
            extract_error_detail(br#"{"message":"busy"}"#).as_deref(),
            Some("busy")
        );
    }

    #[test]
    fn test_extract_detail_ignores_non_string_detail() {
        let body = br#"{"detail":[{"loc":["body","prompt"],"msg":"field required"}]}"#;
        assert_eq!(extract_error_detail(body), None);
        assert_eq!(extract_error_detail(b"<html>502</html>"), None);
    }

    #[test]
    fn test_generation_result_accessors() {
        let image = GenerationResult::Image {
            bytes: vec![1, 2, 3],
            content_type: "image/png".to_string(),
        };
        assert_eq!(image.image_bytes(), Some(&[1u8, 2, 3][..]));
        assert!(image.error().is_none());

        let failure = GenerationResult::Error(UpstreamFailure {
            code: 500,
            message: "quota exceeded".to_string(),
        });
        assert!(failure.image_bytes().is_none());
        assert_eq!(failure.error().map(|f| f.code), Some(500));
    }

    #[test]
    fn test_chat_generate_request_serialization() {
        let req = ChatGenerateRequest {
            model: "mistral",
            prompt: "hi",
            stream: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"model":"mistral","prompt":"hi","stream":false}"#);
    }
}
