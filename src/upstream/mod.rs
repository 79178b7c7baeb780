//! Upstream generation API integration
//!
//! Clients for the image generation Space and the LLM chat endpoint, plus
//! in-memory mocks used by the relay and server tests.

pub mod chat;
pub mod client;
pub mod image;
pub mod mime;
pub mod mock;

pub use chat::OllamaChatClient;
pub use client::{UpstreamHttpClient, UpstreamResponse};
pub use image::HfSpaceImageClient;
pub use mock::{MockChatClient, MockImageClient};

use crate::Result;
use async_trait::async_trait;

/// Image bytes as received from the upstream, with their resolved MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Structured upstream error bodies surface as `Error::UpstreamReported`;
/// every other failure is `Error::Upstream` or `Error::Http`.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<String>;
}
