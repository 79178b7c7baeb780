//! Prompt relay
//!
//! Validates inbound prompts, forwards them to the configured upstream and
//! translates the upstream outcome into a [`GenerationResult`].

use crate::config::Config;
use crate::models::{ChatReply, GenerationResult, UpstreamFailure};
use crate::upstream::{ChatService, HfSpaceImageClient, ImageGenerationService, OllamaChatClient};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const PROMPT_REQUIRED: &str = "Prompt is required";

/// Stateless relay shared by all request handlers.
#[derive(Clone)]
pub struct Relay {
    image_gen: Arc<dyn ImageGenerationService>,
    chat: Arc<dyn ChatService>,
}

impl Relay {
    pub fn new(image_gen: Arc<dyn ImageGenerationService>, chat: Arc<dyn ChatService>) -> Self {
        Self { image_gen, chat }
    }

    /// Build the relay against the upstreams named in `config`.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across upstream clients.
        let http_client = reqwest::Client::new();

        info!(
            "Image upstream: {} ({:?}, timeout {:?})",
            config.image_endpoint(),
            config.upstream_encoding,
            config.upstream_timeout
        );
        info!(
            "Chat upstream: {} (model: {})",
            config.chat_base_url, config.chat_model
        );

        Self::new(
            Arc::new(HfSpaceImageClient::from_config(config, http_client.clone())),
            Arc::new(OllamaChatClient::from_config(config, http_client)),
        )
    }

    /// Forward an image prompt.
    ///
    /// Returns `Err(Error::Validation)` before any upstream call for a missing
    /// or empty prompt. An error body from the upstream becomes
    /// `GenerationResult::Error`; transport and format failures stay `Err`.
    pub async fn handle(&self, prompt: Option<&str>) -> Result<GenerationResult> {
        let prompt = validate_prompt(prompt)?;
        info!("Relaying image prompt ({} chars)", prompt.chars().count());

        match self.image_gen.generate_image(prompt).await {
            Ok(payload) => {
                info!(
                    "Image generated: {} bytes of {}",
                    payload.bytes.len(),
                    payload.content_type
                );
                Ok(GenerationResult::Image {
                    bytes: payload.bytes,
                    content_type: payload.content_type,
                })
            }
            Err(Error::UpstreamReported { status, detail }) => {
                warn!("Image upstream reported error (status {}): {}", status, detail);
                Ok(GenerationResult::Error(UpstreamFailure {
                    code: status,
                    message: detail,
                }))
            }
            Err(e) => {
                error!("Image generation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Forward a chat prompt and return the model's reply.
    pub async fn chat(&self, prompt: Option<&str>) -> Result<ChatReply> {
        let prompt = validate_prompt(prompt)?;
        info!("Relaying chat prompt ({} chars)", prompt.chars().count());

        self.chat
            .chat(prompt)
            .await
            .map(ChatReply::success)
            .map_err(|e| {
                error!("Chat failed: {}", e);
                e
            })
    }
}

/// A prompt must be present and non-empty. Whitespace is forwarded as-is.
pub fn validate_prompt(prompt: Option<&str>) -> Result<&str> {
    match prompt {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(Error::Validation(PROMPT_REQUIRED.to_string())),
    }
}
