use super::client::{UpstreamHttpClient, UpstreamResponse};
use super::{mime, ImageGenerationService, ImagePayload};
use crate::config::{Config, UpstreamEncoding};
use crate::models::{extract_error_detail, UpstreamImageRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::Form;
use std::time::Duration;

/// Client for a Hugging Face Space that turns a prompt into raw image bytes.
pub struct HfSpaceImageClient {
    http: UpstreamHttpClient,
    path: String,
    encoding: UpstreamEncoding,
}

impl HfSpaceImageClient {
    pub fn new(
        base_url: String,
        path: String,
        encoding: UpstreamEncoding,
        timeout: Duration,
    ) -> Self {
        Self::new_with_client(base_url, path, encoding, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        base_url: String,
        path: String,
        encoding: UpstreamEncoding,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: UpstreamHttpClient::new_with_client("Image upstream", base_url, timeout, client),
            path,
            encoding,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new_with_client(
            config.upstream_base_url.clone(),
            config.upstream_image_path.clone(),
            config.upstream_encoding,
            config.upstream_timeout,
            client,
        )
    }

    /// Decide what a 2xx answer actually carries.
    fn interpret(response: UpstreamResponse) -> Result<ImagePayload> {
        let status = response.status.as_u16();
        let content_type = response.content_type.as_deref().unwrap_or_default();

        if mime::is_image(content_type) {
            if response.body.is_empty() {
                return Err(Error::Upstream(
                    "Image upstream returned an empty image body".to_string(),
                ));
            }
            return Ok(ImagePayload {
                content_type: mime::essence(content_type),
                bytes: response.body,
            });
        }

        if response.body.is_empty() {
            return Err(Error::Upstream(
                "Image upstream returned an empty body".to_string(),
            ));
        }

        if let Some(detail) = extract_error_detail(&response.body) {
            return Err(Error::UpstreamReported { status, detail });
        }

        // Unlabelled, octet-stream or mislabelled payloads must carry a known
        // image signature.
        match mime::detect_image_mime(&response.body) {
            Some(detected) => Ok(ImagePayload {
                content_type: detected.to_string(),
                bytes: response.body,
            }),
            None => Err(Error::Upstream(format!(
                "Image upstream returned non-image content ({})",
                if content_type.is_empty() {
                    "no content type"
                } else {
                    content_type
                }
            ))),
        }
    }
}

#[async_trait]
impl ImageGenerationService for HfSpaceImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload> {
        tracing::debug!(
            "Sending image generation request to {}{} ({:?})",
            self.http.base_url(),
            self.path,
            self.encoding
        );

        let response = match self.encoding {
            UpstreamEncoding::Json => {
                self.http
                    .post_json(&self.path, &UpstreamImageRequest { prompt })
                    .await?
            }
            UpstreamEncoding::Form => {
                let form = Form::new().text("data", prompt.to_string());
                self.http.post_multipart(&self.path, form).await?
            }
        };

        let payload = Self::interpret(response)?;
        tracing::debug!(
            "Image upstream returned {} bytes of {}",
            payload.bytes.len(),
            payload.content_type
        );
        Ok(payload)
    }
}
