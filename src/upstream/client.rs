use crate::models::extract_error_detail;
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// A fully-read successful upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Thin REST client shared by the image and chat upstream clients.
///
/// Every request carries the configured timeout. Non-2xx answers are turned
/// into errors here: a string `detail` becomes `Error::UpstreamReported`,
/// anything else `Error::Upstream`.
#[derive(Debug, Clone)]
pub struct UpstreamHttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    timeout: Duration,
    name: &'static str,
}

impl UpstreamHttpClient {
    pub fn new(name: &'static str, base_url: String, timeout: Duration) -> Self {
        Self::new_with_client(name, base_url, timeout, Client::new())
    }

    pub fn new_with_client(
        name: &'static str,
        base_url: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            name,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json<Req: Serialize + ?Sized>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<UpstreamResponse> {
        let builder = self.client.post(self.url(path)).json(request);
        self.send(builder).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<UpstreamResponse> {
        let builder = self.client.post(self.url(path)).multipart(form);
        self.send(builder).await
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json_for<Req: Serialize + ?Sized, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let response = self.post_json(path, request).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            tracing::error!(
                "Failed to parse {} response: {}\nBody: {}",
                self.name,
                e,
                String::from_utf8_lossy(&response.body)
            );
            Error::Upstream(format!("Failed to parse {} response: {}", self.name, e))
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<UpstreamResponse> {
        let response = builder.timeout(self.timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!("{} request timed out after {:?}: {}", self.name, self.timeout, e);
            } else {
                tracing::error!("Failed to send request to {}: {}", self.name, e);
            }
            e
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                tracing::error!("Failed to read {} response body: {}", self.name, e);
                e
            })?
            .to_vec();

        if !status.is_success() {
            let error_text = String::from_utf8_lossy(&body);
            tracing::error!("{} API error (status {}): {}", self.name, status, error_text);

            return Err(match extract_error_detail(&body) {
                Some(detail) => Error::UpstreamReported {
                    status: status.as_u16(),
                    detail,
                },
                None => Error::Upstream(format!(
                    "{} API error (status {}) without a readable detail",
                    self.name, status
                )),
            });
        }

        tracing::debug!(
            "{} responded with status {} ({} bytes, content-type {:?})",
            self.name,
            status,
            body.len(),
            content_type
        );

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
