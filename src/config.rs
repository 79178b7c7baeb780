//! Runtime configuration
//!
//! Every upstream address is read from the environment (optionally via a
//! `.env` file) so nothing about the upstream contract is baked into call sites.

use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://chiefmaybe-buddy-sd.hf.space";
pub const DEFAULT_CHAT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_HEALTH_MESSAGE: &str = "B.U.D.D.Y backend is running!";

/// How the prompt is encoded in the request sent to the image upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamEncoding {
    /// `{"prompt": "..."}` as an `application/json` body.
    Json,
    /// `multipart/form-data` with a single `data` field.
    Form,
}

impl FromStr for UpstreamEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "form" => Ok(Self::Form),
            other => Err(Error::Config(format!(
                "Unknown upstream encoding '{}'. Expected 'json' or 'form'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upstream_base_url: String,
    pub upstream_image_path: String,
    pub upstream_encoding: UpstreamEncoding,
    pub upstream_timeout: Duration,
    pub chat_base_url: String,
    pub chat_model: String,
    pub chat_timeout: Duration,
    pub health_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            upstream_image_path: "/generate".to_string(),
            upstream_encoding: UpstreamEncoding::Json,
            upstream_timeout: Duration::from_secs(120),
            chat_base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            chat_model: "mistral".to_string(),
            chat_timeout: Duration::from_secs(30),
            health_message: DEFAULT_HEALTH_MESSAGE.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, applying defaults for
    /// anything unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: match get("PORT") {
                Some(v) => parse_number("PORT", &v)?,
                None => defaults.port,
            },
            upstream_base_url: get("UPSTREAM_BASE_URL").unwrap_or(defaults.upstream_base_url),
            upstream_image_path: get("UPSTREAM_IMAGE_PATH")
                .unwrap_or(defaults.upstream_image_path),
            upstream_encoding: match get("UPSTREAM_ENCODING") {
                Some(v) => v.parse()?,
                None => defaults.upstream_encoding,
            },
            upstream_timeout: match get("UPSTREAM_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_number("UPSTREAM_TIMEOUT_SECS", &v)?),
                None => defaults.upstream_timeout,
            },
            chat_base_url: get("CHAT_BASE_URL").unwrap_or(defaults.chat_base_url),
            chat_model: get("CHAT_MODEL").unwrap_or(defaults.chat_model),
            chat_timeout: match get("CHAT_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_number("CHAT_TIMEOUT_SECS", &v)?),
                None => defaults.chat_timeout,
            },
            health_message: get("HEALTH_MESSAGE").unwrap_or(defaults.health_message),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_base_url("UPSTREAM_BASE_URL", &self.upstream_base_url)?;
        validate_base_url("CHAT_BASE_URL", &self.chat_base_url)?;

        if !self.upstream_image_path.starts_with('/') {
            return Err(Error::Config(format!(
                "UPSTREAM_IMAGE_PATH must start with '/', got '{}'",
                self.upstream_image_path
            )));
        }
        if self.upstream_timeout.is_zero() || self.chat_timeout.is_zero() {
            return Err(Error::Config("Timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Full URL of the image generation endpoint.
    pub fn image_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.upstream_base_url.trim_end_matches('/'),
            self.upstream_image_path
        )
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn validate_base_url(key: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} must start with http:// or https://, got '{}'",
            key, url
        )))
    }
}
