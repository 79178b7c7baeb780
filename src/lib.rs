//! Prompt relay for the BUDDY assistant
//!
//! A stateless HTTP service that forwards user prompts to an upstream image
//! generation Space (or an LLM chat endpoint) and hands the result back as raw
//! image bytes or a JSON error.

pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod server;
pub mod upstream;

pub use error::{Error, Result};
