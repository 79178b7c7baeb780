use super::{ChatService, ImageGenerationService, ImagePayload};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Tiny valid 1x1 PNG.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Scripted upstream outcome. `Error` is not `Clone`, so failures are stored
/// as data and rebuilt on every call.
#[derive(Debug, Clone)]
enum MockOutcome<T> {
    Success(T),
    Reported { status: u16, detail: String },
    Transport(String),
}

impl<T: Clone> MockOutcome<T> {
    fn to_result(&self) -> Result<T> {
        match self {
            MockOutcome::Success(value) => Ok(value.clone()),
            MockOutcome::Reported { status, detail } => Err(Error::UpstreamReported {
                status: *status,
                detail: detail.clone(),
            }),
            MockOutcome::Transport(message) => Err(Error::Upstream(message.clone())),
        }
    }
}

#[derive(Debug)]
struct Script<T> {
    outcomes: Mutex<Vec<MockOutcome<T>>>,
    prompts: Mutex<Vec<String>>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, outcome: MockOutcome<T>) {
        self.outcomes.lock().unwrap().push(outcome);
    }

    /// Records the prompt and returns the scripted outcome, cycling through
    /// the list. `None` when nothing was scripted.
    fn next(&self, prompt: &str) -> Option<Result<T>> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());

        let outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            None
        } else {
            let index = (prompts.len() - 1) % outcomes.len();
            Some(outcomes[index].to_result())
        }
    }
}

/// In-memory image upstream. Returns [`TINY_PNG`] unless told otherwise.
#[derive(Debug, Clone)]
pub struct MockImageClient {
    script: Arc<Script<ImagePayload>>,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Script::new()),
        }
    }

    pub fn with_image_response(self, bytes: Vec<u8>, content_type: &str) -> Self {
        self.script.push(MockOutcome::Success(ImagePayload {
            bytes,
            content_type: content_type.to_string(),
        }));
        self
    }

    pub fn with_reported_error(self, status: u16, detail: &str) -> Self {
        self.script.push(MockOutcome::Reported {
            status,
            detail: detail.to_string(),
        });
        self
    }

    pub fn with_transport_error(self, message: &str) -> Self {
        self.script.push(MockOutcome::Transport(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.script.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.script.prompts.lock().unwrap().clone()
    }
}

impl Default for MockImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload> {
        self.script.next(prompt).unwrap_or_else(|| {
            Ok(ImagePayload {
                bytes: TINY_PNG.to_vec(),
                content_type: "image/png".to_string(),
            })
        })
    }
}

/// In-memory chat upstream. Echoes the prompt unless told otherwise.
#[derive(Debug, Clone)]
pub struct MockChatClient {
    script: Arc<Script<String>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Script::new()),
        }
    }

    pub fn with_reply(self, reply: &str) -> Self {
        self.script.push(MockOutcome::Success(reply.to_string()));
        self
    }

    pub fn with_reported_error(self, status: u16, detail: &str) -> Self {
        self.script.push(MockOutcome::Reported {
            status,
            detail: detail.to_string(),
        });
        self
    }

    pub fn with_transport_error(self, message: &str) -> Self {
        self.script.push(MockOutcome::Transport(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.script.prompts.lock().unwrap().len()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn chat(&self, prompt: &str) -> Result<String> {
        self.script
            .next(prompt)
            .unwrap_or_else(|| Ok(format!("You said: {}", prompt)))
    }
}
