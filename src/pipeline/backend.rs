//! Pluggable text-generation backends.
//!
//! The pipeline depends only on `GenerationBackend`; whether inference
//! runs on a local Ollama instance or the Hugging Face Inference API is
//! decided by configuration at construction time, never inside pipeline
//! logic.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, BackendKind};

/// Errors from generation backends. Callers recover every variant into
/// deterministic fallback content; nothing here escapes the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("cannot reach inference backend at {0}")]
    Connection(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("backend not configured: {0} missing")]
    Unconfigured(&'static str),
}

/// A text-generation capability.
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Generate a completion for the prompt. Blocking, bounded by the
    /// backend's own timeout.
    fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

impl<T: GenerationBackend + ?Sized> GenerationBackend for std::sync::Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        (**self).generate(prompt)
    }
}

/// Build the configured backend.
pub fn backend_from_config(config: &AppConfig) -> Result<Box<dyn GenerationBackend>, BackendError> {
    match config.backend {
        BackendKind::Local => Ok(Box::new(OllamaBackend::new(
            &config.ollama_base_url,
            &config.ollama_model,
            300,
        ))),
        BackendKind::Remote => Ok(Box::new(HfInferenceBackend::new(
            &config.hf_model,
            &config.hf_token,
            30,
        )?)),
    }
}

// ═══════════════════════════════════════════════════════════
// OllamaBackend; local inference
// ═══════════════════════════════════════════════════════════

/// Ollama HTTP client for local LLM inference.
pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl GenerationBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                BackendError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        Ok(parsed.response)
    }
}

// ═══════════════════════════════════════════════════════════
// HfInferenceBackend; remote API
// ═══════════════════════════════════════════════════════════

/// Hugging Face Inference API client.
pub struct HfInferenceBackend {
    api_url: String,
    token: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct HfRequest<'a> {
    inputs: &'a str,
    parameters: HfParameters,
}

#[derive(Serialize)]
struct HfParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

impl HfInferenceBackend {
    pub fn new(model: &str, token: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        if token.trim().is_empty() {
            return Err(BackendError::Unconfigured("HF_TOKEN"));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            api_url: format!("https://api-inference.huggingface.co/models/{model}"),
            token: token.to_string(),
            client,
            timeout_secs,
        })
    }

    /// The API answers with either `[{"summary_text": ...}]` or
    /// `[{"generated_text": ...}]` depending on the model task.
    fn parse_response(value: serde_json::Value) -> Result<String, BackendError> {
        let first = value
            .as_array()
            .and_then(|arr| arr.first())
            .ok_or_else(|| BackendError::MalformedResponse("expected a non-empty array".into()))?;

        first
            .get("summary_text")
            .or_else(|| first.get("generated_text"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                BackendError::MalformedResponse(
                    "expected summary_text or generated_text field".into(),
                )
            })
    }
}

impl GenerationBackend for HfInferenceBackend {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let body = HfRequest {
            inputs: prompt,
            parameters: HfParameters {
                max_length: 200,
                min_length: 50,
                do_sample: false,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    BackendError::Connection(self.api_url.clone())
                } else if e.is_timeout() {
                    BackendError::Timeout(self.timeout_secs)
                } else {
                    BackendError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = response
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        Self::parse_response(value)
    }
}

// ═══════════════════════════════════════════════════════════
// MockBackend; deterministic backend for tests
// ═══════════════════════════════════════════════════════════

enum MockReply {
    Text(String),
    Error,
}

/// Scripted backend: replays a queue of replies, then repeats the last
/// one. Counts calls so retry behavior is observable.
pub struct MockBackend {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Always answer with the given text.
    pub fn new(response: &str) -> Self {
        Self::sequence(vec![Some(response.to_string())])
    }

    /// Always fail.
    pub fn failing() -> Self {
        Self::sequence(vec![None])
    }

    /// Replay the given replies in order (`None` = backend error),
    /// repeating the final reply once exhausted.
    pub fn sequence(replies: Vec<Option<String>>) -> Self {
        let queue = replies
            .into_iter()
            .map(|r| match r {
                Some(text) => MockReply::Text(text),
                None => MockReply::Error,
            })
            .collect();
        Self {
            replies: Mutex::new(queue),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl GenerationBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let mut replies = self.replies.lock().expect("mock lock");
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().map(|r| match r {
                MockReply::Text(t) => MockReply::Text(t.clone()),
                MockReply::Error => MockReply::Error,
            })
        };

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error) | None => {
                Err(BackendError::Connection("mock backend".into()))
            }
        }
    }
}
