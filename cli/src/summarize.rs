//! Chat-completion client used for summaries and free-form questions.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint; DeepSeek is
//! the default. Failures propagate as [`SummarizeError`], never as text
//! dressed up as a summary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default endpoint base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
/// Default model.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

const TEMPERATURE: f64 = 0.6;
const MAX_TOKENS: u32 = 3000;

/// Errors from the summarization endpoint.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// No API key was configured.
    #[error("API key not configured (set DEEPSEEK_API_KEY or pass --api-key)")]
    MissingApiKey,

    /// Transport failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response had no usable message.
    #[error("response contained no message")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Client for the summarization endpoint.
#[derive(Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepSeekClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a client from an optional key, rejecting a missing or blank one.
    pub fn from_key(api_key: Option<String>) -> Result<Self, SummarizeError> {
        match api_key {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(SummarizeError::MissingApiKey),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Summarize an extracted document.
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        self.complete(summary_prompt(text)).await
    }

    /// Answer a free-form question.
    pub async fn answer(&self, message: &str) -> Result<String, SummarizeError> {
        self.complete(question_prompt(message)).await
    }

    async fn complete(&self, prompt: String) -> Result<String, SummarizeError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        log::debug!(
            "POST {}/chat/completions (model {}, {} prompt chars)",
            self.base_url,
            self.model,
            request.messages[0].content.chars().count()
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Summarization endpoint returned {}", status);
            return Err(SummarizeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().await?;
        first_message(body)
    }
}

fn first_message(response: ChatResponse) -> Result<String, SummarizeError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(SummarizeError::EmptyResponse)
}

/// Prompt asking for a detailed summary of a labor-law document.
pub fn summary_prompt(text: &str) -> String {
    format!(
        "Você é um especialista em legislação trabalhista. Resuma este documento detalhadamente:\n\n{}",
        text
    )
}

/// Prompt for a free-form question. Requests to "summarize" are turned
/// into requests to "answer precisely", then sent through the same
/// specialist template as a document.
pub fn question_prompt(message: &str) -> String {
    summary_prompt(&message.trim().replace("Resuma", "Responda com precisão"))
}
