//! Inference client for the external completion service
//!
//! One attempt per query, no retries: a reachable-but-degraded service is
//! recovered through the deterministic fallback, an unreachable or non-2xx
//! service is a hard transport error for the caller to surface.

pub mod parse;
pub mod prompt;

use serde::{Deserialize, Serialize};

use crate::commands;
use crate::i18n::Language;
use crate::response::AiResponse;
use crate::settings::CustomCommand;
use crate::{Error, Result};

/// Model identifier sent with every completion request
pub const MODEL: &str = "llama-3.1-8b-instant";

/// Default completion endpoint (OpenAI-compatible chat completions)
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Fixed sampling temperature
const TEMPERATURE: f32 = 0.7;

/// Fixed reply length cap
const MAX_TOKENS: u32 = 1024;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for the chat-completion service
pub struct InferenceClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl InferenceClient {
    /// Create a new inference client
    ///
    /// A missing API key is allowed; requests will then fail upstream and
    /// surface as transport errors, keeping the rest of the gateway usable.
    #[must_use]
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!("no inference API key configured, queries will fail upstream");
        }

        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Resolve a query into a structured response
    ///
    /// Custom commands are checked first and short-circuit the network path
    /// entirely. Otherwise the query goes to the completion service and the
    /// reply is normalized (with the deterministic fallback on bad output).
    ///
    /// # Errors
    ///
    /// Returns error only when the completion service is unreachable or
    /// replies with a non-success status.
    pub async fn infer(
        &self,
        query: &str,
        custom_commands: &[CustomCommand],
        language: Language,
    ) -> Result<AiResponse> {
        if let Some(command) = commands::find_match(query, custom_commands) {
            tracing::info!(phrase = %command.phrase, "custom command matched, skipping inference");
            return Ok(commands::command_response(command, language));
        }

        let text = self.complete(query, language).await?;
        Ok(parse::normalize(&text, query, language))
    }

    /// Send the prompt pair and return the raw reply text
    async fn complete(&self, query: &str, language: Language) -> Result<String> {
        tracing::debug!(%language, "sending completion request");

        let user = prompt::user_prompt(query, language);
        let request = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt::system_prompt(language),
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "completion request failed");
            Error::Inference(format!("completion request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "completion API error");
            return Err(Error::Inference(format!(
                "completion API error {status}: {body}"
            )));
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse completion envelope");
            Error::Inference(format!("invalid completion envelope: {e}"))
        })?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        tracing::debug!(reply_len = content.len(), "completion received");
        Ok(content)
    }
}
