//! `CommandRouter` trait and the chat-completions implementation.

use async_trait::async_trait;
use thiserror::Error;

use super::parse::parse_tool_call;
use super::prompt::PromptBuilder;
use crate::config::RouterConfig;
use crate::context::RoutingContext;
use crate::tool::ToolCall;

// ---------------------------------------------------------------------------
// RouteError
// ---------------------------------------------------------------------------

/// Errors that end a routing attempt.  An unusable reply is not an error; it
/// is `Ok(None)`.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No router credential in the routing context.
    #[error("Please set Hugging Face Token in Settings.")]
    MissingCredential,

    /// Connection failure, non-2xx status, or a body that is not JSON.
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for RouteError {
    fn from(e: reqwest::Error) -> Self {
        RouteError::Transport(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// CommandRouter trait
// ---------------------------------------------------------------------------

/// Picks one tool call for a transcript.
///
/// Returns `Ok(None)` when the model produced nothing that decodes as a tool
/// call.  Exactly one request per call, no retries.
#[async_trait]
pub trait CommandRouter: Send + Sync {
    async fn route(
        &self,
        transcript: &str,
        context: &RoutingContext,
    ) -> Result<Option<ToolCall>, RouteError>;
}

// ---------------------------------------------------------------------------
// ApiRouter
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The credential comes from the [`RoutingContext`], not the config, so it
/// is re-read for every utterance.
pub struct ApiRouter {
    client: reqwest::Client,
    config: RouterConfig,
    prompt_builder: PromptBuilder,
}

impl ApiRouter {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
            prompt_builder: PromptBuilder::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, system_msg: &str, user_msg: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "max_tokens": self.config.max_tokens
        })
    }
}

/// The first choice's message content, if present.
fn reply_content(json: &serde_json::Value) -> Option<&str> {
    json["choices"][0]["message"]["content"].as_str()
}

#[async_trait]
impl CommandRouter for ApiRouter {
    async fn route(
        &self,
        transcript: &str,
        context: &RoutingContext,
    ) -> Result<Option<ToolCall>, RouteError> {
        let key = context
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RouteError::MissingCredential)?;

        let (system_msg, user_msg) = self.prompt_builder.build_chat(transcript, context);
        log::debug!("router: system prompt:\n{system_msg}");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&self.request_body(&system_msg, &user_msg))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RouteError::Transport(format!(
                "routing failed with HTTP {status}: {}",
                body.trim()
            )));
        }

        let json: serde_json::Value = response.json().await?;
        let Some(content) = reply_content(&json) else {
            log::warn!("router: completion has no message content");
            return Ok(None);
        };
        log::debug!("router: reply {content:?}");

        Ok(parse_tool_call(content))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
