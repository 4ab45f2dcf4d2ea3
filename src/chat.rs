//! Chat completion client.
//!
//! Talks to an OpenAI-compatible `chat/completions` endpoint. The bearer
//! token comes from the environment variable named in the configuration.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::error::Error;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends a single user message and returns the reply text.
    async fn ask(&self, query: &str) -> Result<String, Error>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(config: &ChatConfig, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }

    /// Builds a client whose key is read from `config.api_key_env`.
    pub fn from_env(config: &ChatConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            debug!("{} is not set, chat requests will fail", config.api_key_env);
        }
        Self::new(config, api_key)
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn ask(&self, query: &str) -> Result<String, Error> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Chat("No API key configured".to_string()))?;
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: query.to_string(),
            }],
        };
        let response: CompletionResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| Error::Chat(err.to_string()))?
            .json()
            .await
            .map_err(|err| Error::Chat(format!("Unexpected response: {err}")))?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Chat("Response contained no choices".to_string()))
    }
}
