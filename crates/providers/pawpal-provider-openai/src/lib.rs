//! OpenAI-compatible chat completion generator for PawPal
//!
//! Talks to any endpoint that speaks the `/chat/completions` protocol.
//! DeepSeek is preferred when `DEEPSEEK_API_KEY` is set, OpenAI otherwise.
//! Without a key the generator reports itself unavailable and the turn
//! workflow answers from its canned phrases.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use pawpal_core::{
    fallback_greeting, get_env_or, HistoryEntry, PawpalError, Personality, RandomSource,
    ResponseGenerator, Result, ThreadRandom,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod prompts;

pub use prompts::system_prompt;

/// History pairs sent with each request
pub const HISTORY_PAIRS: usize = 6;

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_idle_timeout(Duration::from_secs(90))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Falling back to default HTTP client");
                    Client::new()
                })
        })
        .clone()
}

/// Which service the configuration points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// api.deepseek.com
    DeepSeek,
    /// api.openai.com or a compatible server
    OpenAi,
}

/// Endpoint and sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Service in use
    pub backend: Backend,
    /// Bearer token; `None` disables the generator
    pub api_key: Option<String>,
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Completion length cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: Backend::OpenAi,
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            temperature: 0.8,
            top_p: 0.9,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ProviderConfig {
    /// DeepSeek settings with `api_key`
    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self {
            backend: Backend::DeepSeek,
            api_key: Some(api_key.into()),
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            ..Self::default()
        }
    }

    /// OpenAI settings with `api_key`
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Read `DEEPSEEK_*`, then `OPENAI_*`
    pub fn from_env() -> Self {
        if let Some(key) = non_empty_env("DEEPSEEK_API_KEY") {
            let defaults = Self::deepseek(key);
            return Self {
                base_url: get_env_or("DEEPSEEK_BASE_URL", &defaults.base_url),
                model: get_env_or("DEEPSEEK_MODEL", &defaults.model),
                ..defaults
            };
        }

        let defaults = Self::default();
        Self {
            api_key: non_empty_env("OPENAI_API_KEY"),
            base_url: get_env_or("OPENAI_BASE_URL", &defaults.base_url),
            model: get_env_or("OPENAI_MODEL", &defaults.model),
            ..defaults
        }
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// One chat message on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    /// Text
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model name
    pub model: String,
    /// Conversation, system prompt first
    pub messages: Vec<ChatMessage>,
    /// Completion length cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Build the request for one reply
///
/// Only the last [`HISTORY_PAIRS`] pairs of `history` are included.
pub fn build_request(
    config: &ProviderConfig,
    input: &str,
    personality: Personality,
    history: &[HistoryEntry],
) -> ChatRequest {
    let skip = history.len().saturating_sub(HISTORY_PAIRS);
    let mut messages = Vec::with_capacity(2 + 2 * (history.len() - skip));
    messages.push(ChatMessage::new("system", system_prompt(personality)));
    for entry in &history[skip..] {
        messages.push(ChatMessage::new("user", &entry.user_input));
        messages.push(ChatMessage::new("assistant", &entry.pet_response));
    }
    messages.push(ChatMessage::new("user", input));

    ChatRequest {
        model: config.model.clone(),
        messages,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        top_p: config.top_p,
    }
}

/// Extract the reply text from a response body
pub fn parse_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(PawpalError::generator("Completion contained no text"));
    }
    Ok(text)
}

/// [`ResponseGenerator`] over an OpenAI-compatible HTTP API
pub struct OpenAiCompatibleGenerator {
    client: Client,
    config: ProviderConfig,
    random: Arc<dyn RandomSource>,
}

impl OpenAiCompatibleGenerator {
    /// Create with explicit settings
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: get_http_client(),
            config,
            random: Arc::new(ThreadRandom),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let config = ProviderConfig::from_env();
        match (&config.api_key, config.backend) {
            (Some(_), Backend::DeepSeek) => info!(model = %config.model, "Using DeepSeek API"),
            (Some(_), Backend::OpenAi) => info!(model = %config.model, "Using OpenAI API"),
            (None, _) => warn!("No API key configured; replies will use canned phrases"),
        }
        Self::new(config)
    }

    /// Random source for canned greetings
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Active settings
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl ResponseGenerator for OpenAiCompatibleGenerator {
    async fn generate_response(
        &self,
        input: &str,
        personality: Personality,
        history: &[HistoryEntry],
    ) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| PawpalError::generator("No API key configured"))?;

        let request = build_request(&self.config, input, personality, history);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(api_key)
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PawpalError::generator(format!(
                    "Chat completion request to {} failed: {}",
                    self.config.base_url, e
                ))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PawpalError::generator(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(PawpalError::generator(format!(
                "Chat completion returned {}: {}",
                status, body
            )));
        }

        parse_response(&body)
    }

    async fn generate_greeting(&self, personality: Personality) -> Result<String> {
        Ok(fallback_greeting(personality, self.random.as_ref()))
    }

    fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawpal_core::FixedRandom;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn entry(i: usize) -> HistoryEntry {
        HistoryEntry {
            user_input: format!("q{}", i),
            pet_response: format!("a{}", i),
        }
    }

    /// Serve one HTTP response and hand back the request body
    async fn serve_once(status: &'static str, body: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            let request_body = loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let headers = text[..split].to_lowercase();
                    let length = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length {
                        break String::from_utf8_lossy(&raw[split + 4..split + 4 + length])
                            .to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };

            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = tx.send(request_body);
        });

        (format!("http://{}", addr), rx)
    }

    #[test]
    fn test_request_keeps_last_six_pairs() {
        let history: Vec<_> = (0..9).map(entry).collect();
        let request = build_request(
            &ProviderConfig::default(),
            "在吗",
            Personality::Clingy,
            &history,
        );

        assert_eq!(request.messages.len(), 1 + 12 + 1);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content, system_prompt(Personality::Clingy));
        assert_eq!(request.messages[1].content, "q3");
        assert_eq!(request.messages[2].role, "assistant");
        assert_eq!(request.messages[12].content, "a8");
        assert_eq!(request.messages[13], ChatMessage::new("user", "在吗"));
        assert_eq!(request.max_tokens, 150);
        assert!((request.temperature - 0.8).abs() < f32::EPSILON);
        assert!((request.top_p - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_request_without_history() {
        let request = build_request(&ProviderConfig::default(), "hi", Personality::Quiet, &[]);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_parse_response_trims_first_choice() {
        let body = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "  哼，知道了。\n"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        })
        .to_string();
        assert_eq!(parse_response(&body).unwrap(), "哼，知道了。");
    }

    #[test]
    fn test_parse_response_rejects_empty() {
        assert!(parse_response(r#"{"choices": []}"#).unwrap_err().is_generator_failure());
        let blank = json!({"choices": [{"message": {"content": "   "}}]}).to_string();
        assert!(parse_response(&blank).is_err());
        assert!(matches!(
            parse_response("not json"),
            Err(PawpalError::Serialization(_))
        ));
    }

    #[test]
    fn test_deepseek_defaults() {
        let config = ProviderConfig::deepseek("sk-test");
        assert_eq!(config.backend, Backend::DeepSeek);
        assert_eq!(config.endpoint(), "https://api.deepseek.com/v1/chat/completions");
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(
            config.with_base_url("http://localhost:9/").endpoint(),
            "http://localhost:9/chat/completions"
        );
    }

    #[test]
    fn test_availability_follows_key() {
        assert!(!OpenAiCompatibleGenerator::new(ProviderConfig::default()).is_available());
        assert!(OpenAiCompatibleGenerator::new(ProviderConfig::openai("sk-test")).is_available());
    }

    #[test]
    fn test_greeting_is_canned() {
        let generator = OpenAiCompatibleGenerator::new(ProviderConfig::default())
            .with_random(Arc::new(FixedRandom(0.0)));
        let greeting =
            tokio_test::block_on(generator.generate_greeting(Personality::Playful)).unwrap();
        assert_eq!(greeting, fallback_greeting(Personality::Playful, &FixedRandom(0.0)));
    }

    #[tokio::test]
    async fn test_missing_key_is_generator_error() {
        let generator = OpenAiCompatibleGenerator::new(ProviderConfig::default());
        let err = generator
            .generate_response("hi", Personality::Cold, &[])
            .await
            .unwrap_err();
        assert!(err.is_generator_failure());
    }

    #[tokio::test]
    async fn test_round_trip_against_local_server() {
        let body = json!({"choices": [{"message": {"content": "喵喵！"}}]}).to_string();
        let (base_url, request_rx) = serve_once("200 OK", body).await;

        let generator = OpenAiCompatibleGenerator::new(
            ProviderConfig::openai("sk-test")
                .with_base_url(base_url)
                .with_model("test-model"),
        );
        let reply = generator
            .generate_response("陪我玩", Personality::Playful, &[entry(1)])
            .await
            .unwrap();
        assert_eq!(reply, "喵喵！");

        let sent: serde_json::Value = serde_json::from_str(&request_rx.await.unwrap()).unwrap();
        assert_eq!(sent["model"], "test-model");
        assert_eq!(sent["max_tokens"], 150);
        assert_eq!(sent["messages"].as_array().unwrap().len(), 4);
        assert_eq!(sent["messages"][3]["content"], "陪我玩");
    }

    #[tokio::test]
    async fn test_error_status_is_generator_error() {
        let (base_url, _rx) =
            serve_once("401 Unauthorized", r#"{"error":"bad key"}"#.to_string()).await;
        let generator = OpenAiCompatibleGenerator::new(
            ProviderConfig::openai("sk-wrong").with_base_url(base_url),
        );
        let err = generator
            .generate_response("hi", Personality::Quiet, &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
