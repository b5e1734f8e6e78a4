//! Chat-completion client: the production [`LanguageModel`].
//!
//! Speaks the OpenAI-style wire format (`model`, role-tagged `messages`,
//! `temperature` in; `choices[0].message.content` out) against whatever URL
//! the user configured, with a bearer API key.

use async_trait::async_trait;
use log::{debug, error, info};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use crate::config::TranslatorConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::translator::{ExpandedContent, LanguageModel};

const DETECT_TEMPERATURE: f32 = 0.0;
const TRANSLATE_TEMPERATURE: f32 = 0.3;
const EXPAND_TEMPERATURE: f32 = 0.7;

const DETECT_PROMPT: &str = "You are a language detection assistant. Respond with ONLY the language name in English (e.g., 'Vietnamese', 'English', 'French'). No other text.";

const EXPAND_PROMPT: &str = r#"You are a professional writing assistant. Expand the user's bullet points or short notes into clear, well-structured professional content.
Write one version in Vietnamese and one in English, with the same meaning.
Respond with ONLY a JSON object of this exact shape and nothing else:
{"vietnameseContent": "<Vietnamese text>", "englishContent": "<English text>"}"#;

fn translate_prompt(target_language: &str) -> String {
    format!(
        "You are a professional translator. Translate the given text to {}. Provide ONLY the translation, no explanations or additional text.",
        target_language
    )
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatClient {
    config: TranslatorConfig,
    client: Client,
}

impl ChatClient {
    pub fn new(config: TranslatorConfig) -> TranslateResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Chat client for {} using model {}", config.api_url, config.model);
        Ok(Self { config, client })
    }

    fn request(&self, system: impl Into<String>, user: impl Into<String>, temperature: f32) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::new("system", system), ChatMessage::new("user", user)],
            temperature,
        }
    }

    /// Sends one request and returns the first choice's trimmed content.
    /// `failure` is the message used when the reply carries no usable choice.
    async fn complete(&self, request: &ChatRequest, failure: &str) -> TranslateResult<String> {
        debug!("POST {} (temperature {})", self.config.api_url, request.temperature);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Error response from server ({}): {}", status, body);
            return Err(TranslateError::Api(format!("Server returned error ({}): {}", status, body.trim())));
        }

        extract_content(&body).ok_or_else(|| {
            error!("No usable choice in response: {}", body);
            TranslateError::Api(failure.to_string())
        })
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn detect(&self, text: &str) -> TranslateResult<String> {
        let request = self.request(
            DETECT_PROMPT,
            format!("Detect the language of this text: \"{}\"", text),
            DETECT_TEMPERATURE,
        );
        self.complete(&request, "Failed to detect language").await
    }

    async fn translate(&self, text: &str, target_language: &str) -> TranslateResult<String> {
        let request = self.request(translate_prompt(target_language), text, TRANSLATE_TEMPERATURE);
        self.complete(&request, "Failed to translate text").await
    }

    async fn expand(&self, bullet_points: &str) -> TranslateResult<ExpandedContent> {
        let request = self.request(EXPAND_PROMPT, bullet_points, EXPAND_TEMPERATURE);
        let content = self.complete(&request, "Failed to expand content").await?;
        parse_expansion(&content)
    }
}

/// First choice's message content, trimmed; `None` when absent or blank.
fn extract_content(body: &str) -> Option<String> {
    let response: ChatResponse = serde_json::from_str(body).ok()?;
    let content = response.choices.into_iter().next()?.message.content?;
    let content = content.trim();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\r?\n?(.*?)\s*```\s*$").expect("valid fence pattern")
    })
}

/// Removes a surrounding ``` or ```json fence, if any.
pub fn strip_code_fence(content: &str) -> &str {
    match code_fence().captures(content).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => content.trim(),
    }
}

pub fn parse_expansion(content: &str) -> TranslateResult<ExpandedContent> {
    let expanded: ExpandedContent = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| TranslateError::Parse(e.to_string()))?;

    if expanded.vietnamese_content.trim().is_empty() || expanded.english_content.trim().is_empty() {
        return Err(TranslateError::Parse("expanded content is empty".to_string()));
    }
    Ok(expanded)
}
