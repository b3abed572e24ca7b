use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::NarrationConfig;
use tossup_core::{HOST_PERSONA, NarrationContext, NarrationCue};
use tossup_types::ServerMessage;

const TTS_PERSONA: &str = "Generate expressive game show host audio following instruction.\n\n\
<|scene_desc_start|>\n\
Audio is recorded in a professional game show studio with good acoustics. \
The speaker is an enthusiastic, friendly game show host with natural speech patterns, \
appropriate pacing, and engaging intonation suitable for a TV game show audience.\n\
<|scene_desc_end|>";

/// A host line, optionally with spoken audio as base64.
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub text: String,
    pub audio: Option<String>,
    pub audio_format: Option<String>,
}

impl Narration {
    pub fn text_only(text: String) -> Self {
        Self {
            text,
            audio: None,
            audio_format: None,
        }
    }

    pub fn into_message(self) -> ServerMessage {
        ServerMessage::HostMessage {
            message: self.text,
            audio: self.audio,
            audio_format: self.audio_format,
        }
    }
}

/// Produces host lines. Implementations must never fail: whatever goes wrong
/// they fall back to the cue's fixed line.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, cue: &NarrationCue, context: &NarrationContext) -> Narration;
}

pub struct StaticNarrator;

#[async_trait]
impl Narrator for StaticNarrator {
    async fn narrate(&self, cue: &NarrationCue, _context: &NarrationContext) -> Narration {
        Narration::text_only(cue.fallback_text())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("Narration request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Narration backend returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Narration response had no usable content")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Host backed by an OpenAI-compatible chat completions endpoint, with an
/// optional speech model served the same way.
pub struct AiNarrator {
    client: Client,
    config: NarrationConfig,
}

impl AiNarrator {
    pub fn new(config: NarrationConfig) -> Result<Self, NarrationError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { client, config })
    }

    async fn complete(
        &self,
        cue: &NarrationCue,
        context: &NarrationContext,
    ) -> Result<String, NarrationError> {
        let prompt = format!("{}\n\n{}", context.describe(), cue.prompt());
        let request = ChatRequest {
            model: &self.config.ai_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: HOST_PERSONA,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: 150,
            temperature: 0.8,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.ai_base_url.trim_end_matches('/')
        );
        debug!("Requesting {} narration from {}", cue.kind(), url);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.ai_api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(NarrationError::Status(response.status()));
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(NarrationError::EmptyResponse)
    }

    async fn speak(&self, text: &str) -> Result<String, NarrationError> {
        let payload = serde_json::json!({
            "model": self.config.tts_model,
            "messages": [
                { "role": "system", "content": TTS_PERSONA },
                { "role": "user", "content": text },
            ],
            "max_tokens": 1024,
            "temperature": 0.3,
            "top_p": 0.95,
            "top_k": 50,
            "stop": ["<|end_of_text|>", "<|eot_id|>"],
            "stream": false,
        });

        let url = format!(
            "{}/v1/chat/completions",
            self.config.tts_base_url.trim_end_matches('/')
        );
        let mut builder = self.client.post(&url).json(&payload);
        if let Some(key) = &self.config.tts_api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(NarrationError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        extract_audio(&body).ok_or(NarrationError::EmptyResponse)
    }
}

#[async_trait]
impl Narrator for AiNarrator {
    async fn narrate(&self, cue: &NarrationCue, context: &NarrationContext) -> Narration {
        let text = match self.complete(cue, context).await {
            Ok(text) => text,
            Err(e) => {
                error!("Host narration for {} failed: {}", cue.kind(), e);
                cue.fallback_text()
            }
        };

        if !self.config.tts_enabled {
            return Narration::text_only(text);
        }

        match self.speak(&text).await {
            Ok(audio) => Narration {
                text,
                audio: Some(audio),
                audio_format: Some("mp3".to_string()),
            },
            Err(e) => {
                error!("Host speech generation failed: {}", e);
                Narration::text_only(text)
            }
        }
    }
}

/// Find base64 audio in a speech response. Servers disagree on where they put
/// it, so look at the choice itself, its message, and an OpenAI-style
/// `{ "data": ... }` wrapper. Raw byte arrays are encoded here.
fn extract_audio(body: &Value) -> Option<String> {
    let choice = body.get("choices")?.get(0)?;
    let candidates = [
        choice.get("audio"),
        choice.get("message").and_then(|m| m.get("audio")),
        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.get("audio")),
    ];

    candidates.into_iter().flatten().find_map(|audio| {
        let audio = audio.get("data").unwrap_or(audio);
        match audio {
            Value::String(encoded) if !encoded.is_empty() => Some(encoded.clone()),
            Value::Array(bytes) => {
                let bytes: Option<Vec<u8>> = bytes
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect();
                bytes.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            _ => None,
        }
    })
}

/// Picks the language model host when an API key is configured.
pub fn narrator_from_config(config: &NarrationConfig) -> Arc<dyn Narrator> {
    if config.ai_api_key.is_none() {
        info!("No AI_API_KEY set, using static game host");
        return Arc::new(StaticNarrator);
    }

    match AiNarrator::new(config.clone()) {
        Ok(narrator) => {
            info!(
                "AI game host enabled with {} at {} (speech: {})",
                config.ai_model, config.ai_base_url, config.tts_enabled
            );
            Arc::new(narrator)
        }
        Err(e) => {
            error!("Failed to initialize AI host, using static game host: {}", e);
            Arc::new(StaticNarrator)
        }
    }
}
