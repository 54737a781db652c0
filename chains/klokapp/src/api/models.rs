use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Proof-of-humanness value, consumed by the next verify call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaToken(String);

impl CaptchaToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    #[serde(rename = "signedMessage")]
    pub signed_message: &'a str,
    pub message: &'a str,
    pub referral_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recaptcha_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub sources: Vec<String>,
    pub model: String,
    pub created_at: String,
    pub language: String,
}

impl ChatRequest {
    /// A single user message opening thread `id`.
    pub fn new(id: Uuid, question: &str, model: &str, language: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: question.to_string(),
            }],
            sources: Vec::new(),
            model: model.to_string(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            language: language.to_string(),
        }
    }
}

/// The shapes `/chat` is known to answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatResponse {
    /// `{"choices":[{"message":{"content":"..."}}]}`
    Choices(String),
    /// `{"message":"..."}`
    Message(String),
    /// Anything else, kept verbatim.
    Raw(String),
}

impl ChatResponse {
    pub fn parse(body: &str) -> Self {
        let value: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(_) => return ChatResponse::Raw(body.to_string()),
        };

        if let Some(content) = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
        {
            return ChatResponse::Choices(content.to_string());
        }
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return ChatResponse::Message(message.to_string());
        }
        ChatResponse::Raw(body.to_string())
    }

    pub fn into_reply(self) -> ChatReply {
        let content = match self {
            ChatResponse::Choices(c) | ChatResponse::Message(c) | ChatResponse::Raw(c) => c,
        };
        ChatReply { content }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
}

impl ChatReply {
    /// First `max` characters of the reply, for log lines.
    pub fn preview(&self, max: usize) -> String {
        if self.content.chars().count() > max {
            let head: String = self.content.chars().take(max).collect();
            format!("{}...", head)
        } else {
            self.content.clone()
        }
    }
}
