//! Where chat questions come from.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const BUILTIN_QUESTIONS: [&str; 12] = [
    "What are the latest updates in Ethereum?",
    "How does proof of stake work?",
    "What are the best DeFi protocols?",
    "Explain smart contract security",
    "What is the current state of Layer 2 solutions?",
    "How do rollups work?",
    "What are the benefits of Web3?",
    "Explain blockchain interoperability",
    "What are the trending NFT projects?",
    "How does tokenomics work?",
    "What is the future of DAOs?",
    "Explain MEV in blockchain",
];

#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Never fails: sources that can fail degrade to a fallback question.
    async fn next_question(&self) -> String;
}

/// Random pick from a fixed list.
#[derive(Debug, Clone)]
pub struct StaticQuestions {
    questions: Vec<String>,
}

impl StaticQuestions {
    pub fn builtin() -> Self {
        Self {
            questions: BUILTIN_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }

    pub fn new(questions: Vec<String>) -> Result<Self> {
        if questions.is_empty() {
            bail!("question list is empty");
        }
        Ok(Self { questions })
    }

    /// One question per non-blank line. `#` starts a comment line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read questions from {}", path.display()))?;
        let questions: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        info!("Loaded {} questions from {}", questions.len(), path.display());
        Self::new(questions).with_context(|| format!("{} has no questions", path.display()))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionSource for StaticQuestions {
    async fn next_question(&self) -> String {
        self.questions
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| BUILTIN_QUESTIONS[0].to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub prompt: String,
    pub fallback: String,
    pub request_delay: Duration,
    pub request_timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Asks Gemini to write a fresh question each time.
pub struct GeminiQuestions {
    http: Client,
    settings: GeminiSettings,
}

impl GeminiQuestions {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;
        Ok(Self { http, settings })
    }

    async fn generate(&self) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part {
                    text: &self.settings.prompt,
                }],
            }],
        };

        let response = self
            .http
            .post(url)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        let body: Value = response.json().await.context("Gemini returned non-JSON")?;
        if !status.is_success() {
            bail!("Gemini returned status {}: {}", status, body);
        }

        let text = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .context("Gemini response has no candidate text")?;
        Ok(text.to_string())
    }
}

#[async_trait]
impl QuestionSource for GeminiQuestions {
    async fn next_question(&self) -> String {
        tokio::time::sleep(self.settings.request_delay).await;
        match self.generate().await {
            Ok(question) => question,
            Err(e) => {
                warn!("Question generation failed, using fallback: {:#}", e);
                self.settings.fallback.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_pick_is_from_list() {
        let source = StaticQuestions::builtin();
        assert_eq!(source.len(), 12);
        for _ in 0..20 {
            let q = source.next_question().await;
            assert!(BUILTIN_QUESTIONS.contains(&q.as_str()));
        }
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(StaticQuestions::new(Vec::new()).is_err());
    }
}
