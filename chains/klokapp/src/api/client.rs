use super::models::{
    CaptchaToken, ChatReply, ChatRequest, ChatResponse, VerifyRequest, VerifyResponse,
};
use super::quota::{Quota, RateLimitResponse};
use super::KlokApi;
use crate::auth::SignedLogin;
use crate::error::{AuthError, KlokError};
use async_trait::async_trait;
use chrono::Utc;
use core_logic::ProxyConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-session-token";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub origin: String,
    pub user_agent: String,
    pub model: String,
    pub language: String,
    pub referral_code: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ApiSettings {
    /// Settings pointing at `base_url` with every other field at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        crate::config::KlokConfig::default().api_settings()
    }
}

/// HTTP client for one account. Each account gets its own client so its
/// proxy and connection pool are never shared.
pub struct KlokClient {
    http: Client,
    settings: ApiSettings,
}

impl KlokClient {
    pub fn new(settings: ApiSettings, proxy: Option<&ProxyConfig>) -> Result<Self, KlokError> {
        let mut builder = Client::builder()
            .default_headers(Self::browser_headers(&settings)?)
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout);

        if let Some(proxy_conf) = proxy {
            let mut proxy = Proxy::all(&proxy_conf.url).map_err(|e| invalid_proxy(proxy_conf, e))?;
            if let (Some(u), Some(p)) = (&proxy_conf.username, &proxy_conf.password) {
                proxy = proxy.basic_auth(u, p);
            }
            builder = builder.proxy(proxy);
        }

        let http = builder.build().map_err(|e| KlokError::Network {
            endpoint: "client",
            reason: e.to_string(),
        })?;

        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn browser_headers(settings: &ApiSettings) -> Result<HeaderMap, KlokError> {
        let value = |field: &str, raw: &str| {
            HeaderValue::from_str(raw).map_err(|e| {
                KlokError::Configuration(core_logic::ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: e.to_string(),
                })
            })
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, value("api.origin", &settings.origin)?);
        headers.insert(
            REFERER,
            value("api.origin", &format!("{}/", settings.origin.trim_end_matches('/')))?,
        );
        headers.insert(USER_AGENT, value("api.user_agent", &settings.user_agent)?);
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn read_body(
        response: reqwest::Response,
        endpoint: &'static str,
    ) -> Result<(StatusCode, String), KlokError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| KlokError::Network {
            endpoint,
            reason: e.to_string(),
        })?;
        Ok((status, body))
    }
}

fn invalid_proxy(proxy: &ProxyConfig, err: reqwest::Error) -> KlokError {
    KlokError::Configuration(core_logic::ConfigError::InvalidProxy {
        line: proxy.url.clone(),
        reason: err.to_string(),
    })
}

#[async_trait]
impl KlokApi for KlokClient {
    async fn verify(
        &self,
        login: &SignedLogin,
        captcha: Option<&CaptchaToken>,
    ) -> Result<String, KlokError> {
        let request = VerifyRequest {
            signed_message: &login.signature,
            message: &login.message,
            referral_code: self.settings.referral_code.as_deref(),
            recaptcha_token: captcha.map(CaptchaToken::as_str),
        };

        let response = self
            .http
            .post(self.url("verify"))
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: VerifyResponse =
            serde_json::from_str(&body).map_err(|_| AuthError::InvalidResponse {
                status: status.as_u16(),
                body: body.clone(),
            })?;

        match parsed.session_token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(token),
            None => Err(AuthError::MissingToken {
                status: status.as_u16(),
                body,
            }
            .into()),
        }
    }

    async fn rate_limit(&self, token: &str) -> Result<Quota, KlokError> {
        let response = self
            .http
            .get(self.url("rate-limit"))
            .header(SESSION_HEADER, token)
            .send()
            .await
            .map_err(|e| KlokError::Network {
                endpoint: "rate-limit",
                reason: e.to_string(),
            })?;

        let (status, body) = Self::read_body(response, "rate-limit").await?;
        if !status.is_success() {
            return Err(KlokError::Quota {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RateLimitResponse =
            serde_json::from_str(&body).map_err(|_| KlokError::Quota {
                status: status.as_u16(),
                body: body.clone(),
            })?;
        Ok(parsed.normalize(Utc::now()))
    }

    async fn chat(
        &self,
        token: &str,
        thread_id: Uuid,
        question: &str,
    ) -> Result<ChatReply, KlokError> {
        let request = ChatRequest::new(
            thread_id,
            question,
            &self.settings.model,
            &self.settings.language,
            Utc::now(),
        );

        let response = self
            .http
            .post(self.url("chat"))
            .header(SESSION_HEADER, token)
            .json(&request)
            .send()
            .await
            .map_err(|e| KlokError::Network {
                endpoint: "chat",
                reason: e.to_string(),
            })?;

        let (status, body) = Self::read_body(response, "chat").await?;
        if !status.is_success() {
            return Err(KlokError::SendMessage {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = ChatResponse::parse(&body);
        if let ChatResponse::Raw(_) = parsed {
            debug!("chat answered with an unrecognised shape, keeping raw body");
        }
        Ok(parsed.into_reply())
    }
}
