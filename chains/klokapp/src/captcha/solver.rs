use super::CaptchaProvider;
use crate::api::CaptchaToken;
use crate::error::CaptchaError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// What the solver service needs to know about the page.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    pub base_url: String,
    pub api_key: String,
    pub task_type: String,
    pub website_url: String,
    pub website_key: String,
    pub page_action: Option<String>,
    pub enterprise: bool,
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Ready(CaptchaToken),
    Failed(String),
}

/// The two calls of a CapSolver-compatible service.
#[async_trait]
pub trait SolverBackend: Send + Sync {
    /// Submits a task and returns its id.
    async fn create_task(&self) -> Result<String, CaptchaError>;

    async fn task_result(&self, task_id: &str) -> Result<TaskStatus, CaptchaError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest<'a> {
    client_key: &'a str,
    task: TaskSpec<'a>,
}

#[derive(Debug, Serialize)]
struct TaskSpec<'a> {
    #[serde(rename = "type")]
    task_type: &'a str,
    #[serde(rename = "websiteURL")]
    website_url: &'a str,
    #[serde(rename = "websiteKey")]
    website_key: &'a str,
    #[serde(rename = "isEnterprise")]
    is_enterprise: bool,
    #[serde(rename = "pageAction", skip_serializing_if = "Option::is_none")]
    page_action: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultRequest<'a> {
    client_key: &'a str,
    task_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolverReply {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    solution: Option<Solution>,
}

#[derive(Debug, Default, Deserialize)]
struct Solution {
    #[serde(rename = "gRecaptchaResponse", default)]
    g_recaptcha_response: Option<String>,
}

impl SolverReply {
    fn error_text(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.error_code.clone())
            .unwrap_or_else(|| format!("errorId {}", self.error_id))
    }
}

/// HTTP backend for a CapSolver-compatible API.
pub struct CapSolverClient {
    http: Client,
    settings: SolverSettings,
}

impl CapSolverClient {
    pub fn new(settings: SolverSettings) -> Result<Self, CaptchaError> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| CaptchaError::Transport(e.to_string()))?;
        Ok(Self { http, settings })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<SolverReply, CaptchaError> {
        let url = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CaptchaError::Transport(e.to_string()))?;
        let text = response
            .text()
            .await
            .map_err(|e| CaptchaError::Transport(e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|_| CaptchaError::Solve(format!("unreadable solver reply: {}", text)))
    }
}

#[async_trait]
impl SolverBackend for CapSolverClient {
    async fn create_task(&self) -> Result<String, CaptchaError> {
        let request = CreateTaskRequest {
            client_key: &self.settings.api_key,
            task: TaskSpec {
                task_type: &self.settings.task_type,
                website_url: &self.settings.website_url,
                website_key: &self.settings.website_key,
                is_enterprise: self.settings.enterprise,
                page_action: self.settings.page_action.as_deref(),
            },
        };
        let reply = self.post("createTask", &request).await?;
        if reply.error_id != 0 {
            return Err(CaptchaError::Solve(reply.error_text()));
        }
        reply
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CaptchaError::Solve("createTask returned no taskId".to_string()))
    }

    async fn task_result(&self, task_id: &str) -> Result<TaskStatus, CaptchaError> {
        let request = TaskResultRequest {
            client_key: &self.settings.api_key,
            task_id,
        };
        let reply = self.post("getTaskResult", &request).await?;
        if reply.error_id != 0 {
            return Ok(TaskStatus::Failed(reply.error_text()));
        }
        match reply.status.as_deref() {
            Some("ready") => reply
                .solution
                .and_then(|s| s.g_recaptcha_response)
                .filter(|t| !t.is_empty())
                .map(|t| TaskStatus::Ready(CaptchaToken::new(t)))
                .ok_or_else(|| CaptchaError::Solve("ready without gRecaptchaResponse".to_string())),
            Some("failed") => Ok(TaskStatus::Failed(reply.error_text())),
            _ => Ok(TaskStatus::Pending),
        }
    }
}

/// Solver-service strategy: submit once, then poll on a fixed interval.
pub struct SolverCaptcha<B> {
    backend: B,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<B: SolverBackend> SolverCaptcha<B> {
    pub fn new(backend: B, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            backend,
            poll_interval,
            max_attempts,
        }
    }
}

impl SolverCaptcha<CapSolverClient> {
    pub fn capsolver(settings: SolverSettings) -> Result<Self, CaptchaError> {
        let poll_interval = settings.poll_interval;
        let max_attempts = settings.max_attempts;
        Ok(Self::new(
            CapSolverClient::new(settings)?,
            poll_interval,
            max_attempts,
        ))
    }
}

#[async_trait]
impl<B: SolverBackend> CaptchaProvider for SolverCaptcha<B> {
    fn name(&self) -> &str {
        "solver"
    }

    async fn acquire(&self) -> Result<CaptchaToken, CaptchaError> {
        let task_id = self.backend.create_task().await?;
        info!("🧩 Captcha task {} created, polling for result...", task_id);

        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.poll_interval).await;
            match self.backend.task_result(&task_id).await? {
                TaskStatus::Ready(token) => {
                    info!("🧩 Captcha solved after {} polls", attempt);
                    return Ok(token);
                }
                TaskStatus::Failed(reason) => return Err(CaptchaError::Solve(reason)),
                TaskStatus::Pending => debug!("captcha task {} pending ({})", task_id, attempt),
            }
        }

        Err(CaptchaError::Timeout {
            attempts: self.max_attempts,
        })
    }
}
