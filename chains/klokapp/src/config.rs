use crate::api::ApiSettings;
use crate::auth::SignInTemplate;
use crate::session::{IdlePolicy, LoopSettings};
use config::{Config, Environment, File};
use core_logic::{ConfigError, SequentialSchedule};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KlokConfig {
    pub api: ApiConfig,
    pub signin: SignInConfig,
    pub session: SessionConfig,
    pub captcha: CaptchaConfig,
    pub questions: QuestionsConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub origin: String,
    pub user_agent: String,
    pub model: String,
    pub language: String,
    pub referral_code: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api1-pp.klokapp.ai/v1".to_string(),
            origin: "https://klokapp.ai".to_string(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36"
                .to_string(),
            model: "llama-3.3-70b-instruct".to_string(),
            language: "english".to_string(),
            referral_code: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignInConfig {
    pub domain: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
}

impl Default for SignInConfig {
    fn default() -> Self {
        Self {
            domain: "klokapp.ai".to_string(),
            uri: "https://klokapp.ai/".to_string(),
            version: "1".to_string(),
            chain_id: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One cycle per wallet in turn, then wait out the cycle target.
    Sequential,
    /// Every wallet loops on its own.
    Concurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleMode {
    Fixed,
    Daily,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub run_mode: RunMode,
    pub messages_per_cycle: u32,
    pub message_delay_secs: u64,
    pub retry_backoff_secs: u64,
    pub idle_mode: IdleMode,
    pub idle_secs: u64,
    pub cycle_hours: u64,
    pub inter_account_delay_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Sequential,
            messages_per_cycle: 10,
            message_delay_secs: 5,
            retry_backoff_secs: 60,
            idle_mode: IdleMode::Fixed,
            idle_secs: 5 * 60,
            cycle_hours: 24,
            inter_account_delay_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaProviderKind {
    None,
    Solver,
    Browser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    pub provider: CaptchaProviderKind,
    /// Falls back to `CAPSOLVER_API_KEY`.
    pub api_key: Option<String>,
    pub solver_url: String,
    pub task_type: String,
    pub website_url: String,
    pub website_key: String,
    pub page_action: Option<String>,
    pub enterprise: bool,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub webdriver_url: String,
    pub headless: bool,
    pub page_timeout_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            provider: CaptchaProviderKind::None,
            api_key: None,
            solver_url: "https://api.capsolver.com".to_string(),
            task_type: "ReCaptchaV3EnterpriseTaskProxyLess".to_string(),
            website_url: "https://klokapp.ai/".to_string(),
            website_key: "6LcZrRMrAAAAAKllb4TLb1CWH2LR7iNOKmT7rt3L".to_string(),
            page_action: None,
            enterprise: true,
            poll_interval_ms: 2000,
            max_attempts: 30,
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            page_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSourceKind {
    Static,
    File,
    Gemini,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuestionsConfig {
    pub source: QuestionSourceKind,
    pub file: String,
    /// Falls back to `GEMINI_API_KEY`.
    pub gemini_api_key: Option<String>,
    pub gemini_url: String,
    pub gemini_model: String,
    pub prompt: String,
    pub fallback: String,
    pub request_delay_ms: u64,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            source: QuestionSourceKind::Static,
            file: "questions.txt".to_string(),
            gemini_api_key: None,
            gemini_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            prompt: "Generate a short, specific question in English about cryptocurrency \
                     or blockchain technology."
                .to_string(),
            fallback: "What is the latest trend in cryptocurrency?".to_string(),
            request_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub private_keys: String,
    pub proxies: String,
    pub log_dir: String,
    pub log_file: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            private_keys: core_logic::WalletManager::PV_FILE.to_string(),
            proxies: core_logic::ProxyManager::PROXY_FILE.to_string(),
            log_dir: "logs".to_string(),
            log_file: "bot.log".to_string(),
        }
    }
}

impl KlokConfig {
    pub const ENV_PREFIX: &'static str = "KLOK";

    /// Layers the optional TOML file under `KLOK_*` environment variables
    /// (`KLOK_SESSION__RUN_MODE=concurrent`), then fills secrets from the
    /// conventional variables and validates the result.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: path.to_string(),
                reason: e.to_string(),
            })?;

        let mut config: KlokConfig =
            settings
                .try_deserialize()
                .map_err(|e| ConfigError::InvalidValue {
                    field: path.to_string(),
                    reason: e.to_string(),
                })?;

        config.fill_secrets_from(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn fill_secrets_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.captcha.api_key.is_none() {
            self.captcha.api_key = lookup("CAPSOLVER_API_KEY");
        }
        if self.questions.gemini_api_key.is_none() {
            self.questions.gemini_api_key = lookup("GEMINI_API_KEY");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.messages_per_cycle == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.messages_per_cycle".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.captcha.provider == CaptchaProviderKind::Solver
            && self.captcha.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::MissingField {
                field: "captcha.api_key (or CAPSOLVER_API_KEY)".to_string(),
            });
        }
        if self.captcha.provider == CaptchaProviderKind::Solver && self.captcha.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "captcha.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.questions.source == QuestionSourceKind::Gemini
            && self
                .questions
                .gemini_api_key
                .as_deref()
                .map_or(true, str::is_empty)
        {
            return Err(ConfigError::MissingField {
                field: "questions.gemini_api_key (or GEMINI_API_KEY)".to_string(),
            });
        }
        Ok(())
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api.base_url.clone(),
            origin: self.api.origin.clone(),
            user_agent: self.api.user_agent.clone(),
            model: self.api.model.clone(),
            language: self.api.language.clone(),
            referral_code: self.api.referral_code.clone().filter(|c| !c.is_empty()),
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
        }
    }

    pub fn signin_template(&self) -> SignInTemplate {
        SignInTemplate {
            domain: self.signin.domain.clone(),
            uri: self.signin.uri.clone(),
            version: self.signin.version.clone(),
            chain_id: self.signin.chain_id,
        }
    }

    pub fn cycle_target(&self) -> Duration {
        Duration::from_secs(self.session.cycle_hours * 60 * 60)
    }

    pub fn loop_settings(&self) -> LoopSettings {
        let idle = match self.session.idle_mode {
            IdleMode::Fixed => IdlePolicy::Fixed(Duration::from_secs(self.session.idle_secs)),
            IdleMode::Daily => IdlePolicy::Daily(self.cycle_target()),
        };
        LoopSettings {
            messages_per_cycle: self.session.messages_per_cycle,
            message_delay: Duration::from_secs(self.session.message_delay_secs),
            retry_backoff: Duration::from_secs(self.session.retry_backoff_secs),
            idle,
        }
    }

    pub fn sequential_schedule(&self) -> SequentialSchedule {
        SequentialSchedule {
            inter_worker_delay: Duration::from_secs(self.session.inter_account_delay_secs),
            cycle_target: self.cycle_target(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_constants() {
        let config = KlokConfig::default();
        assert_eq!(config.session.messages_per_cycle, 10);
        assert_eq!(config.captcha.max_attempts, 30);
        assert_eq!(config.signin.chain_id, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn solver_without_key_is_rejected() {
        let mut config = KlokConfig::default();
        config.captcha.provider = CaptchaProviderKind::Solver;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));

        config.fill_secrets_from(|name| (name == "CAPSOLVER_API_KEY").then(|| "k".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn daily_idle_uses_cycle_hours() {
        let mut config = KlokConfig::default();
        config.session.idle_mode = IdleMode::Daily;
        config.session.cycle_hours = 12;
        assert_eq!(
            config.loop_settings().idle,
            IdlePolicy::Daily(Duration::from_secs(12 * 3600))
        );
    }
}
