use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{setup_logger, ConfigError, ProxyManager, WalletManager, Worker, WorkerRunner};
use dotenv::dotenv;
use klokapp_bot::api::{KlokApi, KlokClient};
use klokapp_bot::auth::Credential;
use klokapp_bot::captcha::{
    BrowserCaptcha, BrowserSettings, CaptchaProvider, SolverCaptcha, SolverSettings,
};
use klokapp_bot::config::{CaptchaProviderKind, KlokConfig, QuestionSourceKind, RunMode};
use klokapp_bot::questions::{GeminiQuestions, GeminiSettings, QuestionSource, StaticQuestions};
use klokapp_bot::session::AccountSession;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/klokapp/config.toml")]
    config: String,
    /// Run a single sequential cycle over all wallets and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let config = KlokConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    let _log_guard = setup_logger(&config.files.log_dir, &config.files.log_file);

    info!("Loaded config from: {}", args.config);

    let manager = WalletManager::load(&config.files.private_keys)?;
    let proxies = ProxyManager::load_proxies(&config.files.proxies)?;
    if !proxies.is_empty() && proxies.len() < manager.count() {
        warn!(
            "Only {} proxies for {} wallets; proxies will be shared.",
            proxies.len(),
            manager.count()
        );
    }

    let run_mode = if args.once {
        RunMode::Sequential
    } else {
        config.session.run_mode
    };
    info!(
        "🤖 Klokapp bot | Wallets: {} | Proxies: {} | Mode: {:?}",
        manager.count(),
        proxies.len(),
        run_mode
    );

    let captcha = build_captcha(&config)?;
    let questions = build_questions(&config)?;

    let mut workers: Vec<Box<dyn Worker>> = Vec::with_capacity(manager.count());
    for (i, key) in manager.keys().iter().enumerate() {
        let credential = match Credential::from_raw(key) {
            Ok(c) => c,
            Err(e) => {
                error!("Skipping wallet {:03}: {}", i + 1, e);
                continue;
            }
        };

        let assigned = ProxyManager::assign(&proxies, i);
        let client = KlokClient::new(config.api_settings(), assigned.map(|(_, p)| p))
            .with_context(|| format!("Failed to build HTTP client for wallet {:03}", i + 1))?;
        let api: Arc<dyn KlokApi> = Arc::new(client);

        let mut session =
            AccountSession::new(i, credential, api, questions.clone(), config.loop_settings())
                .with_signin(config.signin_template());
        if let Some((proxy_index, proxy)) = assigned {
            info!("Assigned proxy {} to wallet {:03}", proxy.url, i + 1);
            session = session.with_proxy_index(proxy_index);
        }
        if let Some(provider) = &captcha {
            session = session.with_captcha(provider.clone());
        }
        workers.push(Box::new(session));
    }
    if workers.is_empty() {
        return Err(ConfigError::NoCredentials {
            path: config.files.private_keys.clone(),
        }
        .into());
    }

    let token = WorkerRunner::shutdown_token();
    match run_mode {
        RunMode::Concurrent => {
            WorkerRunner::run_concurrent(workers, token).await?;
        }
        RunMode::Sequential => {
            WorkerRunner::run_sequential(
                &mut workers,
                token,
                config.sequential_schedule(),
                args.once,
            )
            .await?;
        }
    }

    Ok(())
}

fn build_captcha(config: &KlokConfig) -> Result<Option<Arc<dyn CaptchaProvider>>> {
    let c = &config.captcha;
    let provider: Arc<dyn CaptchaProvider> = match c.provider {
        CaptchaProviderKind::None => return Ok(None),
        CaptchaProviderKind::Solver => {
            let settings = SolverSettings {
                base_url: c.solver_url.clone(),
                api_key: c.api_key.clone().unwrap_or_default(),
                task_type: c.task_type.clone(),
                website_url: c.website_url.clone(),
                website_key: c.website_key.clone(),
                page_action: c.page_action.clone(),
                enterprise: c.enterprise,
                poll_interval: Duration::from_millis(c.poll_interval_ms),
                max_attempts: c.max_attempts,
                request_timeout: Duration::from_secs(config.api.request_timeout_secs),
            };
            Arc::new(SolverCaptcha::capsolver(settings).context("Failed to build captcha solver")?)
        }
        CaptchaProviderKind::Browser => Arc::new(BrowserCaptcha::new(BrowserSettings {
            webdriver_url: c.webdriver_url.clone(),
            website_url: c.website_url.clone(),
            website_key: c.website_key.clone(),
            action: c.page_action.clone().unwrap_or_else(|| "login".to_string()),
            headless: c.headless,
            page_timeout: Duration::from_secs(c.page_timeout_secs),
        })),
    };
    info!("Captcha strategy: {}", provider.name());
    Ok(Some(provider))
}

fn build_questions(config: &KlokConfig) -> Result<Arc<dyn QuestionSource>> {
    let q = &config.questions;
    let source: Arc<dyn QuestionSource> = match q.source {
        QuestionSourceKind::Static => Arc::new(StaticQuestions::builtin()),
        QuestionSourceKind::File => Arc::new(StaticQuestions::from_file(&q.file)?),
        QuestionSourceKind::Gemini => Arc::new(GeminiQuestions::new(GeminiSettings {
            base_url: q.gemini_url.clone(),
            api_key: q.gemini_api_key.clone().unwrap_or_default(),
            model: q.gemini_model.clone(),
            prompt: q.prompt.clone(),
            fallback: q.fallback.clone(),
            request_delay: Duration::from_millis(q.request_delay_ms),
            request_timeout: Duration::from_secs(config.api.request_timeout_secs),
        })?),
    };
    Ok(source)
}
