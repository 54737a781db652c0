use super::CaptchaProvider;
use crate::api::CaptchaToken;
use crate::error::CaptchaError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thirtyfour::prelude::*;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub website_url: String,
    pub website_key: String,
    pub action: String,
    pub headless: bool,
    pub page_timeout: Duration,
}

// Loads the enterprise script on demand, then resolves with the token or
// `{error}`. The async-script callback is always the last argument.
const EXECUTE_RECAPTCHA: &str = r#"
const siteKey = arguments[0];
const action = arguments[1];
const done = arguments[arguments.length - 1];
const run = () => {
    grecaptcha.enterprise.ready(() => {
        grecaptcha.enterprise.execute(siteKey, { action: action })
            .then((token) => done(token))
            .catch((err) => done({ error: String(err) }));
    });
};
if (window.grecaptcha && window.grecaptcha.enterprise) {
    run();
} else {
    const script = document.createElement('script');
    script.src = 'https://www.google.com/recaptcha/enterprise.js?render=' + siteKey;
    script.onload = run;
    script.onerror = () => done({ error: 'failed to load recaptcha script' });
    document.head.appendChild(script);
}
"#;

/// Local strategy: drives a headless Chrome through a WebDriver endpoint
/// and executes reCAPTCHA Enterprise inside the real page.
pub struct BrowserCaptcha {
    settings: BrowserSettings,
}

impl BrowserCaptcha {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn open(&self) -> Result<WebDriver, CaptchaError> {
        let mut caps = DesiredCapabilities::chrome();
        let mut args = vec!["--no-sandbox", "--disable-gpu", "--lang=en-US"];
        if self.settings.headless {
            args.push("--headless=new");
            args.push("--window-size=1920,1080");
        }
        for arg in args {
            caps.add_arg(arg).map_err(browser_err)?;
        }

        WebDriver::new(self.settings.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| {
                CaptchaError::Browser(format!(
                    "cannot reach WebDriver at {}: {}",
                    self.settings.webdriver_url, e
                ))
            })
    }

    async fn token_from_page(&self, driver: &WebDriver) -> Result<CaptchaToken, CaptchaError> {
        driver
            .goto(self.settings.website_url.as_str())
            .await
            .map_err(browser_err)?;

        let ret = driver
            .execute_async(
                EXECUTE_RECAPTCHA,
                vec![json!(self.settings.website_key), json!(self.settings.action)],
            )
            .await
            .map_err(browser_err)?;

        token_from_script(ret.json())
    }
}

fn browser_err(err: WebDriverError) -> CaptchaError {
    CaptchaError::Browser(err.to_string())
}

fn token_from_script(value: &Value) -> Result<CaptchaToken, CaptchaError> {
    match value {
        Value::String(token) if !token.is_empty() => Ok(CaptchaToken::new(token.clone())),
        Value::Object(obj) => Err(CaptchaError::Browser(
            obj.get("error")
                .and_then(Value::as_str)
                .unwrap_or("script returned an object without a token")
                .to_string(),
        )),
        other => Err(CaptchaError::Browser(format!(
            "unexpected script result: {}",
            other
        ))),
    }
}

#[async_trait]
impl CaptchaProvider for BrowserCaptcha {
    fn name(&self) -> &str {
        "browser"
    }

    async fn acquire(&self) -> Result<CaptchaToken, CaptchaError> {
        let driver = self.open().await?;
        info!("🌐 Browser opened, executing reCAPTCHA on {}", self.settings.website_url);

        let outcome =
            match tokio::time::timeout(self.settings.page_timeout, self.token_from_page(&driver))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(CaptchaError::Browser(format!(
                    "page timed out after {}s",
                    self.settings.page_timeout.as_secs()
                ))),
            };

        if let Err(e) = driver.quit().await {
            warn!("Failed to close browser session: {}", e);
        }
        outcome
    }
}
