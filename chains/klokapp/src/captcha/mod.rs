//! CAPTCHA acquisition strategies.
//!
//! Authentication only depends on [`CaptchaProvider`]. Which implementation
//! sits behind it (remote solver service or a local headless browser) is a
//! configuration choice.

pub mod browser;
pub mod solver;

pub use browser::{BrowserCaptcha, BrowserSettings};
pub use solver::{CapSolverClient, SolverBackend, SolverCaptcha, SolverSettings, TaskStatus};

use crate::api::CaptchaToken;
use crate::error::CaptchaError;
use async_trait::async_trait;

#[async_trait]
pub trait CaptchaProvider: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    async fn acquire(&self) -> Result<CaptchaToken, CaptchaError>;
}
