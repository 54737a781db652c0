//! # Klokapp Bot
//!
//! Signs in to the Klokapp chat service with Ethereum wallets and spends
//! each account's daily message quota.
//!
//! - [`auth`] - credentials and the sign-in message
//! - [`api`] - HTTP client, request/response shapes, quota parsing
//! - [`captcha`] - solver-service and headless-browser CAPTCHA strategies
//! - [`questions`] - static, file-backed and generated questions
//! - [`session`] - the per-account state machine
//! - [`config`] - layered TOML + environment configuration

pub mod api;
pub mod auth;
pub mod captcha;
pub mod config;
pub mod error;
pub mod questions;
pub mod session;

pub use error::{AuthError, CaptchaError, KlokError};
