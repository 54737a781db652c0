//! # Core Logic - Shared Utilities for Account Bots
//!
//! This crate provides the target-independent plumbing every bot in the
//! workspace builds on: key and proxy loading, logging, the worker trait and
//! the runner that drives workers until shutdown.
//!
//! ## Modules
//!
//! - [`config`] - Proxy descriptor shared by loaders and HTTP clients
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - The [`Worker`] trait
//! - `utils` - Wallet/proxy loading, logger, runner, cancellable sleeps

pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

pub use config::ProxyConfig;
pub use error::{ConfigError, WalletError};
pub use traits::{Worker, WorkerStats};

pub use utils::{
    colorize_status, cycle_sleep, format_duration, setup_logger, sleep_or_cancel, ProxyManager,
    RawKey, SequentialSchedule, WalletManager, WorkerRunner,
};
