//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

pub(crate) mod logger;
pub(crate) mod proxy_manager;
pub(crate) mod runner;
pub(crate) mod schedule;
pub(crate) mod wallet_manager;

// Selective exports - only public utilities
pub use logger::{colorize_status, setup_logger};
pub use proxy_manager::ProxyManager;
pub use runner::{SequentialSchedule, WorkerRunner};
pub use schedule::{cycle_sleep, format_duration, sleep_or_cancel};
pub use wallet_manager::{RawKey, WalletManager};
