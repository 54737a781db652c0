pub mod account;
pub mod state;

pub use account::{AccountSession, REPLY_PREVIEW_CHARS};
pub use state::{IdlePolicy, LoopSettings, Session, SessionState};
