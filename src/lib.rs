//! A modular IRC client/bot framework core: the wire parser lives in
//! `tern-proto`; this crate is everything above it — state bookkeeping, the
//! plugin dispatcher, the throttled outbox, the connection supervisor, the
//! config bridge, and the CLI.

pub mod awareness;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logger;
pub mod message;
pub mod state;
pub mod supervisor;
pub mod throttle;
pub mod urls;

pub use error::{CoreError, Result};
