//! The closed error taxonomy for everything above the wire layer.

use std::io;

/// Errors raised while loading or writing the config bridge.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file couldn't be read or written.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A `[Section]` line or `key value` pair didn't parse.
    #[error("malformed config at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// A required value (nickname, server address) was missing after the
    /// defaults → file → CLI meld.
    #[error("missing required config value: {field}")]
    MissingField { field: &'static str },

    /// `--writeconfig` was asked to persist a bot with no admins and no
    /// home channels.
    #[error("refusing to write an incomplete config: no admins and no home channels")]
    Incomplete,
}

/// Errors raised while parsing the command line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// A flag that isn't in the closed set this CLI recognizes.
    #[error("unrecognized flag: {0}")]
    UnknownFlag(String),

    /// A flag that takes a value wasn't given one.
    #[error("flag {0} requires a value")]
    MissingValue(String),

    /// `--set` wasn't given a `plugin.option=value` triple.
    #[error("--set expects plugin.option=value, got {0:?}")]
    MalformedSet(String),

    /// A numeric flag (`--port`) didn't parse as one.
    #[error("flag {flag} expects a number, got {value:?}")]
    NotANumber { flag: String, value: String },
}

/// Everything above the wire layer that isn't already owned by `tern_proto::error`.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// The connection supervisor's socket failed. Surfaced to the dispatch
    /// stream as a synthetic `Error` event before a reconnect is attempted.
    #[error("socket error: {0}")]
    Socket(#[from] io::Error),

    /// The config bridge failed to load or save.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A plugin's `teardown()` panicked or returned an error. Caught,
    /// logged, never propagated.
    #[error("plugin {plugin} failed to tear down: {reason}")]
    PluginTeardownFailure { plugin: String, reason: String },

    /// A plugin's handler panicked or returned an error while processing an
    /// event. Caught, logged with event context, dispatch continues to the
    /// next handler.
    #[error("plugin {plugin} handler failed on {event}: {reason}")]
    PluginHandlerFailure {
        plugin: String,
        event: String,
        reason: String,
    },

    /// The wire layer rejected a line outright.
    #[error(transparent)]
    Frame(#[from] tern_proto::error::FrameError),

    /// The command line didn't parse.
    #[error(transparent)]
    Cli(#[from] CliError),
}

/// Convenience alias used throughout the root crate.
pub type Result<T> = std::result::Result<T, CoreError>;
