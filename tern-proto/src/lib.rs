//! The wire protocol: line framing, IRCv3 tags, prefix parsing, the numeric
//! `Response` table, the daemon overlay table, the channel-mode engine, the
//! shared data model, and the four-phase line parser.

#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod command;
pub mod daemon;
pub mod error;
pub mod event;
pub mod irc;
pub mod line;
pub mod mode;
pub mod model;
pub mod parser;
pub mod prefix;
pub mod response;
pub mod tags;

pub use self::casemap::CaseMapping;
pub use self::chan::ChannelExt;
pub use self::command::{CapSubCommand, Command};
pub use self::daemon::{Daemon, DaemonTable};
pub use self::event::{CtcpKind, Event, EventType};
pub use self::irc::{frame, IrcCodec, IrcTransport, Line};
pub use self::mode::{ChanModes, ModeEntry};
pub use self::model::{Bot, Channel, ChannelUser, Server, User};
pub use self::parser::parse;
pub use self::prefix::Prefix;
pub use self::response::Response;
