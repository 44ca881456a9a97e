//! The closed error taxonomy for the wire layer.
use std::io;

/// Which of the parser's four phases produced a [`ParseError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParsePhase {
    /// Phase 0 — IRCv3 tag extraction.
    Tags,
    /// Phase 1 — prefix-less specials (PING, ERROR,...).
    PrefixlessSpecial,
    /// Phase 2 — prefix splitting.
    Prefix,
    /// Phase 3 — typestring / numeric lookup.
    Typestring,
    /// Phase 4 — per-kind specialization.
    Specialization,
}

/// Errors produced while turning a single line into an [`crate::event::Event`].
///
/// Every variant carries the original line so callers can log it without
/// threading it through separately.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A prefix-less line used a verb outside the closed Phase 1 set.
    #[error("unknown prefix-less type in {line:?}")]
    UnknownBasicType { line: String },

    /// The typestring token didn't match any known event kind.
    #[error("unknown typestring in {line:?}")]
    UnknownTypestring { line: String },

    /// CTCP framing was opened but never closed.
    #[error("unknown or malformed CTCP framing in {line:?}")]
    UnknownCTCP { line: String },

    /// A numeric token failed to parse as `u16`.
    #[error("bad numeric in {line:?}")]
    BadNumeric { line: String },

    /// A numeric mapped to `NUMERIC`/unset by the active daemon table and the
    /// generic fallback heuristic still couldn't make sense of it.
    #[error("uncaught numeric or unset mapping in {line:?}")]
    UncaughtNumericOrUnset { line: String },

    /// A `010 RPL_BOUNCE`-style connect suggestion was malformed.
    #[error("bad connect suggestion in {line:?}")]
    BadConnectSuggestion { line: String },
}

impl ParseError {
    /// The phase in which this error was raised.
    pub fn phase(&self) -> ParsePhase {
        match self {
            ParseError::UnknownBasicType {.. } => ParsePhase::PrefixlessSpecial,
            ParseError::UnknownTypestring {.. } => ParsePhase::Typestring,
            ParseError::UnknownCTCP {.. } => ParsePhase::Specialization,
            ParseError::BadNumeric {.. } => ParsePhase::Typestring,
            ParseError::UncaughtNumericOrUnset {.. } => ParsePhase::Typestring,
            ParseError::BadConnectSuggestion {.. } => ParsePhase::Specialization,
        }
    }

    /// The original line that failed to parse.
    pub fn line(&self) -> &str {
        match self {
            ParseError::UnknownBasicType { line }
            | ParseError::UnknownTypestring { line }
            | ParseError::UnknownCTCP { line }
            | ParseError::BadNumeric { line }
            | ParseError::UncaughtNumericOrUnset { line }
            | ParseError::BadConnectSuggestion { line } => line,
        }
    }
}

/// Errors raised by the line codec while framing raw bytes.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// A frame exceeded the hard 8192-byte limit (512 soft limit, extended
    /// for IRCv3 tags) before a terminating CRLF was seen.
    #[error("frame exceeded the {limit}-byte hard limit")]
    MalformedFrame {
        /// The limit that was exceeded.
        limit: usize,
    },

    /// The underlying transport failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised by the channel mode engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    /// A letter appeared before any `+`/`-` sign was seen.
    #[error("mode letter {letter:?} in {string:?} has no leading sign")]
    MissingSign { string: String, letter: char },

    /// A character other than `+`/`-` was used as a sign.
    #[error("invalid mode sign {sign:?} in {string:?}")]
    InvalidSign { string: String, sign: char },

    /// A letter that takes an argument ran out of arguments to consume.
    #[error("mode letter {letter:?} in {string:?} is missing its argument")]
    MissingArgument { string: String, letter: char },
}

/// A post-parse inconsistency that is logged but never stops dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanityWarning {
    /// A nickname contained whitespace.
    SpacedNickname { nickname: String },
    /// A channel argument was missing its leading prefix sign.
    UnsignedChannel { channel: String },
    /// A "nickname" began with a channel prefix sign.
    ChannelShapedNickname { nickname: String },
}
