//! The canonical parse result.

use crate::model::User;
use crate::response::Response;

/// A CTCP subtype. `ACTION` never appears here:
/// it's special-cased into [`EventType::Emote`] before this enum is reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CtcpKind {
    Version,
    Time,
    Ping,
    ClientInfo,
    Source,
    Finger,
    /// Any CTCP command not named above, keyed by its verb.
    Other(String),
}

impl CtcpKind {
    /// Classifies a CTCP verb (the first word inside `\x01…\x01`).
    pub fn classify(verb: &str) -> CtcpKind {
        match verb.to_ascii_uppercase().as_str() {
            "VERSION" => CtcpKind::Version,
            "TIME" => CtcpKind::Time,
            "PING" => CtcpKind::Ping,
            "CLIENTINFO" => CtcpKind::ClientInfo,
            "SOURCE" => CtcpKind::Source,
            "FINGER" => CtcpKind::Finger,
            other => CtcpKind::Other(other.to_owned()),
        }
    }
}

/// The closed set of event kinds enumerates.
#[derive(Clone, Debug, PartialEq)]
pub enum EventType {
    Ping,
    Pong,
    Notice,

    Join,
    SelfJoin,
    Part,
    SelfPart,
    Quit,
    SelfQuit,
    Nick,
    SelfNick,

    /// A `PRIVMSG` to a channel.
    Chan,
    /// A `PRIVMSG` directly to the bot.
    Query,
    /// A CTCP `ACTION` (`/me does a thing`), regardless of target.
    Emote,
    /// A `PRIVMSG` to a channel, sent by the bot itself (echo-message).
    SelfChan,
    /// A `PRIVMSG` directly to a user, sent by the bot itself.
    SelfQuery,

    Mode,
    ChanMode,
    SelfMode,

    Kick,
    SelfKick,

    Invite,
    Error,

    HostStart,
    HostEnd,
    ClearChat,

    Cap,
    Ctcp(CtcpKind),

    SaslAuthenticate,
    /// `904`/`905`/`906`/`907` (ERR_SASLFAIL and friends).
    AuthFailure,
    /// `900` (RPL_LOGGEDIN).
    RplLoggedIn,

    /// A recognized numeric reply.
    Numeric(Response),
    /// A numeric the active daemon table has no mapping for (the generic
    /// `NUMERIC`/`UNSET` fall-back of ).
    Unset,
}

/// The canonical parse result: one populated [`Event`] per accepted line.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The event's kind.
    pub kind: EventType,
    /// The numeric code, `0` if this event didn't come from a numeric reply.
    pub num: u16,
    /// The message's sender, as resolved in Phase 2.
    pub sender: User,
    /// The user this event is directed at, when applicable (e.g. KICK's
    /// victim, WHOIS's subject).
    pub target: Option<User>,
    /// The channel this event concerns, when applicable.
    pub channel: Option<String>,
    /// The event's primary payload (message text, topic, mode string, …).
    pub content: String,
    /// A secondary string, meaning varies by event kind.
    pub aux: Option<String>,
    /// The raw, undecoded IRCv3 tag blob (decode on demand via [`crate::tags`]).
    pub tags: String,
    /// Wall-clock seconds at the time this event was parsed.
    pub time: u64,
    /// The original line, verbatim.
    pub raw: String,
}

impl Event {
    /// A minimal event builder, defaulting every field parsing doesn't fill
    /// in for a given kind.
    pub fn new(kind: EventType, raw: impl Into<String>, time: u64) -> Event {
        Event {
            kind,
            num: 0,
            sender: User::default(),
            target: None,
            channel: None,
            content: String::new(),
            aux: None,
            tags: String::new(),
            time,
            raw: raw.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_ctcp_verbs_case_insensitively() {
        assert_eq!(CtcpKind::classify("version"), CtcpKind::Version);
        assert_eq!(CtcpKind::classify("PING"), CtcpKind::Ping);
    }

    #[test]
    fn unknown_ctcp_verb_is_preserved() {
        assert_eq!(CtcpKind::classify("DCC"), CtcpKind::Other("DCC".to_owned()));
    }

    #[test]
    fn new_event_preserves_the_raw_line() {
        let event = Event::new(EventType::Ping, "PING:irc.example.net", 0);
        assert_eq!(event.raw, "PING:irc.example.net");
        assert_eq!(event.num, 0);
    }
}
