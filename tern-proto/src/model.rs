//! The shared data model: `Server`, `Bot`, `User`, `Channel`.

use std::collections::{HashMap, HashSet};

use crate::casemap::CaseMapping;
use crate::daemon::Daemon;
use crate::error::ModeError;
use crate::mode::{ChanModes, ModeEntry};

/// A mutable record describing the peer server.
///
/// Lifecycle: created at startup from config, mutated by the parser on
/// RPL_MYINFO (004) and RPL_ISUPPORT (005); `updated` signals the connection
/// supervisor to propagate changes to plugins.
#[derive(Clone, Debug, PartialEq)]
pub struct Server {
    /// The address as configured.
    pub address: String,
    /// The resolved address, filled in from the server's first greeting.
    pub resolved_address: Option<String>,
    /// The port connected to.
    pub port: u16,
    /// The network's self-reported name (e.g. "freenode", "Twitch").
    pub network: Option<String>,
    /// Which daemon (server software) this peer is running.
    pub daemon: Daemon,
    /// The daemon's self-reported version string.
    pub daemon_version: Option<String>,
    /// `NICKLEN`, from ISUPPORT.
    pub max_nickname_length: usize,
    /// `CHANNELLEN`, from ISUPPORT.
    pub max_channel_length: usize,
    /// The `CHANMODES` four-class descriptor.
    pub chanmodes: ChanModes,
    /// The `CHANTYPES` channel-prefix set.
    pub chantypes: String,
    /// The `CASEMAPPING` in effect for nickname/channel identity.
    pub casemapping: CaseMapping,
    /// Set whenever a mutator above changes this record.
    pub updated: bool,
}

impl Server {
    /// Creates a server record with RFC defaults, as it exists at startup
    /// before any 004/005 line has been seen.
    pub fn new(address: impl Into<String>, port: u16) -> Server {
        Server {
            address: address.into(),
            resolved_address: None,
            port,
            network: None,
            daemon: Daemon::Unknown,
            daemon_version: None,
            max_nickname_length: 9,
            max_channel_length: 200,
            chanmodes: ChanModes::default(),
            chantypes: crate::chan::DEFAULT_CHANTYPES.to_owned(),
            casemapping: CaseMapping::default(),
            updated: false,
        }
    }
}

/// The bot's own identity.
///
/// Invariant: `nickname` is the single source of truth for SELF-kind event
/// classification; a successful self-NICK must update it before the event
/// carrying it is dispatched.
#[derive(Clone, Debug, PartialEq)]
pub struct Bot {
    /// Current nickname.
    pub nickname: String,
    /// The `USER` ident field.
    pub user: String,
    /// The `USER` real-name field.
    pub real_name: String,
    /// Services account login, if configured.
    pub account: Option<String>,
    /// Services account password, if configured.
    pub account_password: Option<String>,
    /// Server registration (`PASS`) password, if configured.
    pub password: Option<String>,
    /// Account names with administrative privilege.
    pub admins: HashSet<String>,
    /// Channels the bot actively operates (vs. passively idles in).
    pub home_channels: HashSet<String>,
    /// Channels the bot passively idles in.
    pub guest_channels: HashSet<String>,
    /// The server this bot is (or will be) connected to.
    pub server: Server,
    /// Set whenever a mutator above changes this record.
    pub updated: bool,
}

impl Bot {
    /// Creates a bot identity with no channels or admins configured yet.
    pub fn new(nickname: impl Into<String>, user: impl Into<String>, real_name: impl Into<String>, server: Server) -> Bot {
        Bot {
            nickname: nickname.into(),
            user: user.into(),
            real_name: real_name.into(),
            account: None,
            account_password: None,
            password: None,
            admins: HashSet::new(),
            home_channels: HashSet::new(),
            guest_channels: HashSet::new(),
            server,
            updated: false,
        }
    }

    /// Applies a successful self-NICK. Must run before the event carrying it
    /// is dispatched.
    pub fn apply_self_nick(&mut self, new_nickname: impl Into<String>) {
        self.nickname = new_nickname.into();
        self.updated = true;
    }

    /// Whether `account` has administrative privilege.
    pub fn is_admin(&self, account: &str) -> bool {
        self.admins.contains(account)
    }
}

/// A known IRC user.
///
/// Identity key is the nickname, case-insensitive per the server's
/// CASEMAPPING. `special` means "this is a server or services bot" and is
/// never set from untrusted input directly — it's derived during parsing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct User {
    /// The user's current nickname.
    pub nickname: String,
    /// The user's ident (sometimes prefixed with `~` for no-identd).
    pub ident: String,
    /// The user's host/address.
    pub address: String,
    /// The user's services account, if known.
    pub account: Option<String>,
    /// Whether this user is a server or services bot.
    pub special: bool,
}

impl User {
    /// Builds a bare user record from just a nickname (e.g. for PING, which
    /// has no real sender).
    pub fn bare(nickname: impl Into<String>) -> User {
        User {
            nickname: nickname.into(),
            ..User::default()
        }
    }

    /// The case-folded identity key used for roster/user-cache lookups.
    pub fn identity_key(&self, casemapping: CaseMapping) -> String {
        casemapping.fold(&self.nickname)
    }
}

/// A user's membership in one channel: the user plus their prefix-sign set
/// (e.g. `@`, `+`) in that channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelUser {
    /// The underlying user record.
    pub user: User,
    /// Status-prefix signs held in this channel, e.g. `['@']` for an op.
    pub prefixes: Vec<char>,
}

/// Channel state: roster, topic, and the two mode representations.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// The channel's name, including its prefix sign.
    pub name: String,
    /// The current topic, if known.
    pub topic: Option<String>,
    /// Roster, keyed by case-folded nickname.
    pub users: HashMap<String, ChannelUser>,
    /// Dataless flag modes currently set (e.g. `n`, `t`, `s`).
    pub modechars: Vec<char>,
    /// Data-bearing and list-class mode entries (bans, keys, limits, …).
    pub modes: Vec<ModeEntry>,
}

impl Channel {
    /// Creates an empty channel record.
    pub fn new(name: impl Into<String>) -> Channel {
        Channel {
            name: name.into(),
            topic: None,
            users: HashMap::new(),
            modechars: Vec::new(),
            modes: Vec::new(),
        }
    }

    /// Applies a signed mode string to this channel.
    pub fn set_mode(&mut self, chan_modes: &ChanModes, signed: &str, data: &str) -> Result<(), ModeError> {
        crate::mode::apply(&mut self.modechars, &mut self.modes, chan_modes, signed, data)
    }

    /// Inserts or updates a roster entry, keyed by the given casemapping.
    pub fn upsert_user(&mut self, user: User, casemapping: CaseMapping) {
        let key = user.identity_key(casemapping);
        self.users
        .entry(key)
        .and_modify(|existing| existing.user = user.clone())
        .or_insert(ChannelUser {
                user,
                prefixes: Vec::new(),
        });
    }

    /// Removes a roster entry (e.g. on PART/QUIT/KICK), keyed by the given
    /// casemapping.
    pub fn remove_user(&mut self, nickname: &str, casemapping: CaseMapping) -> Option<ChannelUser> {
        self.users.remove(&casemapping.fold(nickname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_nick_marks_bot_updated() {
        let mut bot = Bot::new("kameloso", "kameloso", "kameloso", Server::new("irc.example.net", 6667));
        assert!(!bot.updated);
        bot.apply_self_nick("kameloso^");
        assert_eq!(bot.nickname, "kameloso^");
        assert!(bot.updated);
    }

    #[test]
    fn dataless_mode_round_trips() {
        // Testable property: setMode(+X, "") then setMode(-X, "") restores modechars.
        let mut chan = Channel::new("#flerrp");
        let chan_modes = ChanModes::default();
        let before = chan.modechars.clone();
        chan.set_mode(&chan_modes, "+nt", "").unwrap();
        chan.set_mode(&chan_modes, "-nt", "").unwrap();
        assert_eq!(chan.modechars, before);
    }

    #[test]
    fn ban_round_trip_leaves_no_matching_entry() {
        let mut chan = Channel::new("#flerrp");
        let chan_modes = ChanModes::default();
        chan.set_mode(&chan_modes, "+b", "zorael!*@*").unwrap();
        chan.set_mode(&chan_modes, "-b", "zorael!*@*").unwrap();
        assert!(!chan.modes.iter().any(|m| m.letter == 'b' && m.data.as_deref() == Some("zorael!*@*")));
    }

    #[test]
    fn roster_upsert_and_remove_use_casemapping() {
        let mut chan = Channel::new("#flerrp");
        chan.upsert_user(User::bare("Zorael"), CaseMapping::Rfc1459);
        assert!(chan.users.contains_key("zorael"));
        chan.remove_user("zOrAeL", CaseMapping::Rfc1459);
        assert!(chan.users.is_empty());
    }

    #[test]
    fn is_admin_checks_account_set() {
        let mut bot = Bot::new("kameloso", "kameloso", "kameloso", Server::new("irc.example.net", 6667));
        bot.admins.insert("zorael".to_owned());
        assert!(bot.is_admin("zorael"));
        assert!(!bot.is_admin("hirr"));
    }
}
