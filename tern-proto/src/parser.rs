//! The four-phase line parser: turns one raw IRC line into an
//! [`Event`], consulting and mutating [`Bot`]/[`DaemonTable`] as the line
//! demands (self-NICK, MYINFO, ISUPPORT).

use crate::chan::ChannelExt;
use crate::daemon::{Daemon, DaemonTable};
use crate::error::{ParseError, SanityWarning};
use crate::event::{CtcpKind, Event, EventType};
use crate::model::{Bot, User};
use crate::prefix::Prefix;

const CTCP_DELIM: char = '\u{1}';

const KNOWN_SERVICES: &[&str] = &[
    "nickserv", "chanserv", "operserv", "global", "memoserv", "hostserv", "botserv", "infoserv", "alis",
];

/// Parses `line` into an [`Event`], along with any non-fatal sanity warnings.
///
/// Mutates `bot` and `table` in place for anything the line itself carries
/// (a self-NICK, a daemon identification on MYINFO, ISUPPORT caps) — per the
/// ordering invariant, these mutations land before the returned `Event` is
/// handed to the caller for dispatch.
pub fn parse(line: &str, bot: &mut Bot, table: &mut DaemonTable, time: u64) -> Result<(Event, Vec<SanityWarning>), ParseError> {
    let raw = line;

    // Phase 0: tag extraction.
    let (tags, rest) = match line.strip_prefix('@') {
        Some(after_at) => {
            let (tag_tok, remainder) = split_first(after_at);
            (tag_tok.to_owned(), remainder)
        }
        None => (String::new(), line),
    };

    let mut event = if let Some(after_colon) = rest.strip_prefix(':') {
        let (prefix_tok, remainder) = split_first(after_colon);
        let sender = parse_prefix(prefix_tok, bot);
        parse_typed(remainder, sender, bot, table, raw, time)?
    } else {
        parse_prefixless(rest, raw, time)?
    };

    event.tags = tags;
    let warnings = sanity_check(&event, bot);
    Ok((event, warnings))
}

fn split_first(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(' ') {
        Some(sp) => (&s[..sp], s[sp + 1..].trim_start()),
        None => (s, ""),
    }
}

fn strip_leading_colon(s: &str) -> &str {
    s.strip_prefix(':').unwrap_or(s)
}

/// Splits an IRC parameter string into tokens, honoring the trailing
/// `:`-prefixed parameter that consumes the rest of the line verbatim.
fn split_params(s: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut rest = s.trim_start();
    loop {
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_owned());
            break;
        }
        match rest.find(' ') {
            Some(sp) => {
                params.push(rest[..sp].to_owned());
                rest = rest[sp + 1..].trim_start();
            }
            None => {
                params.push(rest.to_owned());
                break;
            }
        }
    }
    params
}

// --- Phase 1: prefix-less specials -----------------------------------------

fn parse_prefixless(rest: &str, raw: &str, time: u64) -> Result<Event, ParseError> {
    let (verb, remainder) = split_first(rest);
    let verb_upper = verb.to_ascii_uppercase();

    let kind = match verb_upper.as_str() {
        "PING" => EventType::Ping,
        "PONG" => EventType::Pong,
        "ERROR" => EventType::Error,
        "NOTICE" => EventType::Notice,
        "AUTHENTICATE" => EventType::SaslAuthenticate,
        _ => return Err(ParseError::UnknownBasicType { line: raw.to_owned() }),
    };

    let mut event = Event::new(kind.clone(), raw, time);
    event.sender = User { special: true,..User::default() };

    match kind {
        EventType::Ping | EventType::Pong => {
            let content = strip_leading_colon(remainder).to_owned();
            event.sender.address = content.clone();
            event.content = content;
        }
        EventType::Notice => {
            // "NOTICE AUTH :text" and plain "NOTICE <target> :text" are
            // unified: whichever target token arrives is kept as `aux`.
            let (target, text) = split_first(remainder);
            event.aux = Some(target.to_owned());
            event.content = strip_leading_colon(text).to_owned();
        }
        _ => {
            event.content = strip_leading_colon(remainder).to_owned();
        }
    }

    Ok(event)
}

// --- Phase 2: prefix ---------------------------------------------------------

fn parse_prefix(prefix_tok: &str, bot: &Bot) -> User {
    // Rule 3 of fires on two literal historical prefixes that lack a
    // `!`, which `Prefix::parse` would otherwise read as a bare server name.
    let mut sender = match prefix_tok {
        "Q@CServe.quakenet.org" => User {
            nickname: "Q".to_owned(),
            ident: String::new(),
            address: "CServe.quakenet.org".to_owned(),
            account: None,
            special: true,
        },
        "AuthServ@Services.GameSurge.net" => User {
            nickname: "AuthServ".to_owned(),
            ident: String::new(),
            address: "Services.GameSurge.net".to_owned(),
            account: None,
            special: true,
        },
        _ => match Prefix::parse(prefix_tok) {
            Prefix::ServerName(name) => User {
                nickname: String::new(),
                ident: String::new(),
                address: name,
                account: None,
                special: true,
            },
            Prefix::Nickname { nickname, ident, address } => User {
                nickname,
                ident,
                address,
                account: None,
                special: false,
            },
        },
    };

    sender.special = sender.special || is_services(&sender, bot);
    sender
}

///: the ordered is-services test.
fn is_services(sender: &User, bot: &Bot) -> bool {
    if sender.special {
        return true;
    }
    if sender.nickname.is_empty()
    || sender.address == bot.server.address
    || bot.server.resolved_address.as_deref() == Some(sender.address.as_str())
    || sender.address.contains("services.")
    {
        return true;
    }
    if KNOWN_SERVICES.contains(&sender.nickname.to_ascii_lowercase().as_str()) {
        return true;
    }
    if bot.server.daemon != Daemon::Twitch {
        let shared_main = shared_domain_labels(&sender.address, &bot.server.address);
        let shared_resolved = bot
        .server
        .resolved_address
        .as_deref()
        .map(|a| shared_domain_labels(&sender.address, a))
        .unwrap_or(0);
        if shared_main.max(shared_resolved) >= 2 {
            return true;
        }
    }
    if sender.address.contains("/staff/") {
        return true;
    }
    false
}

fn shared_domain_labels(a: &str, b: &str) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a_labels: Vec<&str> = a.rsplit('.').collect();
    let b_labels: Vec<&str> = b.rsplit('.').collect();
    a_labels
    .iter()
    .zip(b_labels.iter())
    .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
    .count()
}

// --- Phase 3/4: typestring + specialization ---------------------------------

fn parse_typed(remainder: &str, sender: User, bot: &mut Bot, table: &mut DaemonTable, raw: &str, time: u64) -> Result<Event, ParseError> {
    let (typestring, params_str) = split_first(remainder);

    if typestring.chars().all(|c| c.is_ascii_digit()) && !typestring.is_empty() {
        return parse_numeric(typestring, params_str, sender, bot, table, raw, time);
    }

    parse_verb(&typestring.to_ascii_uppercase(), params_str, sender, bot, raw, time)
}

fn parse_numeric(
    typestring: &str,
    params_str: &str,
    sender: User,
    bot: &mut Bot,
    table: &mut DaemonTable,
    raw: &str,
    time: u64,
) -> Result<Event, ParseError> {
    let num: u16 = typestring.parse().map_err(|_| ParseError::BadNumeric { line: raw.to_owned() })?;

    let kind = match table.lookup(num) {
        Some(resp) => EventType::Numeric(resp),
        None => EventType::Unset,
    };

    let mut event = Event::new(kind, raw, time);
    event.num = num;
    event.sender = sender;

    let params = split_params(params_str);

    match num {
        4 => specialize_myinfo(&mut event, &params, bot),
        5 => specialize_isupport(&mut event, &params, bot),
        10 => specialize_bounce(&mut event, &params, raw)?,
        330 => specialize_whoisaccount(&mut event, &params, bot),
        900 => specialize_sasl_status(&mut event, &params, EventType::RplLoggedIn),
        904 | 905 | 906 | 907 => specialize_sasl_status(&mut event, &params, EventType::AuthFailure),
        _ => {
            let (channel, content) = generic_fallback(bot, params);
            event.channel = channel;
            event.content = content;
        }
    }

    Ok(event)
}

fn specialize_myinfo(event: &mut Event, params: &[String], bot: &mut Bot) {
    // "<nick> <servername> <version> <usermodes> <channelmodes> [...]"
    let servername = params.get(1).map(String::as_str).unwrap_or("");
    let version = params.get(2).map(String::as_str).unwrap_or("");
    let daemon = Daemon::identify(&format!("{} {}", servername, version));
    bot.server.daemon = daemon;
    bot.server.daemon_version = Some(version.to_owned());
    bot.server.updated = true;
    event.content = params.join(" ");
}

fn specialize_isupport(event: &mut Event, params: &[String], bot: &mut Bot) {
    // "<nick> KEY=VALUE...:are supported by this server"
    let body: &[String] = if params.len() >= 2 { &params[1..params.len() - 1] } else { &[] };
    for pair in body {
        let Some(eq) = pair.find('=') else { continue };
        let (key, value) = (&pair[..eq], &pair[eq + 1..]);
        match key {
            "CHANTYPES" => bot.server.chantypes = value.to_owned(),
            "CHANMODES" => bot.server.chanmodes = crate::mode::ChanModes::parse(value),
            "NETWORK" => bot.server.network = Some(value.to_owned()),
            "NICKLEN" => {
                if let Ok(n) = value.parse() {
                    bot.server.max_nickname_length = n;
                }
            }
            "CHANNELLEN" => {
                if let Ok(n) = value.parse() {
                    bot.server.max_channel_length = n;
                }
            }
            _ => {}
        }
    }
    bot.server.updated = true;
    event.content = params.join(" ");
}

fn specialize_whoisaccount(event: &mut Event, params: &[String], bot: &Bot) {
    // "<mynick> <nickname> <account> :is logged in as" — strip our own nick,
    // then the account (not the trailing prose) is the canonical content.
    let rest: &[String] = if params.first().map(|p| bot.server.casemapping.eq(p, &bot.nickname)).unwrap_or(false) {
        &params[1..]
    } else {
        params
    };
    let nickname = rest.first().cloned().unwrap_or_default();
    let account = rest.get(1).cloned().unwrap_or_default();
    event.target = Some(User { nickname, account: Some(account.clone()),..User::default() });
    event.content = account;
}

/// Shared shape for the SASL-outcome numerics (900, 904-907): first param is
/// the bot's own nick, the rest is human-readable prose.
fn specialize_sasl_status(event: &mut Event, params: &[String], kind: EventType) {
    event.kind = kind;
    event.content = params.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
}

fn specialize_bounce(event: &mut Event, params: &[String], raw: &str) -> Result<(), ParseError> {
    let text = params.last().cloned().unwrap_or_default();
    if !text.to_ascii_lowercase().contains("server") || !text.to_ascii_lowercase().contains("port") {
        return Err(ParseError::BadConnectSuggestion { line: raw.to_owned() });
    }
    event.content = text;
    Ok(())
}

/// Phase 4's generic fallback: strips a leading self-nick target, then
/// treats the next token as a channel if it carries a channel-prefix sign.
fn generic_fallback(bot: &Bot, mut params: Vec<String>) -> (Option<String>, String) {
    if params.first().map(|p| bot.server.casemapping.eq(p, &bot.nickname)).unwrap_or(false) {
        params.remove(0);
    }
    let channel = params.first().filter(|p| p.as_str().is_channel_name_for(&bot.server.chantypes)).cloned();
    let content = if channel.is_some() { params[1..].join(" ") } else { params.join(" ") };
    (channel, content)
}

fn parse_verb(verb: &str, params_str: &str, sender: User, bot: &mut Bot, raw: &str, time: u64) -> Result<Event, ParseError> {
    let casemapping = bot.server.casemapping;
    let my_nick = bot.nickname.clone();
    let is_self = |nick: &str| casemapping.eq(nick, &my_nick);
    let params = split_params(params_str);

    let mut event = match verb {
        "PING" => prefixless_shaped(EventType::Ping, raw, time, sender, params_str),
        "PONG" => prefixless_shaped(EventType::Pong, raw, time, sender, params_str),
        "ERROR" => prefixless_shaped(EventType::Error, raw, time, sender, params_str),

        "JOIN" => {
            let channel = params.first().cloned();
            let kind = if is_self(&sender.nickname) { EventType::SelfJoin } else { EventType::Join };
            let mut event = Event::new(kind, raw, time);
            event.sender = sender;
            event.channel = channel;
            if let Some(account) = params.get(1) {
                event.sender.account = Some(account.clone());
            }
            if let Some(realname) = params.get(2) {
                event.content = realname.clone();
            }
            event
        }

        "PART" => {
            let kind = if is_self(&sender.nickname) { EventType::SelfPart } else { EventType::Part };
            let mut event = Event::new(kind, raw, time);
            event.channel = params.first().cloned();
            event.content = params.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
            event.sender = sender;
            event
        }

        "QUIT" => {
            let kind = if is_self(&sender.nickname) { EventType::SelfQuit } else { EventType::Quit };
            let mut event = Event::new(kind, raw, time);
            event.content = params.join(" ");
            event.sender = sender;
            event
        }

        "NICK" => {
            let new_nick = params.first().cloned().unwrap_or_default();
            let self_nick = is_self(&sender.nickname);
            if self_nick {
                bot.apply_self_nick(new_nick.clone());
            }
            let kind = if self_nick { EventType::SelfNick } else { EventType::Nick };
            let mut event = Event::new(kind, raw, time);
            event.target = Some(User::bare(new_nick.clone()));
            event.content = new_nick;
            event.sender = sender;
            event
        }

        "KICK" => {
            let channel = params.first().cloned();
            let victim = params.get(1).cloned().unwrap_or_default();
            let kind = if is_self(&victim) { EventType::SelfKick } else { EventType::Kick };
            let mut event = Event::new(kind, raw, time);
            event.channel = channel;
            event.target = Some(User::bare(victim));
            event.content = params.get(2).cloned().unwrap_or_default();
            event.sender = sender;
            event
        }

        "INVITE" => {
            let mut event = Event::new(EventType::Invite, raw, time);
            event.target = params.first().cloned().map(User::bare);
            event.channel = params.get(1).cloned();
            event.sender = sender;
            event
        }

        "PRIVMSG" | "NOTICE" => specialize_privmsg(verb, &params, sender, &bot.server.chantypes, &is_self, raw, time)?,

        "MODE" => {
            let target = params.first().cloned().unwrap_or_default();
            let signed = params.get(1).cloned().unwrap_or_default();
            let data = params.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
            let is_channel = target.as_str().is_channel_name_for(&bot.server.chantypes);
            let kind = if is_channel {
                EventType::ChanMode
            } else if is_self(&target) {
                EventType::SelfMode
            } else {
                EventType::Mode
            };
            let mut event = Event::new(kind, raw, time);
            if is_channel {
                event.channel = Some(target);
            } else {
                event.target = Some(User::bare(target));
            }
            event.content = signed;
            event.aux = Some(data);
            event.sender = sender;
            event
        }

        "CAP" => {
            let mut event = Event::new(EventType::Cap, raw, time);
            event.aux = params.get(1).cloned();
            event.content = params.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
            event.sender = sender;
            event
        }

        "HOSTTARGET" => {
            let channel = params.first().cloned();
            let content = params.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
            let kind = if content.trim_start().starts_with('-') { EventType::HostEnd } else { EventType::HostStart };
            let mut event = Event::new(kind, raw, time);
            event.channel = channel;
            event.content = content;
            event.sender = sender;
            event
        }

        "CLEARCHAT" => {
            let mut event = Event::new(EventType::ClearChat, raw, time);
            event.channel = params.first().cloned();
            event.content = params.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
            event.sender = sender;
            event
        }

        _ => return Err(ParseError::UnknownTypestring { line: raw.to_owned() }),
    };

    event.num = 0;
    Ok(event)
}

fn prefixless_shaped(kind: EventType, raw: &str, time: u64, sender: User, params_str: &str) -> Event {
    let mut event = Event::new(kind, raw, time);
    event.content = strip_leading_colon(params_str).to_owned();
    event.sender = sender;
    event
}

fn specialize_privmsg(
    verb: &str,
    params: &[String],
    sender: User,
    chantypes: &str,
    is_self: &dyn Fn(&str) -> bool,
    raw: &str,
    time: u64,
) -> Result<Event, ParseError> {
    let target = params.first().cloned().unwrap_or_default();
    let text = params.get(1).cloned().unwrap_or_default();
    let is_notice = verb == "NOTICE";
    let is_channel = target.as_str().is_channel_name_for(chantypes);

    if text.starts_with(CTCP_DELIM) {
        if !text.ends_with(CTCP_DELIM) || text.len() < 2 {
            return Err(ParseError::UnknownCTCP { line: raw.to_owned() });
        }
        let inner = &text[1..text.len() - 1];
        let (ctcp_verb, ctcp_content) = split_first(inner);

        let kind = if ctcp_verb.eq_ignore_ascii_case("ACTION") { EventType::Emote } else { EventType::Ctcp(CtcpKind::classify(ctcp_verb)) };

        let mut event = Event::new(kind, raw, time);
        event.content = ctcp_content.to_owned();
        event.sender = sender;
        if is_channel {
            event.channel = Some(target);
        } else {
            event.target = Some(User::bare(target));
        }
        return Ok(event);
    }

    let kind = if is_notice {
        EventType::Notice
    } else if is_channel {
        if is_self(&sender.nickname) { EventType::SelfChan } else { EventType::Chan }
    } else if is_self(&sender.nickname) {
        EventType::SelfQuery
    } else {
        EventType::Query
    };

    let mut event = Event::new(kind, raw, time);
    event.content = text;
    event.sender = sender;
    if is_channel {
        event.channel = Some(target);
    } else {
        event.target = Some(User::bare(target));
    }
    Ok(event)
}

// --- Post-parse sanity check --------------------------------------------------

fn sanity_check(event: &Event, bot: &Bot) -> Vec<SanityWarning> {
    let mut warnings = Vec::new();

    if event.sender.nickname.contains(' ') {
        warnings.push(SanityWarning::SpacedNickname { nickname: event.sender.nickname.clone() });
    }
    if !event.sender.nickname.is_empty() && event.sender.nickname.as_str().is_channel_name_for(&bot.server.chantypes) {
        warnings.push(SanityWarning::ChannelShapedNickname { nickname: event.sender.nickname.clone() });
    }
    if let Some(channel) = &event.channel {
        if !channel.as_str().is_channel_name_for(&bot.server.chantypes) {
            warnings.push(SanityWarning::UnsignedChannel { channel: channel.clone() });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Server;
    use crate::response::Response;

    fn test_bot() -> Bot {
        Bot::new("kameloso", "kameloso", "kameloso", Server::new("tepper.freenode.net", 6667))
    }

    // `privmsg_to_channel_is_parsed`, `bare_ping_is_parsed`, and
    // `whoisaccount_numeric_fills_target_account` live in
    // `tern-proto/tests/parser_scenarios.rs` as crate-level integration tests.

    #[test]
    fn raw_is_preserved_verbatim() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":a!b@c JOIN #chan";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.raw, line);
    }

    #[test]
    fn self_join_is_detected() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":kameloso!~NaN@asdf JOIN #flerrp";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.kind, EventType::SelfJoin);
    }

    #[test]
    fn self_nick_updates_bot_before_returning() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":kameloso!~NaN@asdf NICK :kameloso^";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.kind, EventType::SelfNick);
        assert_eq!(bot.nickname, "kameloso^");
        assert_eq!(event.target.unwrap().nickname, "kameloso^");
    }

    #[test]
    fn ctcp_action_becomes_emote() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":zorael!~NaN@asdf PRIVMSG #flerrp :\u{1}ACTION waves\u{1}";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.kind, EventType::Emote);
        assert_eq!(event.content, "waves");
    }

    #[test]
    fn ctcp_version_is_classified() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":zorael!~NaN@asdf PRIVMSG kameloso :\u{1}VERSION\u{1}";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.kind, EventType::Ctcp(CtcpKind::Version));
    }

    #[test]
    fn unterminated_ctcp_is_an_error() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":zorael!~NaN@asdf PRIVMSG #flerrp :\u{1}ACTION waves";
        assert!(matches!(parse(line, &mut bot, &mut table, 0), Err(ParseError::UnknownCTCP {.. })));
    }

    #[test]
    fn myinfo_identifies_daemon() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":tepper.freenode.net 004 kameloso tepper.freenode.net charybdis-4.1.2 DOQRSZaghilopswz CFILMPQSTbcefgijklmnopqrstvz";
        let (_event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(bot.server.daemon, Daemon::Charybdis);
        assert!(bot.server.updated);
    }

    #[test]
    fn loggedin_numeric_becomes_rpl_logged_in() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":tepper.freenode.net 900 kameloso kameloso!~NaN@asdf zorael :You are now logged in as zorael";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.kind, EventType::RplLoggedIn);
        assert_eq!(event.content, "zorael :You are now logged in as zorael");
    }

    #[test]
    fn saslfail_numeric_becomes_auth_failure() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":tepper.freenode.net 904 kameloso :SASL authentication failed";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.kind, EventType::AuthFailure);
        assert_eq!(event.content, "SASL authentication failed");
    }

    #[test]
    fn isupport_updates_chantypes() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":tepper.freenode.net 005 kameloso CHANTYPES=# NETWORK=freenode NICKLEN=30 :are supported by this server";
        let (_event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(bot.server.chantypes, "#");
        assert_eq!(bot.server.network.as_deref(), Some("freenode"));
        assert_eq!(bot.server.max_nickname_length, 30);
    }

    #[test]
    fn unknown_prefixless_verb_is_an_error() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        assert!(matches!(parse("FROBNICATE foo", &mut bot, &mut table, 0), Err(ParseError::UnknownBasicType {.. })));
    }

    #[test]
    fn unknown_typestring_is_an_error() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        assert!(matches!(
                parse(":a!b@c FROBNICATE foo", &mut bot, &mut table, 0),
                Err(ParseError::UnknownTypestring {.. })
        ));
    }

    #[test]
    fn services_are_marked_special_by_nickname() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":NickServ!service@services.freenode.net NOTICE kameloso :You are now identified.";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert!(event.sender.special);
    }

    #[test]
    fn quakenet_q_prefix_is_special() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = ":Q@CServe.quakenet.org NOTICE kameloso :Authentication successful.";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert!(event.sender.special);
        assert_eq!(event.sender.nickname, "Q");
    }

    #[test]
    fn tags_are_captured_undecoded() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        let line = "@time=2021-01-01T00:00:00Z;account=zorael :zorael!~NaN@asdf PRIVMSG #flerrp :hi";
        let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
        assert_eq!(event.tags, "time=2021-01-01T00:00:00Z;account=zorael");
        assert_eq!(event.channel.as_deref(), Some("#flerrp"));
    }

    #[test]
    fn bad_numeric_token_is_an_error() {
        let mut bot = test_bot();
        let mut table = DaemonTable::default();
        // A typestring starting with a digit but not a clean u16 (too many digits).
        assert!(matches!(
                parse(":a.b 999999999 foo", &mut bot, &mut table, 0),
                Err(ParseError::BadNumeric {.. })
        ));
    }

    #[test]
    fn sanity_check_flags_spaced_nickname() {
        // No real wire prefix can carry a space (it's a single token), but the
        // checker must still flag one if it ever reaches an Event.
        let bot = test_bot();
        let mut event = Event::new(EventType::Chan, "raw", 0);
        event.sender = User::bare("zo rael");
        let warnings = sanity_check(&event, &bot);
        assert!(warnings.iter().any(|w| matches!(w, SanityWarning::SpacedNickname {.. })));
    }

    #[test]
    fn sanity_check_flags_unsigned_channel() {
        let bot = test_bot();
        let mut event = Event::new(EventType::Chan, "raw", 0);
        event.channel = Some("flerrp".to_owned());
        let warnings = sanity_check(&event, &bot);
        assert!(warnings.iter().any(|w| matches!(w, SanityWarning::UnsignedChannel {.. })));
    }
}
