//! Crate-level integration tests for the parser's headline scenarios:
//! a channel PRIVMSG, a bare PING, and a WHOISACCOUNT numeric.

use tern_proto::{parse, Bot, DaemonTable, EventType, Response, Server};

fn test_bot() -> Bot {
    Bot::new("kameloso", "kameloso", "kameloso", Server::new("tepper.freenode.net", 6667))
}

#[test]
fn privmsg_to_channel_is_parsed() {
    let mut bot = test_bot();
    let mut table = DaemonTable::default();
    let line = ":zorael!~NaN@2001:41d0:2:80b4:: PRIVMSG #flerrp :kameloso: 8ball";
    let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
    assert_eq!(event.kind, EventType::Chan);
    assert_eq!(event.sender.nickname, "zorael");
    assert_eq!(event.sender.ident, "~NaN");
    assert_eq!(event.sender.address, "2001:41d0:2:80b4::");
    assert_eq!(event.channel.as_deref(), Some("#flerrp"));
    assert_eq!(event.content, "kameloso: 8ball");
    assert_eq!(event.raw, line);
}

#[test]
fn bare_ping_is_parsed() {
    let mut bot = test_bot();
    let mut table = DaemonTable::default();
    let line = "PING :irc.server.address";
    let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
    assert_eq!(event.kind, EventType::Ping);
    assert_eq!(event.sender.address, "irc.server.address");
    assert!(event.sender.nickname.is_empty());
    assert!(event.sender.special);
}

#[test]
fn whoisaccount_numeric_fills_target_account() {
    let mut bot = test_bot();
    let mut table = DaemonTable::default();
    let line = ":tepper.freenode.net 330 kameloso^ zurael zorael :is logged in as";
    bot.nickname = "kameloso^".to_owned();
    let (event, _) = parse(line, &mut bot, &mut table, 0).unwrap();
    assert_eq!(event.kind, EventType::Numeric(Response::RPL_WHOISACCOUNT));
    assert_eq!(event.num, 330);
    assert_eq!(event.target.as_ref().unwrap().nickname, "zurael");
    assert_eq!(event.target.as_ref().unwrap().account.as_deref(), Some("zorael"));
    assert_eq!(event.content, "zorael");
}
