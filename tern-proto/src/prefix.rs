//! The message prefix: "the true origin of the message".
use std::fmt;

/// A parsed sender prefix, before the services/"special" determination of
/// is layered on top by the parser.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Prefix {
    /// A bare server name, recognized by containing a `.` with no `!`.
    ServerName(String),
    /// `nickname[!ident[@address]]`.
    Nickname {
        nickname: String,
        ident: String,
        address: String,
    },
}

impl Prefix {
    /// Parses a prefix per Phase 2's split rules, in priority order:
    /// `!` wins over `.`, and a prefix with neither is a bare nickname.
    pub fn parse(s: &str) -> Prefix {
        if let Some(bang) = s.find('!') {
            let nickname = s[..bang].to_owned();
            let rest = &s[bang + '!'.len_utf8()..];
            match rest.find('@') {
                Some(at) => Prefix::Nickname {
                    nickname,
                    ident: rest[..at].to_owned(),
                    address: rest[at + '@'.len_utf8()..].to_owned(),
                },
                None => Prefix::Nickname {
                    nickname,
                    ident: rest.to_owned(),
                    address: String::new(),
                },
            }
        } else if s.contains('.') {
            Prefix::ServerName(s.to_owned())
        } else {
            Prefix::Nickname {
                nickname: s.to_owned(),
                ident: String::new(),
                address: String::new(),
            }
        }
    }

    /// The nickname component, empty for a bare server name.
    pub fn nickname(&self) -> &str {
        match self {
            Prefix::ServerName(_) => "",
            Prefix::Nickname { nickname,.. } => nickname,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => write!(f, "{}", name),
            Prefix::Nickname {
                nickname,
                ident,
                address,
            } => match (ident.as_str(), address.as_str()) {
                ("", "") => write!(f, "{}", nickname),
                (ident, "") => write!(f, "{}!{}", nickname, ident),
                ("", address) => write!(f, "{}@{}", nickname, address),
                (ident, address) => write!(f, "{}!{}@{}", nickname, ident, address),
            },
        }
    }
}

impl<'a> From<&'a str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::Prefix;

    #[test]
    fn parses_nick_ident_address() {
        let p = Prefix::parse("zorael!~NaN@2001:41d0:2:80b4::");
        assert_eq!(
            p,
            Prefix::Nickname {
                nickname: "zorael".into(),
                ident: "~NaN".into(),
                address: "2001:41d0:2:80b4::".into(),
            }
        );
    }

    #[test]
    fn parses_bare_nickname() {
        assert_eq!(
            Prefix::parse("only_nick"),
            Prefix::Nickname {
                nickname: "only_nick".into(),
                ident: String::new(),
                address: String::new(),
            }
        );
    }

    #[test]
    fn parses_server_name() {
        assert_eq!(
            Prefix::parse("irc.example.net"),
            Prefix::ServerName("irc.example.net".into())
        );
    }

    #[test]
    fn bang_wins_over_dot() {
        // Rule (a) checks for '!' before rule (b) checks for '.'.
        assert_eq!(
            Prefix::parse("host.name!user@x"),
            Prefix::Nickname {
                nickname: "host.name".into(),
                ident: "user".into(),
                address: "x".into(),
            }
        );
    }

    #[test]
    fn nick_without_address() {
        assert_eq!(
            Prefix::parse("test!nick"),
            Prefix::Nickname {
                nickname: "test".into(),
                ident: "nick".into(),
                address: String::new(),
            }
        );
    }
}
