//! IRCv3 message-tag grammar: `@key=value;key2;... `.
//!
//! The core keeps the tag blob undecoded on [`crate::event::Event`] (:
//! `tags` is "IRCv3 message-tag blob, undecoded") and only decodes on
//! demand via [`decode`]. Escaping follows: `\s`→space, `\:`→`;`,
//! `\\`→`\`, and a trailing lone `\` is dropped.

use std::borrow::Cow;

/// Parses a raw tag blob (the part after `@`, before the first space) into
/// its `(key, value)` pairs, in order, unescaping values as needed.
pub fn decode(raw: &str) -> Vec<(String, Option<String>)> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(';').map(decode_one).collect()
}

fn decode_one(tag: &str) -> (String, Option<String>) {
    match tag.find('=') {
        None => (tag.to_owned(), None),
        Some(eq) => (tag[..eq].to_owned(), Some(unescape(&tag[eq + 1..]))),
    }
}

fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            // A trailing lone backslash is dropped per the escape grammar.
            None => {}
        }
    }
    out
}

fn escape(raw: &str) -> Cow<str> {
    if !raw.contains(|c| c == ';' || c == ' ' || c == '\\' || c == '\r' || c == '\n') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            ';' => out.push_str("\\:"),
            ' ' => out.push_str("\\s"),
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Re-serializes decoded pairs back into a raw tag blob, inverse of [`decode`].
pub fn encode(pairs: &[(String, Option<String>)]) -> String {
    pairs
    .iter()
    .map(|(key, value)| match value {
            Some(v) => format!("{}={}", key, escape(v)),
            None => key.clone(),
    })
    .collect::<Vec<_>>()
    .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_pairs() {
        let pairs = decode("aaa=bbb;ccc;example.com/ddd=eee");
        assert_eq!(
            pairs,
            vec![
                ("aaa".to_owned(), Some("bbb".to_owned())),
                ("ccc".to_owned(), None),
                ("example.com/ddd".to_owned(), Some("eee".to_owned())),
            ]
        );
    }

    #[test]
    fn unescapes_grammar() {
        let pairs = decode(r"msg=hello\sworld\:and\\stuff");
        assert_eq!(pairs[0].1.as_deref(), Some("hello world;and\\stuff"));
    }

    #[test]
    fn drops_trailing_lone_backslash() {
        let pairs = decode(r"msg=broken\");
            assert_eq!(pairs[0].1.as_deref(), Some("broken"));
        }

        #[test]
        fn decode_then_encode_is_idempotent() {
            let raw = r"aaa=bbb;ccc;example.com/ddd=eee\swith\sspaces";
            let once = encode(&decode(raw));
            let twice = encode(&decode(&once));
            assert_eq!(once, twice);
        }

        #[test]
        fn round_trips_through_escaping() {
            let raw = "key=a;b c\\d";
            let decoded = decode(raw);
            let encoded = encode(&decoded);
            assert_eq!(decode(&encoded), decoded);
        }

        #[test]
        fn empty_blob_decodes_empty() {
            assert!(decode("").is_empty());
        }
    }
