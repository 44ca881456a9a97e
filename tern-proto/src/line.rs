//! Line-delimiting codec.
//!
//! Frames a raw byte stream into CRLF-terminated lines, stripping the
//! terminator. A line longer than the 8192-byte hard limit without a
//! terminator in sight is a [`FrameError::MalformedFrame`]; lines past the
//! 512-byte soft limit (the classical IRC line length before IRCv3 tags) are
//! still accepted but flagged via [`Line::over_soft_limit`] so callers can
//! log it. An embedded NUL is preserved in the text but flagged rather than
//! rejected, since some daemons are known to pass one through.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;

/// Soft limit on line length in bytes, per RFC 1459/2812.
pub const SOFT_LIMIT: usize = 512;
/// Hard limit on line length in bytes, large enough for an IRCv3 tag blob.
pub const HARD_LIMIT: usize = 8192;

/// A single framed line with its terminator already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The line's text, without the trailing `\r\n` (or bare `\r`/`\n`).
    pub text: String,
    /// Set if the raw bytes contained an embedded NUL.
    pub has_embedded_nul: bool,
    /// Set if the raw line (terminator excluded) exceeded [`SOFT_LIMIT`] bytes.
    pub over_soft_limit: bool,
}

/// A line-based codec over UTF-8 (lossy) text.
#[derive(Debug, Default)]
pub struct LineCodec {
    next_index: usize,
}

impl LineCodec {
    /// Creates a new, empty line codec.
    pub fn new() -> LineCodec {
        LineCodec { next_index: 0 }
    }
}

impl Decoder for LineCodec {
    type Item = Line;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Line>, FrameError> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let end = self.next_index + offset;
            let raw = src.split_to(end + 1);
            self.next_index = 0;

            let mut bytes = &raw[..raw.len() - 1];
            if bytes.last() == Some(&b'\r') {
                bytes = &bytes[..bytes.len() - 1];
            }

            let has_embedded_nul = bytes.contains(&0);
            let over_soft_limit = bytes.len() > SOFT_LIMIT;
            let text = String::from_utf8_lossy(bytes).into_owned();

            Ok(Some(Line {
                        text,
                        has_embedded_nul,
                        over_soft_limit,
            }))
        } else if src.len() > HARD_LIMIT {
            Err(FrameError::MalformedFrame { limit: HARD_LIMIT })
        } else {
            self.next_index = src.len();
            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> Result<(), FrameError> {
        dst.extend_from_slice(msg.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(codec: &mut LineCodec, data: &[u8]) -> Option<Line> {
        let mut buf = BytesMut::from(data);
        codec.decode(&mut buf).unwrap()
    }

    #[test]
    fn strips_crlf() {
        let mut codec = LineCodec::new();
        let line = feed(&mut codec, b"PING:irc.example.net\r\n").unwrap();
        assert_eq!(line.text, "PING:irc.example.net");
        assert!(!line.has_embedded_nul);
        assert!(!line.over_soft_limit);
    }

    #[test]
    fn strips_bare_lf() {
        let mut codec = LineCodec::new();
        let line = feed(&mut codec, b"PING:irc.example.net\n").unwrap();
        assert_eq!(line.text, "PING:irc.example.net");
    }

    #[test]
    fn emits_nothing_without_terminator() {
        let mut codec = LineCodec::new();
        assert_eq!(feed(&mut codec, b"PING:irc.example"), None);
    }

    #[test]
    fn flags_embedded_nul() {
        let mut codec = LineCodec::new();
        let mut data = b"PRIVMSG #c:a\x00b\r\n".to_vec();
        let mut buf = BytesMut::from(&data[..]);
        data.clear();
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.has_embedded_nul);
    }

    #[test]
    fn flags_soft_limit_without_failing() {
        let mut codec = LineCodec::new();
        let body = "a".repeat(600);
        let raw = format!("PRIVMSG #c :{}\r\n", body);
        let line = feed(&mut codec, raw.as_bytes()).unwrap();
        assert!(line.over_soft_limit);
    }

    #[test]
    fn hard_limit_without_terminator_is_malformed() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"x"[..].repeat(HARD_LIMIT + 1)[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame { limit } if limit == HARD_LIMIT));
    }

    #[test]
    fn encoder_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("NICK ferris".to_owned(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"NICK ferris\r\n");
    }
}
