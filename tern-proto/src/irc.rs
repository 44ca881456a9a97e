//! Wires [`LineCodec`] onto an async transport.
//!
//! This layer stops at [`Line`]: turning a line's text into an
//! [`crate::event::Event`] needs the live [`crate::model::Bot`]/
//! [`crate::daemon::DaemonTable`] (a self-NICK or MYINFO line mutates them),
//! and those belong to the state store the connection supervisor owns, not
//! to the wire layer. Callers `frame(stream)` and feed each yielded [`Line`]'s
//! `text` to [`crate::parser::parse`] themselves.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::line::LineCodec;

pub use crate::line::Line;

/// Alias for the codec used to frame an IRC connection's byte stream.
pub type IrcCodec = LineCodec;

/// A transport framed with [`IrcCodec`], yielding one [`Line`] per read and
/// accepting one already-formatted `String` per write.
pub type IrcTransport<T> = Framed<T, IrcCodec>;

/// Frames `stream` for IRC line traffic.
pub fn frame<T>(stream: T) -> IrcTransport<T>
where
T: AsyncRead + AsyncWrite,
{
    Framed::new(stream, IrcCodec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::codec::Decoder;

    #[test]
    fn irc_codec_is_a_line_codec() {
        let mut codec = IrcCodec::new();
        let mut buf = bytes::BytesMut::from(&b"PING:x\r\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line.text, "PING:x");
    }
}
