//! The closed set of cross-thread message kinds. Worker threads (socket
//! reads aside, which the supervisor itself owns) never mutate the state
//! store directly — they request a mutation by sending one of these to the
//! dispatcher loop.

/// A request from a worker thread to the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Reply to an inbound PING with this payload.
    Pong(String),
    /// Enqueue a line for ordinary release, with local echo.
    Sendline(String),
    /// Enqueue a line for ordinary release, without local echo.
    SendlineQuiet(String),
    /// Enqueue a line on the priority lane (still throttled).
    Throttleline(String),
    /// Request an orderly shutdown.
    Quit,
    /// Request every plugin's teardown hook be run.
    Teardown,
    /// Request persisted state be flushed to disk.
    Save,
    /// Request a snapshot of the currently loaded plugin names.
    PeekPlugins,
}

/// The channel a worker uses to reach the dispatcher.
pub type MessageSender = tokio::sync::mpsc::UnboundedSender<Message>;
/// The dispatcher's end of the same channel.
pub type MessageReceiver = tokio::sync::mpsc::UnboundedReceiver<Message>;

/// Builds a fresh worker-to-dispatcher channel.
pub fn channel() -> (MessageSender, MessageReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_sent_message_is_received_in_order() {
        let (tx, mut rx) = channel();
        tx.send(Message::Sendline("one".to_owned())).unwrap();
        tx.send(Message::Sendline("two".to_owned())).unwrap();
        assert_eq!(rx.recv().await, Some(Message::Sendline("one".to_owned())));
        assert_eq!(rx.recv().await, Some(Message::Sendline("two".to_owned())));
    }
}
