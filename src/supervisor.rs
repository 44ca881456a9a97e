//! The connection supervisor: resolve, connect, greet, then block on
//! the read side. On socket error a synthetic `ERROR` event is injected and,
//! if `reconnect_on_failure` is set, the loop reconnects after an
//! interruptible sleep. A process-wide abort flag is polled by every
//! sleep and by the read wait at ≤ 250 ms resolution.
//!
//! Plain TCP only — no TLS or mock transport variants — framed via
//! `tokio_util::codec::Framed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

use tern_proto::{frame, parse, Bot, Daemon, DaemonTable, Event, EventType, IrcTransport, Response};

use crate::dispatch::{Dispatcher, PrivilegeResolver};
use crate::error::CoreError;
use crate::message::{Message, MessageReceiver};
use crate::state::StateStore;
use crate::throttle::{Outgoing, Throttle};

/// How long to wait between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(10);
/// How often the throttle is given a chance to release queued lines.
const THROTTLE_TICK: Duration = Duration::from_millis(200);

/// A process-wide shutdown signal. Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> AbortFlag {
        AbortFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration`, polling the flag at [`THROTTLE_TICK`]
    /// resolution so shutdown never waits longer than that to notice.
    /// Returns early (`true`) if the flag was set during the wait.
    pub async fn interruptible_sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_set() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            sleep(remaining.min(THROTTLE_TICK)).await;
        }
    }
}

async fn connect(address: &str, port: u16) -> Result<TcpStream, CoreError> {
    log::info!("Connecting to {}:{}", address, port);
    TcpStream::connect((address, port)).await.map_err(CoreError::Socket)
}

/// Sends the RFC 1459/2812 handshake: `PASS` (if configured), `NICK`, `USER`.
/// CAP/SASL negotiation is a plugin's concern and layers on
/// top by sending its own lines through the same transport before this.
async fn greet(transport: &mut IrcTransport<TcpStream>, bot: &Bot) -> Result<(), CoreError> {
    if let Some(password) = bot.password.as_deref().filter(|p| !p.is_empty()) {
        transport.send(format!("PASS {}", password)).await.map_err(|e| CoreError::Socket(io_of(e)))?;
    }
    transport.send(format!("NICK {}", bot.nickname)).await.map_err(|e| CoreError::Socket(io_of(e)))?;
    transport
    .send(format!("USER {} 0 * :{}", bot.user, bot.real_name))
    .await
    .map_err(|e| CoreError::Socket(io_of(e)))?;
    Ok(())
}

fn io_of(err: tern_proto::error::FrameError) -> std::io::Error {
    match err {
        tern_proto::error::FrameError::Io(io) => io,
        other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
    }
}

/// Runs the reconnect loop until shutdown, or until a connection failure
/// occurs with `reconnect_on_failure` unset.
///
/// `bot`/`state`/`dispatcher`/`throttle` are the shared, dispatcher-owned
/// values; this function is the only caller of
/// `Dispatcher::dispatch` in the whole crate, since it's the one place that
/// owns the socket driving events into it.
pub async fn run<R: PrivilegeResolver>(
    abort: &AbortFlag,
    bot: &mut Bot,
    state: &mut StateStore,
    dispatcher: &mut Dispatcher<R>,
    throttle: &mut Throttle,
    messages: &mut MessageReceiver,
    reconnect_on_failure: bool,
) -> Result<(), CoreError> {
    let clock = Instant::now();
    let mut table = DaemonTable::default();
    table.set_daemon(Daemon::Unknown);

    loop {
        if abort.is_set() {
            return Ok(());
        }

        match connect(&bot.server.address, bot.server.port).await {
            Ok(stream) => {
                let mut transport = frame(stream);
                if let Err(err) = greet(&mut transport, bot).await {
                    log::warn!("greeting failed: {}", err);
                    inject_socket_error(dispatcher, bot, state, &err);
                } else {
                    run_session(abort, bot, state, dispatcher, throttle, messages, &mut table, &mut transport, clock).await;
                }
            }
            Err(err) => {
                log::warn!("connection failed: {}", err);
                inject_socket_error(dispatcher, bot, state, &err);
            }
        }

        if abort.is_set() {
            return Ok(());
        }
        if !reconnect_on_failure {
            return Err(CoreError::Socket(std::io::Error::new(std::io::ErrorKind::Other, "connection lost, reconnect disabled")));
        }
        if abort.interruptible_sleep(RECONNECT_DELAY).await {
            return Ok(());
        }
    }
}

/// Drives one connected session: reads lines, parses and dispatches events,
/// and periodically lets the throttle release queued outgoing lines. Returns
/// when the socket closes, errors, or the abort flag is set.
async fn run_session<R: PrivilegeResolver>(
    abort: &AbortFlag,
    bot: &mut Bot,
    state: &mut StateStore,
    dispatcher: &mut Dispatcher<R>,
    throttle: &mut Throttle,
    messages: &mut MessageReceiver,
    table: &mut DaemonTable,
    transport: &mut IrcTransport<TcpStream>,
    clock: Instant,
) {
    loop {
        if abort.is_set() {
            return;
        }

        tokio::select! {
            msg = messages.recv() => {
                match msg {
                    Some(Message::Pong(payload)) => throttle.enqueue_priority(Outgoing::quiet(format!("PONG :{}", payload))),
                    Some(Message::Sendline(line)) => throttle.enqueue(Outgoing::verbose(line)),
                    Some(Message::SendlineQuiet(line)) => throttle.enqueue(Outgoing::quiet(line)),
                    Some(Message::Throttleline(line)) => throttle.enqueue_priority(Outgoing::verbose(line)),
                    Some(Message::Quit) => {
                        abort.signal();
                        return;
                    }
                    Some(Message::Teardown) => {
                        for err in dispatcher.teardown_plugins() {
                            log::error!("{}", err);
                        }
                    }
                    Some(Message::Save) => log::info!("save requested"),
                    Some(Message::PeekPlugins) => log::info!("loaded plugins: {:?}", dispatcher.plugin_names()),
                    None => {}
                }
            }
            line = transport.next() => {
                match line {
                    Some(Ok(line)) => {
                        let now = clock.elapsed().as_secs();
                        match parse(&line.text, bot, table, now) {
                            Ok((event, warnings)) => {
                                for warning in warnings {
                                    log::warn!("{:?}", warning);
                                }
                                if matches!(event.kind, EventType::Numeric(Response::RPL_MYINFO)) {
                                    table.set_daemon(bot.server.daemon);
                                }
                                for err in dispatcher.dispatch(&event, bot, state) {
                                    log::error!("{}", err);
                                }
                            }
                            Err(err) => log::warn!("dropping unparsable line: {}", err),
                        }
                    }
                    Some(Err(err)) => {
                        log::warn!("socket error: {}", err);
                        inject_socket_error(dispatcher, bot, state, &err);
                        return;
                    }
                    None => {
                        log::info!("connection closed by peer");
                        inject_socket_error(dispatcher, bot, state, &"connection closed");
                        return;
                    }
                }
            }
            _ = sleep(THROTTLE_TICK) => {
                let now = clock.elapsed().as_secs_f64();
                for line in throttle.release(now) {
                    if let Err(err) = transport.send(line.line.clone()).await {
                        log::warn!("send failed: {}", err);
                        inject_socket_error(dispatcher, bot, state, &err);
                        return;
                    }
                    if !line.quiet {
                        log::debug!("--> {}", line.line);
                    }
                }
            }
        }
    }
}

fn inject_socket_error<R: PrivilegeResolver>(
    dispatcher: &mut Dispatcher<R>,
    bot: &Bot,
    state: &mut StateStore,
    cause: &dyn std::fmt::Display,
) {
    let mut event = Event::new(EventType::Error, cause.to_string(), 0);
    event.content = cause.to_string();
    for err in dispatcher.dispatch(&event, bot, state) {
        log::error!("{}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn abort_flag_sleep_returns_early_once_signalled() {
        let flag = AbortFlag::new();
        let flag2 = flag.clone();
        tokio::spawn(async move {
                sleep(Duration::from_millis(20)).await;
                flag2.signal();
        });
        let woke_early = flag.interruptible_sleep(Duration::from_secs(5)).await;
        assert!(woke_early);
    }

    #[tokio::test]
    async fn abort_flag_sleep_completes_fully_when_never_signalled() {
        let flag = AbortFlag::new();
        let woke_early = flag.interruptible_sleep(Duration::from_millis(30)).await;
        assert!(!woke_early);
    }
}
