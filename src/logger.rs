//! The `Tint` sub-API: a pure mapping from log level to an
//! ANSI colour, plus a thin [`log::Log`] sink that uses it.
//!
//! The core never prints directly — every subsystem logs through the `log`
//! facade (`log::{trace,debug,info,warn,error}!`). This module only owns the
//! process-wide sink installed by `main.rs`; it is not itself a dependency
//! of any other module in the crate.

use std::io::Write;

use log::{Level, Log, Metadata, Record};

/// A single ANSI SGR colour code, e.g. `\x1b[33m`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnsiColor(u8);

impl AnsiColor {
    /// The escape sequence that switches the terminal to this colour.
    pub fn escape(self) -> String {
        format!("\x1b[{}m", self.0)
    }
}

const RESET: &str = "\x1b[0m";

/// Picks the colour for `level`, or `None` when colour shouldn't be used.
///
/// Deterministic: same inputs always produce the same output, no global
/// state consulted. `monochrome` always wins over `bright`.
pub fn tint(level: Level, monochrome: bool, bright: bool) -> Option<AnsiColor> {
    if monochrome {
        return None;
    }
    let code = match (level, bright) {
        (Level::Error, false) => 31,
        (Level::Error, true) => 91,
        (Level::Warn, false) => 33,
        (Level::Warn, true) => 93,
        (Level::Info, false) => 32,
        (Level::Info, true) => 92,
        (Level::Debug, false) => 36,
        (Level::Debug, true) => 96,
        (Level::Trace, false) => 34,
        (Level::Trace, true) => 94,
    };
    Some(AnsiColor(code))
}

/// A `log::Log` implementation that writes to stderr, colourizing the level
/// tag via [`tint`] unless `monochrome` is set or the stream isn't a TTY.
pub struct StderrLogger {
    monochrome: bool,
    bright: bool,
    level: Level,
}

impl StderrLogger {
    /// Builds a logger. Callers decide `monochrome` (CLI `--monochrome`)
    /// rather than this module guessing at TTY-ness.
    pub fn new(level: Level, monochrome: bool, bright: bool) -> StderrLogger {
        StderrLogger {
            monochrome,
            bright,
            level,
        }
    }

    /// Installs this logger as the global `log` sink.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        log::set_max_level(self.level.to_level_filter());
        log::set_boxed_logger(Box::new(self))
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let tag = record.level();
        match tint(tag, self.monochrome, self.bright) {
            Some(color) => {
                let _ = writeln!(
                    std::io::stderr(),
                    "[{}] {}{:<5}{} {}",
                    now,
                    color.escape(),
                    tag,
                    RESET,
                    record.args()
                );
            }
            None => {
                let _ = writeln!(std::io::stderr(), "[{}] {:<5} {}", now, tag, record.args());
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monochrome_suppresses_colour() {
        assert_eq!(tint(Level::Error, true, false), None);
        assert_eq!(tint(Level::Error, true, true), None);
    }

    #[test]
    fn bright_selects_a_different_code_than_normal() {
        let normal = tint(Level::Warn, false, false).unwrap();
        let bright = tint(Level::Warn, false, true).unwrap();
        assert_ne!(normal, bright);
    }

    #[test]
    fn tint_is_pure() {
        assert_eq!(
            tint(Level::Info, false, false),
            tint(Level::Info, false, false)
        );
    }

    #[test]
    fn each_level_gets_a_distinct_colour() {
        let levels = [
            Level::Error,
            Level::Warn,
            Level::Info,
            Level::Debug,
            Level::Trace,
        ];
        for (i, a) in levels.iter().enumerate() {
            for b in &levels[i + 1..] {
                assert_ne!(tint(*a, false, false), tint(*b, false, false));
            }
        }
    }
}
