//! The daemon table: per-server-software numeric remapping, melded
//! at runtime from a fixed base table.

use std::collections::HashMap;

use crate::response::Response;

/// The closed set of server-software tags enumerates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Daemon {
    Unreal,
    InspIrcd,
    U2,
    Bahamut,
    Ratbox,
    Hybrid,
    IrcdSeven,
    Charybdis,
    Rizon,
    Ircu,
    Rfc1459,
    Rfc2812,
    Twitch,
    Unknown,
}

impl Daemon {
    /// Identifies a daemon tag by substring match on the RPL_MYINFO
    /// server-software string.
    pub fn identify(software: &str) -> Daemon {
        let s = software.to_ascii_lowercase();
        if s.contains("unreal") {
            Daemon::Unreal
        } else if s.contains("inspircd") {
            Daemon::InspIrcd
        } else if s.contains("charybdis") {
            Daemon::Charybdis
        } else if s.contains("ircd-seven") {
            Daemon::IrcdSeven
        } else if s.contains("ratbox") {
            Daemon::Ratbox
        } else if s.contains("hybrid") {
            Daemon::Hybrid
        } else if s.contains("rizon") {
            Daemon::Rizon
        } else if s.contains("bahamut") {
            Daemon::Bahamut
        } else if s.contains("ircu") {
            Daemon::Ircu
        } else if s.contains("u2.") || s.contains("undernet") {
            Daemon::U2
        } else if s.contains("twitch") {
            Daemon::Twitch
        } else if s.is_empty() {
            Daemon::Unknown
        } else {
            Daemon::Unknown
        }
    }
}

/// A numeric → event-kind dispatch table, melded from a base table plus
/// daemon-specific overlays.
#[derive(Clone, Debug, Default)]
pub struct DaemonTable {
    entries: HashMap<u16, Response>,
}

impl DaemonTable {
    /// The fixed base table: every numeric maps to its RFC meaning.
    fn base() -> DaemonTable {
        let mut entries = HashMap::new();
        for num in 0u16..=999 {
            if let Some(resp) = Response::from_numeric(num) {
                entries.insert(num, resp);
            }
        }
        DaemonTable { entries }
    }

    /// Overlay tables for daemons whose numerics diverge from the base.
    /// Real overlays are sparse: only numerics that disagree with the base
    /// table need an entry. None of the currently modeled `Response`
    /// numerics collide across daemons, so every known overlay is empty
    /// today; this is the extension point describes for daemon-specific
    /// divergence as it's discovered.
    fn overlay(_daemon: Daemon) -> HashMap<u16, Response> {
        HashMap::new()
    }

    /// Clears to the base table, then melds in `tag`'s overlay chain per its
    /// daemon-specific meld order (e.g. ircdseven = hybrid ∪ ratbox ∪
    /// charybdis). Unset entries in the target take the overlay's value;
    /// set entries survive unless the overlay explicitly overwrites them.
    pub fn set_daemon(&mut self, tag: Daemon) {
        *self = DaemonTable::base();

        if tag == Daemon::Twitch {
            return;
        }

        let chain: Vec<Daemon> = match tag {
            Daemon::IrcdSeven => vec![Daemon::Hybrid, Daemon::Ratbox, Daemon::Charybdis],
            other => vec![other],
        };

        for overlay_daemon in chain {
            for (num, resp) in DaemonTable::overlay(overlay_daemon) {
                self.entries.entry(num).or_insert(resp);
            }
        }
    }

    /// Looks up the event kind for a numeric, `None` meaning `NUMERIC`/unset.
    pub fn lookup(&self, num: u16) -> Option<Response> {
        self.entries.get(&num).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_by_substring() {
        assert_eq!(Daemon::identify("UnrealIRCd-6.1.1"), Daemon::Unreal);
        assert_eq!(Daemon::identify("charybdis-4.1.2"), Daemon::Charybdis);
        assert_eq!(Daemon::identify("some twitch relay"), Daemon::Twitch);
        assert_eq!(Daemon::identify("mystery-daemon"), Daemon::Unknown);
    }

    #[test]
    fn base_table_resolves_known_numerics() {
        let mut table = DaemonTable::default();
        table.set_daemon(Daemon::Unknown);
        assert_eq!(table.lookup(330), Some(Response::RPL_WHOISACCOUNT));
    }

    #[test]
    fn twitch_uses_base_only() {
        let mut table = DaemonTable::default();
        table.set_daemon(Daemon::Twitch);
        assert_eq!(table.lookup(330), Some(Response::RPL_WHOISACCOUNT));
    }

    #[test]
    fn meld_is_idempotent() {
        let mut a = DaemonTable::default();
        a.set_daemon(Daemon::IrcdSeven);
        let snapshot_a = a.clone();
        a.set_daemon(Daemon::IrcdSeven);
        assert_eq!(a.lookup(1), snapshot_a.lookup(1));
        assert_eq!(a.lookup(330), snapshot_a.lookup(330));
    }
}
