//! The state store: channel roster and user cache, owned
//! exclusively by the dispatcher thread. Bot identity and server caps live
//! in `tern_proto::Bot` itself; this module holds the parts that are keyed
//! by name rather than carried on the bot record.

use std::collections::HashMap;

use tern_proto::{CaseMapping, Channel, User};

/// In-memory channel and user bookkeeping. Readers are the parser (for
/// casemapping-aware lookups) and plugins; writers are the parser (on
/// JOIN/PART/QUIT/NICK/MODE/KICK) and plugins via the awareness handlers.
#[derive(Debug, Default)]
pub struct StateStore {
    channels: HashMap<String, Channel>,
    users: HashMap<String, User>,
}

impl StateStore {
    pub fn new() -> StateStore {
        StateStore::default()
    }

    pub fn channel(&self, name: &str, casemapping: CaseMapping) -> Option<&Channel> {
        self.channels.get(&casemapping.fold(name))
    }

    pub fn channel_mut(&mut self, name: &str, casemapping: CaseMapping) -> Option<&mut Channel> {
        self.channels.get_mut(&casemapping.fold(name))
    }

    pub fn ensure_channel(&mut self, name: &str, casemapping: CaseMapping) -> &mut Channel {
        self.channels
        .entry(casemapping.fold(name))
        .or_insert_with(|| Channel::new(name))
    }

    pub fn remove_channel(&mut self, name: &str, casemapping: CaseMapping) -> Option<Channel> {
        self.channels.remove(&casemapping.fold(name))
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn user(&self, nickname: &str, casemapping: CaseMapping) -> Option<&User> {
        self.users.get(&casemapping.fold(nickname))
    }

    /// Inserts or refreshes a user-cache entry, keyed by the given
    /// casemapping (lifecycle: first sighting, WHOIS/JOIN-extended refresh).
    pub fn upsert_user(&mut self, user: User, casemapping: CaseMapping) {
        let key = user.identity_key(casemapping);
        self.users.insert(key, user);
    }

    /// Re-keys a user-cache entry after a NICK change.
    pub fn rename_user(&mut self, old_nickname: &str, new_nickname: &str, casemapping: CaseMapping) {
        let old_key = casemapping.fold(old_nickname);
        if let Some(mut user) = self.users.remove(&old_key) {
            user.nickname = new_nickname.to_owned();
            let new_key = casemapping.fold(new_nickname);
            self.users.insert(new_key, user);
        }
        for channel in self.channels.values_mut() {
            if let Some(mut member) = channel.remove_user(old_nickname, casemapping) {
                member.user.nickname = new_nickname.to_owned();
                channel.upsert_user(member.user, casemapping);
            }
        }
    }

    /// Removes a user-cache entry and every channel membership, after
    /// dispatch of the QUIT event that carries it.
    pub fn remove_user(&mut self, nickname: &str, casemapping: CaseMapping) -> Option<User> {
        for channel in self.channels.values_mut() {
            channel.remove_user(nickname, casemapping);
        }
        self.users.remove(&casemapping.fold(nickname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_channel_creates_then_reuses() {
        let mut state = StateStore::new();
        state.ensure_channel("#flerrp", CaseMapping::Rfc1459);
        assert!(state.channel("#flerrp", CaseMapping::Rfc1459).is_some());
        assert_eq!(state.channels().count(), 1);
    }

    #[test]
    fn rename_user_rekeys_cache_and_channel_rosters() {
        let mut state = StateStore::new();
        state.upsert_user(User::bare("zorael"), CaseMapping::Rfc1459);
        state.ensure_channel("#flerrp", CaseMapping::Rfc1459);
        state
        .channel_mut("#flerrp", CaseMapping::Rfc1459)
        .unwrap()
        .upsert_user(User::bare("zorael"), CaseMapping::Rfc1459);

        state.rename_user("zorael", "zorael^", CaseMapping::Rfc1459);

        assert!(state.user("zorael", CaseMapping::Rfc1459).is_none());
        assert!(state.user("zorael^", CaseMapping::Rfc1459).is_some());
        let chan = state.channel("#flerrp", CaseMapping::Rfc1459).unwrap();
        assert!(chan.users.contains_key("zorael^"));
        assert!(!chan.users.contains_key("zorael"));
    }

    #[test]
    fn remove_user_clears_every_channel_membership() {
        let mut state = StateStore::new();
        state.ensure_channel("#flerrp", CaseMapping::Rfc1459);
        state
        .channel_mut("#flerrp", CaseMapping::Rfc1459)
        .unwrap()
        .upsert_user(User::bare("zorael"), CaseMapping::Rfc1459);
        state.remove_user("zorael", CaseMapping::Rfc1459);
        let chan = state.channel("#flerrp", CaseMapping::Rfc1459).unwrap();
        assert!(!chan.users.contains_key("zorael"));
    }
}
