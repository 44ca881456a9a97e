//! The built-in awareness plugin: user and channel bookkeeping.
//! Core dispatch machinery, not a feature plugin — it runs before every
//! other plugin regardless of privilege, keeping the state store in sync
//! with JOIN/PART/QUIT/NICK/KICK/MODE before anything else sees the event.

use std::collections::HashMap;

use tern_proto::{Bot, Event, EventType};

use crate::dispatch::{ChannelPolicy, Chaining, HandlerSpec, Plugin, Privilege};
use crate::error::CoreError;
use crate::state::StateStore;

/// Roster and mode bookkeeping. Holds no state of its own beyond its
/// handler list — everything it mutates lives in the shared [`StateStore`].
pub struct Awareness {
    specs: Vec<HandlerSpec>,
}

impl Awareness {
    pub fn new() -> Awareness {
        let events = [
            EventType::Join,
            EventType::SelfJoin,
            EventType::Part,
            EventType::SelfPart,
            EventType::Quit,
            EventType::SelfQuit,
            EventType::Nick,
            EventType::SelfNick,
            EventType::Kick,
            EventType::SelfKick,
            EventType::ChanMode,
            EventType::SelfMode,
        ];
        let specs = events
        .into_iter()
        .map(|kind| HandlerSpec {
                events: vec![kind],
                privilege: Privilege::Ignore,
                channel_policy: ChannelPolicy::Any,
                command: None,
                chaining: Chaining {
                    chainable: true,
                    terminating: false,
                },
        })
        .collect();
        Awareness { specs }
    }
}

impl Default for Awareness {
    fn default() -> Awareness {
        Awareness::new()
    }
}

impl Plugin for Awareness {
    fn name(&self) -> &str {
        "awareness"
    }

    fn handler_specs(&self) -> &[HandlerSpec] {
        &self.specs
    }

    fn handle(&mut self, _handler_index: usize, event: &Event, bot: &Bot, state: &mut StateStore) -> Result<bool, CoreError> {
        let casemapping = bot.server.casemapping;
        match &event.kind {
            EventType::Join | EventType::SelfJoin => {
                if let Some(channel) = &event.channel {
                    let chan = state.ensure_channel(channel, casemapping);
                    chan.upsert_user(event.sender.clone(), casemapping);
                }
                state.upsert_user(event.sender.clone(), casemapping);
            }
            EventType::SelfPart => {
                if let Some(channel) = &event.channel {
                    state.remove_channel(channel, casemapping);
                }
            }
            EventType::Part => {
                if let Some(channel) = &event.channel {
                    if let Some(chan) = state.channel_mut(channel, casemapping) {
                        chan.remove_user(&event.sender.nickname, casemapping);
                    }
                }
            }
            EventType::Quit | EventType::SelfQuit => {
                state.remove_user(&event.sender.nickname, casemapping);
            }
            EventType::Nick | EventType::SelfNick => {
                let new_nickname = event.target.as_ref().map(|t| t.nickname.as_str()).unwrap_or(&event.content);
                state.rename_user(&event.sender.nickname, new_nickname, casemapping);
            }
            EventType::SelfKick => {
                if let Some(channel) = &event.channel {
                    state.remove_channel(channel, casemapping);
                }
            }
            EventType::Kick => {
                if let (Some(channel), Some(victim)) = (&event.channel, &event.target) {
                    if let Some(chan) = state.channel_mut(channel, casemapping) {
                        chan.remove_user(&victim.nickname, casemapping);
                    }
                }
            }
            EventType::ChanMode | EventType::SelfMode => {
                if let Some(channel) = &event.channel {
                    let data = event.aux.as_deref().unwrap_or("");
                    let chan = state.ensure_channel(channel, casemapping);
                    chan.set_mode(&bot.server.chanmodes, &event.content, data)
                    .map_err(|err| CoreError::PluginHandlerFailure {
                            plugin: "awareness".to_owned(),
                            event: format!("{:?}", event.kind),
                            reason: err.to_string(),
                    })?;
                }
            }
            _ => {}
        }
        Ok(true)
    }

    fn add_to_config(&self, _sink: &mut HashMap<String, String>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_proto::{CaseMapping, Server, User};

    fn bot() -> Bot {
        Bot::new("kameloso", "kameloso", "kameloso", Server::new("irc.example.net", 6667))
    }

    #[test]
    fn join_adds_user_to_channel_roster() {
        let mut plugin = Awareness::new();
        let mut state = StateStore::new();
        let b = bot();
        let mut event = Event::new(EventType::Join, ":zorael!~NaN@asdf JOIN #flerrp", 0);
        event.sender = User::bare("zorael");
        event.channel = Some("#flerrp".to_owned());
        plugin.handle(0, &event, &b, &mut state).unwrap();
        let chan = state.channel("#flerrp", CaseMapping::Rfc1459).unwrap();
        assert!(chan.users.contains_key("zorael"));
    }

    #[test]
    fn self_part_drops_the_whole_channel() {
        let mut plugin = Awareness::new();
        let mut state = StateStore::new();
        let b = bot();
        state.ensure_channel("#flerrp", CaseMapping::Rfc1459);
        let mut event = Event::new(EventType::SelfPart, ":kameloso PART #flerrp", 0);
        event.channel = Some("#flerrp".to_owned());
        plugin.handle(0, &event, &b, &mut state).unwrap();
        assert!(state.channel("#flerrp", CaseMapping::Rfc1459).is_none());
    }

    #[test]
    fn nick_renames_roster_entries() {
        let mut plugin = Awareness::new();
        let mut state = StateStore::new();
        let b = bot();
        state.ensure_channel("#flerrp", CaseMapping::Rfc1459);
        state
        .channel_mut("#flerrp", CaseMapping::Rfc1459)
        .unwrap()
        .upsert_user(User::bare("zorael"), CaseMapping::Rfc1459);

        let mut event = Event::new(EventType::Nick, ":zorael NICK :zorael^", 0);
        event.sender = User::bare("zorael");
        event.target = Some(User::bare("zorael^"));
        event.content = "zorael^".to_owned();
        plugin.handle(0, &event, &b, &mut state).unwrap();

        let chan = state.channel("#flerrp", CaseMapping::Rfc1459).unwrap();
        assert!(chan.users.contains_key("zorael^"));
        assert!(!chan.users.contains_key("zorael"));
    }

    #[test]
    fn kick_removes_only_the_victim() {
        let mut plugin = Awareness::new();
        let mut state = StateStore::new();
        let b = bot();
        state.ensure_channel("#flerrp", CaseMapping::Rfc1459);
        {
            let chan = state.channel_mut("#flerrp", CaseMapping::Rfc1459).unwrap();
            chan.upsert_user(User::bare("zorael"), CaseMapping::Rfc1459);
            chan.upsert_user(User::bare("hirr"), CaseMapping::Rfc1459);
        }
        let mut event = Event::new(EventType::Kick, ":kameloso KICK #flerrp hirr", 0);
        event.channel = Some("#flerrp".to_owned());
        event.target = Some(User::bare("hirr"));
        plugin.handle(0, &event, &b, &mut state).unwrap();

        let chan = state.channel("#flerrp", CaseMapping::Rfc1459).unwrap();
        assert!(chan.users.contains_key("zorael"));
        assert!(!chan.users.contains_key("hirr"));
    }

    #[test]
    fn chanmode_applies_to_the_channel() {
        let mut plugin = Awareness::new();
        let mut state = StateStore::new();
        let b = bot();
        let mut event = Event::new(EventType::ChanMode, ":kameloso MODE #flerrp +nt", 0);
        event.channel = Some("#flerrp".to_owned());
        event.content = "+nt".to_owned();
        plugin.handle(0, &event, &b, &mut state).unwrap();
        let chan = state.channel("#flerrp", CaseMapping::Rfc1459).unwrap();
        assert!(chan.modechars.contains(&'n'));
        assert!(chan.modechars.contains(&'t'));
    }
}
