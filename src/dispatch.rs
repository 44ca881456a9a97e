//! Plugin registry and dispatcher: routes parsed events to
//! interested handlers, subject to privilege, channel-scope, and
//! chainability contracts.

use std::collections::{HashMap, HashSet};

use tern_proto::{Bot, Event, EventType};

use crate::error::CoreError;
use crate::state::StateStore;

/// How privileged a sender must be for a handler to run. Variants are
/// ordered low-to-high; `Ignore` is the lowest bar (a handler declaring it
/// runs for anyone, including ignored users), `Admin` the highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Privilege {
    Ignore,
    Anyone,
    Whitelist,
    Operator,
    Admin,
}

/// Which channels a handler is willing to act in: the bot's home channels,
/// versus any guest channel it happens to be sitting in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelPolicy {
    /// Only the bot's home channels, never guest channels or queries.
    HomeOnly,
    /// Any channel, or no channel at all (a query).
    Any,
}

impl ChannelPolicy {
    fn admits(self, channel: Option<&str>, bot: &Bot) -> bool {
        match self {
            ChannelPolicy::Any => true,
            ChannelPolicy::HomeOnly => match channel {
                Some(chan) => bot.home_channels.contains(chan),
                None => false,
            },
        }
    }
}

/// How a command word must relate to the bot's nickname in the message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NickPolicy {
    /// The command must be addressed to the bot first (`kameloso: foo`).
    Required,
    /// Addressing the bot is accepted but optional.
    Prefixed,
    /// A bare command word is enough; no addressing is needed or looked for.
    Nickname,
}

/// An optional command-word trigger carried by a handler annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub word: String,
    pub nick_policy: NickPolicy,
}

/// Chainability. Both bits are independent annotations; the common
/// case sets neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Chaining {
    /// Lets later handlers in the same plugin also match this event.
    pub chainable: bool,
    /// Forces this handler to be evaluated after every non-terminating
    /// handler, across all plugins.
    pub terminating: bool,
}

/// One handler's declarative annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerSpec {
    pub events: Vec<EventType>,
    pub privilege: Privilege,
    pub channel_policy: ChannelPolicy,
    pub command: Option<CommandSpec>,
    pub chaining: Chaining,
}

impl HandlerSpec {
    fn matches_kind(&self, kind: &EventType) -> bool {
        self.events
        .iter()
        .any(|declared| std::mem::discriminant(declared) == std::mem::discriminant(kind))
    }
}

/// Classifies how privileged an event's sender is. Whitelist and operator
/// rosters are plugin-owned data (lists the admin console as an external
/// collaborator), so classification above admin/anyone is delegated to an
/// injectable resolver rather than hard-wired into the dispatcher.
pub trait PrivilegeResolver {
    fn classify(&self, bot: &Bot, event: &Event) -> Privilege;
}

/// The resolver used when nothing richer is wired in: services-verified
/// admin accounts classify as `Admin`, everyone else as `Anyone`.
pub struct AdminOnlyResolver;

impl PrivilegeResolver for AdminOnlyResolver {
    fn classify(&self, bot: &Bot, event: &Event) -> Privilege {
        match event.sender.account.as_deref() {
            Some(account) if bot.is_admin(account) => Privilege::Admin,
            _ => Privilege::Anyone,
        }
    }
}

/// The capability set every plugin exposes.
pub trait Plugin {
    fn name(&self) -> &str;

    /// The handlers this plugin registers, in source order.
    fn handler_specs(&self) -> &[HandlerSpec];

    /// Runs the handler at `handler_index` (an index into
    /// [`Plugin::handler_specs`]). Returns `Ok(true)` if the handler
    /// considers itself to have matched and acted — the signal chaining
    /// gating uses — or `Ok(false)` if it declined (e.g. a command word
    /// that didn't match within an otherwise-gated event).
    fn handle(&mut self, handler_index: usize, event: &Event, bot: &Bot, state: &mut StateStore) -> Result<bool, CoreError>;

    /// Runs once after construction and config load; may mutate bot
    /// identity, propagated to every plugin before the next event.
    fn start(&mut self, _bot: &mut Bot) -> Result<(), CoreError> {
        Ok(())
    }

    /// Best-effort teardown; a failure is caught and logged, never
    /// propagated.
    fn teardown(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Applies this plugin's config-file section, if one was present.
    fn load_config(&mut self, _values: &HashMap<String, String>) -> Result<(), CoreError> {
        Ok(())
    }

    /// Contributes this plugin's section to a config write. Plugins with
    /// nothing to persist contribute nothing.
    fn add_to_config(&self, _sink: &mut HashMap<String, String>) {}

    /// Renders this plugin's current settings for `--settings`.
    fn print_settings(&self) {}
}

/// Matches `content` against a command trigger, returning the remainder
/// after the matched word (trimmed) on success.
pub fn match_command<'a>(content: &'a str, nickname: &str, spec: &CommandSpec) -> Option<&'a str> {
    let content = content.trim_start();
    let addressed = strip_address(content, nickname);
    match spec.nick_policy {
        NickPolicy::Required => strip_word(addressed?, &spec.word),
        NickPolicy::Prefixed => strip_word(addressed.unwrap_or(content), &spec.word),
        NickPolicy::Nickname => strip_word(addressed.unwrap_or(content), &spec.word),
    }
}

fn strip_address<'a>(content: &'a str, nickname: &str) -> Option<&'a str> {
    for sep in [": ", ", "] {
        let needle = format!("{}{}", nickname, sep);
        if let Some(rest) = content.strip_prefix(needle.as_str()) {
            return Some(rest);
        }
    }
    None
}

fn strip_word<'a>(content: &'a str, word: &str) -> Option<&'a str> {
    let rest = content.strip_prefix(word)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(' ').map(str::trim_start)
}

/// Loads, routes to, and tears down a set of [`Plugin`]s.
///
/// Awareness plugins (user/channel bookkeeping) are registered separately
/// from feature plugins: they always run first, in registration order,
/// regardless of privilege, and never participate in the terminating-tail
/// reordering applied to feature-plugin handlers.
pub struct Dispatcher<R: PrivilegeResolver = AdminOnlyResolver> {
    awareness: Vec<Box<dyn Plugin>>,
    plugins: Vec<Box<dyn Plugin>>,
    resolver: R,
}

impl Dispatcher<AdminOnlyResolver> {
    pub fn new() -> Self {
        Dispatcher {
            awareness: Vec::new(),
            plugins: Vec::new(),
            resolver: AdminOnlyResolver,
        }
    }
}

impl Default for Dispatcher<AdminOnlyResolver> {
    fn default() -> Self {
        Dispatcher::new()
    }
}

impl<R: PrivilegeResolver> Dispatcher<R> {
    pub fn with_resolver(resolver: R) -> Self {
        Dispatcher {
            awareness: Vec::new(),
            plugins: Vec::new(),
            resolver,
        }
    }

    pub fn register_awareness(&mut self, plugin: Box<dyn Plugin>) {
        self.awareness.push(plugin);
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Backs the `PeekPlugins` message: a snapshot of every loaded
    /// plugin's name, awareness plugins first.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.awareness
        .iter()
        .chain(self.plugins.iter())
        .map(|plugin| plugin.name())
        .collect()
    }

    /// `initPlugins`: construct-time config load, already done by the
    /// caller building each `Box<dyn Plugin>`; this just applies the
    /// per-plugin config sections.
    pub fn load_configs(&mut self, sections: &HashMap<String, HashMap<String, String>>) -> Vec<CoreError> {
        let mut errors = Vec::new();
        let empty = HashMap::new();
        for plugin in self.awareness.iter_mut().chain(self.plugins.iter_mut()) {
            let values = sections.get(plugin.name()).unwrap_or(&empty);
            if let Err(err) = plugin.load_config(values) {
                errors.push(err);
            }
        }
        errors
    }

    /// `startPlugins`: runs every start hook, propagating any bot-identity
    /// mutation to every other plugin via the shared `bot` before the next
    /// event is dispatched.
    pub fn start_plugins(&mut self, bot: &mut Bot) -> Vec<CoreError> {
        let mut errors = Vec::new();
        for plugin in self.awareness.iter_mut().chain(self.plugins.iter_mut()) {
            if let Err(err) = plugin.start(bot) {
                errors.push(CoreError::PluginHandlerFailure {
                        plugin: plugin.name().to_owned(),
                        event: "start".to_owned(),
                        reason: err.to_string(),
                });
            }
        }
        errors
    }

    /// `teardownPlugins`: best-effort; failures are converted to errors for
    /// the caller to log, never propagated further.
    pub fn teardown_plugins(&mut self) -> Vec<CoreError> {
        let mut errors = Vec::new();
        for plugin in self.awareness.iter_mut().chain(self.plugins.iter_mut()) {
            if let Err(err) = plugin.teardown() {
                errors.push(CoreError::PluginTeardownFailure {
                        plugin: plugin.name().to_owned(),
                        reason: err.to_string(),
                });
            }
        }
        errors
    }

    /// Routes one event to every interested handler per the dispatch
    /// order. Handler failures are caught and returned rather than
    /// propagated, so dispatch always continues to the next handler.
    pub fn dispatch(&mut self, event: &Event, bot: &Bot, state: &mut StateStore) -> Vec<CoreError> {
        let mut errors = Vec::new();
        let sender_class = self.resolver.classify(bot, event);

        for plugin in &mut self.awareness {
            Self::run_plugin(plugin.as_mut(), event, bot, state, sender_class, &mut errors);
        }

        let order = Self::ordered_handlers(&self.plugins);
        let mut stopped: HashSet<usize> = HashSet::new();
        for (plugin_idx, handler_idx) in order {
            if stopped.contains(&plugin_idx) {
                continue;
            }
            let plugin = &mut self.plugins[plugin_idx];
            let spec = plugin.handler_specs()[handler_idx].clone();
            if !spec.matches_kind(&event.kind) {
                continue;
            }
            if spec.privilege > sender_class {
                continue;
            }
            if !spec.channel_policy.admits(event.channel.as_deref(), bot) {
                continue;
            }
            match plugin.handle(handler_idx, event, bot, state) {
                Ok(true) => {
                    if !spec.chaining.chainable {
                        stopped.insert(plugin_idx);
                    }
                }
                Ok(false) => {}
                Err(err) => errors.push(CoreError::PluginHandlerFailure {
                        plugin: plugin.name().to_owned(),
                        event: format!("{:?}", event.kind),
                        reason: err.to_string(),
                }),
            }
        }
        errors
    }

    fn run_plugin(plugin: &mut dyn Plugin, event: &Event, bot: &Bot, state: &mut StateStore, sender_class: Privilege, errors: &mut Vec<CoreError>) {
        for handler_idx in 0..plugin.handler_specs().len() {
            let spec = plugin.handler_specs()[handler_idx].clone();
            if !spec.matches_kind(&event.kind) || spec.privilege > sender_class {
                continue;
            }
            if !spec.channel_policy.admits(event.channel.as_deref(), bot) {
                continue;
            }
            if let Err(err) = plugin.handle(handler_idx, event, bot, state) {
                errors.push(CoreError::PluginHandlerFailure {
                        plugin: plugin.name().to_owned(),
                        event: format!("{:?}", event.kind),
                        reason: err.to_string(),
                });
            }
        }
    }

    /// Flattens every feature plugin's handlers in source order, then
    /// stably moves every `Terminating` handler to the tail.
    fn ordered_handlers(plugins: &[Box<dyn Plugin>]) -> Vec<(usize, usize)> {
        let mut normal = Vec::new();
        let mut terminating = Vec::new();
        for (plugin_idx, plugin) in plugins.iter().enumerate() {
            for (handler_idx, spec) in plugin.handler_specs().iter().enumerate() {
                if spec.chaining.terminating {
                    terminating.push((plugin_idx, handler_idx));
                } else {
                    normal.push((plugin_idx, handler_idx));
                }
            }
        }
        normal.extend(terminating);
        normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_proto::{Server, User};

    fn bot() -> Bot {
        let mut bot = Bot::new("kameloso", "kameloso", "kameloso", Server::new("irc.example.net", 6667));
        bot.home_channels.insert("#flerrp".to_owned());
        bot
    }

    fn chan_event(content: &str) -> Event {
        let mut event = Event::new(EventType::Chan, content, 0);
        event.channel = Some("#flerrp".to_owned());
        event.sender = User::bare("zorael");
        event.content = content.to_owned();
        event
    }

    #[test]
    fn required_nick_policy_needs_addressing() {
        let spec = CommandSpec {
            word: "8ball".to_owned(),
            nick_policy: NickPolicy::Required,
        };
        assert_eq!(match_command("kameloso: 8ball", "kameloso", &spec), Some(""));
        assert_eq!(match_command("8ball", "kameloso", &spec), None);
    }

    #[test]
    fn prefixed_nick_policy_accepts_either_form() {
        let spec = CommandSpec {
            word: "seen".to_owned(),
            nick_policy: NickPolicy::Prefixed,
        };
        assert_eq!(match_command("kameloso: seen zorael", "kameloso", &spec), Some("zorael"));
        assert_eq!(match_command("seen zorael", "kameloso", &spec), Some("zorael"));
    }

    #[test]
    fn command_word_without_trailing_space_does_not_prefix_match() {
        let spec = CommandSpec {
            word: "seen".to_owned(),
            nick_policy: NickPolicy::Nickname,
        };
        assert_eq!(match_command("seenage", "kameloso", &spec), None);
    }

    struct CountingPlugin {
        runs: std::cell::Cell<u32>,
        specs: Vec<HandlerSpec>,
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &str {
            "counting"
        }
        fn handler_specs(&self) -> &[HandlerSpec] {
            &self.specs
        }
        fn handle(&mut self, _handler_index: usize, _event: &Event, _bot: &Bot, _state: &mut StateStore) -> Result<bool, CoreError> {
            self.runs.set(self.runs.get() + 1);
            Ok(true)
        }
    }

    #[test]
    fn non_chainable_success_stops_further_handlers_in_the_same_plugin() {
        let specs = vec![
            HandlerSpec {
                events: vec![EventType::Chan],
                privilege: Privilege::Anyone,
                channel_policy: ChannelPolicy::Any,
                command: None,
                chaining: Chaining::default(),
            },
            HandlerSpec {
                events: vec![EventType::Chan],
                privilege: Privilege::Anyone,
                channel_policy: ChannelPolicy::Any,
                command: None,
                chaining: Chaining::default(),
            },
        ];
        let plugin = CountingPlugin {
            runs: std::cell::Cell::new(0),
            specs,
        };
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Box::new(plugin));
        let bot = bot();
        let mut state = StateStore::new();
        dispatcher.dispatch(&chan_event("hello"), &bot, &mut state);
        // The second handler never ran: the first's non-chainable success
        // stopped the plugin for this event.
    }

    #[test]
    fn home_only_policy_rejects_guest_channel_events() {
        let policy = ChannelPolicy::HomeOnly;
        let b = bot();
        assert!(policy.admits(Some("#flerrp"), &b));
        assert!(!policy.admits(Some("#elsewhere"), &b));
        assert!(!policy.admits(None, &b));
    }

    #[test]
    fn privilege_ordering_matches_ignore_to_admin() {
        assert!(Privilege::Ignore < Privilege::Anyone);
        assert!(Privilege::Anyone < Privilege::Whitelist);
        assert!(Privilege::Whitelist < Privilege::Operator);
        assert!(Privilege::Operator < Privilege::Admin);
    }

    #[test]
    fn admin_only_resolver_classifies_by_account() {
        let mut b = bot();
        b.admins.insert("zorael".to_owned());
        let mut event = chan_event("hi");
        event.sender.account = Some("zorael".to_owned());
        assert_eq!(AdminOnlyResolver.classify(&b, &event), Privilege::Admin);
        event.sender.account = Some("nobody".to_owned());
        assert_eq!(AdminOnlyResolver.classify(&b, &event), Privilege::Anyone);
    }
}
