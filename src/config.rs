//! The config bridge: an INI-like `[Section]` / `key value` format,
//! melded at startup as defaults → file → CLI (last wins, overwrite-if-set).
//!
//! Plugin sections are modelled as a trait object list so a section whose
//! plugin isn't compiled in is silently dropped on write rather than erroring.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use tern_proto::model::{Bot, Server};

use crate::error::ConfigError;

/// The three core-settings fields that don't belong to `Bot`/`Server`.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreSettings {
    /// Disable ANSI colour in logging output.
    pub monochrome: bool,
    /// Prefer the brighter ANSI variants when colour is used.
    pub bright: bool,
    /// Whether the connection supervisor reconnects after a socket error.
    pub reconnect_on_failure: bool,
}

impl Default for CoreSettings {
    fn default() -> CoreSettings {
        CoreSettings {
            monochrome: false,
            bright: false,
            reconnect_on_failure: true,
        }
    }
}

/// A plugin's persisted settings, round-tripped through its own `[Section]`
/// without the config bridge knowing its field layout.
pub trait ConfigSection {
    /// The `[Section]` header this plugin owns, e.g. `"notes"`.
    fn section_name(&self) -> &'static str;
    /// Flattens this plugin's settings to `key value` pairs for writing.
    fn write_fields(&self) -> Vec<(String, String)>;
    /// Applies `key value` pairs read back from this plugin's section.
    fn read_fields(&mut self, fields: &HashMap<String, String>);
}

/// The melded, not-yet-validated view of every field the config bridge
/// understands. `None` means "not set at this layer".
#[derive(Clone, Debug, Default)]
pub struct ConfigValues {
    pub nickname: Option<String>,
    pub user: Option<String>,
    pub real_name: Option<String>,
    pub account: Option<String>,
    pub account_password: Option<String>,
    pub password: Option<String>,
    pub admins: Option<Vec<String>>,
    pub home_channels: Option<Vec<String>>,
    pub guest_channels: Option<Vec<String>>,
    pub server_address: Option<String>,
    pub port: Option<u16>,
    pub monochrome: Option<bool>,
    pub bright: Option<bool>,
    pub reconnect_on_failure: Option<bool>,
}

impl ConfigValues {
    /// Melds `overlay` onto `self`: every field `overlay` sets wins,
    /// everything else falls through to `self` (defaults → file →
    /// CLI precedence, applied one layer at a time).
    pub fn meld(self, overlay: ConfigValues) -> ConfigValues {
        ConfigValues {
            nickname: overlay.nickname.or(self.nickname),
            user: overlay.user.or(self.user),
            real_name: overlay.real_name.or(self.real_name),
            account: overlay.account.or(self.account),
            account_password: overlay.account_password.or(self.account_password),
            password: overlay.password.or(self.password),
            admins: overlay.admins.or(self.admins),
            home_channels: overlay.home_channels.or(self.home_channels),
            guest_channels: overlay.guest_channels.or(self.guest_channels),
            server_address: overlay.server_address.or(self.server_address),
            port: overlay.port.or(self.port),
            monochrome: overlay.monochrome.or(self.monochrome),
            bright: overlay.bright.or(self.bright),
            reconnect_on_failure: overlay.reconnect_on_failure.or(self.reconnect_on_failure),
        }
    }

    /// Like [`ConfigValues::meld`], but honours the CLI's `-a` flag: when
    /// `append_channels` is set, `overlay`'s channel lists extend `self`'s
    /// instead of replacing them.
    pub fn meld_cli(self, overlay: ConfigValues, append_channels: bool) -> ConfigValues {
        if !append_channels {
            return self.meld(overlay);
        }
        let home_channels = match (self.home_channels.clone(), overlay.home_channels) {
            (Some(mut base), Some(extra)) => {
                base.extend(extra);
                Some(base)
            }
            (base, overlay) => overlay.or(base),
        };
        let guest_channels = match (self.guest_channels.clone(), overlay.guest_channels) {
            (Some(mut base), Some(extra)) => {
                base.extend(extra);
                Some(base)
            }
            (base, overlay) => overlay.or(base),
        };
        let mut melded = self.meld(overlay);
        melded.home_channels = home_channels;
        melded.guest_channels = guest_channels;
        melded
    }

    /// Resolves into a concrete `Bot` + `CoreSettings`, failing if a
    /// required field (nickname, server address) never got set.
    pub fn into_bot_and_settings(self) -> Result<(Bot, CoreSettings), ConfigError> {
        let nickname = self.nickname.ok_or(ConfigError::MissingField { field: "nickname" })?;
        let server_address = self
        .server_address
        .ok_or(ConfigError::MissingField { field: "server" })?;

        let mut server = Server::new(server_address, self.port.unwrap_or(6667));
        server.updated = false;

        let user = self.user.unwrap_or_else(|| nickname.clone());
        let real_name = self.real_name.unwrap_or_else(|| nickname.clone());
        let mut bot = Bot::new(nickname, user, real_name, server);
        bot.account = self.account;
        bot.account_password = self.account_password;
        bot.password = self.password;
        bot.admins = self.admins.unwrap_or_default().into_iter().collect();
        bot.home_channels = self.home_channels.unwrap_or_default().into_iter().collect();
        bot.guest_channels = self.guest_channels.unwrap_or_default().into_iter().collect();

        let core = CoreSettings {
            monochrome: self.monochrome.unwrap_or(false),
            bright: self.bright.unwrap_or(false),
            reconnect_on_failure: self.reconnect_on_failure.unwrap_or(true),
        };

        Ok((bot, core))
    }
}

struct Section {
    name: String,
    fields: Vec<(String, String)>,
}

fn parse_ini(text: &str) -> Result<Vec<Section>, ConfigError> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(ConfigError::Malformed {
                        line: lineno + 1,
                        reason: format!("unterminated section header {:?}", raw_line),
                });
            }
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(Section {
                    name: line[1..line.len() - 1].to_owned(),
                    fields: Vec::new(),
            });
            continue;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let key = parts.next().unwrap_or("").to_owned();
        let value = parts.next().unwrap_or("").trim().to_owned();
        if key.is_empty() {
            return Err(ConfigError::Malformed {
                    line: lineno + 1,
                    reason: format!("expected `key value`, got {:?}", raw_line),
            });
        }
        match current.as_mut() {
            Some(section) => section.fields.push((key, value)),
            None => {
                return Err(ConfigError::Malformed {
                        line: lineno + 1,
                        reason: "key/value line before any [Section] header".to_owned(),
                })
            }
        }
    }
    if let Some(section) = current.take() {
        sections.push(section);
    }
    Ok(sections)
}

const BANNER: &str = "# Generated by tern. Lines for sections of uncompiled plugins are dropped on save.\n";

fn render_ini(sections: &[Section]) -> String {
    let mut out = String::from(BANNER);
    for section in sections {
        out.push('\n');
        out.push('[');
        out.push_str(&section.name);
        out.push_str("]\n");
        let width = section
        .fields
        .iter()
        .map(|(k, _)| k.len())
        .max()
        .unwrap_or(0)
        + 4;
        for (key, value) in &section.fields {
            out.push_str(&format!("{:<width$}{}\n", key, value, width = width));
        }
    }
    out
}

fn split_list(value: &str) -> Vec<String> {
    value
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

fn join_list(values: &[String]) -> String {
    values.join(",")
}

fn lookup(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields.get(key).cloned()
}

/// Reads an INI-like config file into a melded [`ConfigValues`] and hands
/// any unrecognized `[Section]`s to matching plugins by name.
pub fn load(path: &Path, plugins: &mut [Box<dyn ConfigSection>]) -> Result<ConfigValues, ConfigError> {
    let text = fs::read_to_string(path)?;
    let sections = parse_ini(&text)?;

    let mut values = ConfigValues::default();
    for section in &sections {
        let fields: HashMap<String, String> = section.fields.iter().cloned().collect();
        match section.name.as_str() {
            "Bot" => {
                values.nickname = lookup(&fields, "nickname");
                values.user = lookup(&fields, "user");
                values.real_name = lookup(&fields, "realName");
                values.account = lookup(&fields, "account");
                values.account_password = lookup(&fields, "accountPassword");
                values.password = lookup(&fields, "password");
                values.admins = fields.get("admins").map(|v| split_list(v));
                values.home_channels = fields.get("homeChannels").map(|v| split_list(v));
                values.guest_channels = fields.get("guestChannels").map(|v| split_list(v));
            }
            "Server" => {
                values.server_address = lookup(&fields, "address");
                values.port = fields.get("port").and_then(|v| v.parse().ok());
            }
            "Core" => {
                values.monochrome = fields.get("monochrome").and_then(|v| v.parse().ok());
                values.bright = fields.get("bright").and_then(|v| v.parse().ok());
                values.reconnect_on_failure =
                fields.get("reconnectOnFailure").and_then(|v| v.parse().ok());
            }
            name => {
                if let Some(plugin) = plugins.iter_mut().find(|p| p.section_name() == name) {
                    plugin.read_fields(&fields);
                }
            }
        }
    }
    Ok(values)
}

/// Writes `bot`/`core`/plugin sections out, atomically (write to a temp
/// file in the same directory, then rename over `path`). Sections for
/// plugins not present in `plugins` are simply never emitted.
pub fn save(
    path: &Path,
    bot: &Bot,
    core: &CoreSettings,
    plugins: &[Box<dyn ConfigSection>],
) -> Result<(), ConfigError> {
    if bot.admins.is_empty() && bot.home_channels.is_empty() {
        return Err(ConfigError::Incomplete);
    }

    let mut admins: Vec<String> = bot.admins.iter().cloned().collect();
    admins.sort();
    let mut home: Vec<String> = bot.home_channels.iter().cloned().collect();
    home.sort();
    let mut guest: Vec<String> = bot.guest_channels.iter().cloned().collect();
    guest.sort();

    let mut sections = vec![
        Section {
            name: "Bot".to_owned(),
            fields: vec![
                ("nickname".to_owned(), bot.nickname.clone()),
                ("user".to_owned(), bot.user.clone()),
                ("realName".to_owned(), bot.real_name.clone()),
                ("account".to_owned(), bot.account.clone().unwrap_or_default()),
                (
                    "accountPassword".to_owned(),
                    bot.account_password.clone().unwrap_or_default(),
                ),
                ("password".to_owned(), bot.password.clone().unwrap_or_default()),
                ("admins".to_owned(), join_list(&admins)),
                ("homeChannels".to_owned(), join_list(&home)),
                ("guestChannels".to_owned(), join_list(&guest)),
            ],
        },
        Section {
            name: "Server".to_owned(),
            fields: vec![
                ("address".to_owned(), bot.server.address.clone()),
                ("port".to_owned(), bot.server.port.to_string()),
            ],
        },
        Section {
            name: "Core".to_owned(),
            fields: vec![
                ("monochrome".to_owned(), core.monochrome.to_string()),
                ("bright".to_owned(), core.bright.to_string()),
                (
                    "reconnectOnFailure".to_owned(),
                    core.reconnect_on_failure.to_string(),
                ),
            ],
        },
    ];

    for plugin in plugins {
        sections.push(Section {
                name: plugin.section_name().to_owned(),
                fields: plugin.write_fields(),
        });
    }

    let rendered = render_ini(&sections);

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_comments() {
        let text = "# banner\n[Bot]\nnickname kameloso\nadmins zorael,hirr\n";
        let sections = parse_ini(text).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Bot");
        assert_eq!(
            sections[0].fields,
            vec![
                ("nickname".to_owned(), "kameloso".to_owned()),
                ("admins".to_owned(), "zorael,hirr".to_owned()),
            ]
        );
    }

    #[test]
    fn rejects_keyvalue_before_any_section() {
        assert!(parse_ini("nickname kameloso\n").is_err());
    }

    #[test]
    fn meld_prefers_overlay_when_set() {
        let base = ConfigValues {
            nickname: Some("base".to_owned()),
            port: Some(6667),
            ..Default::default()
        };
        let overlay = ConfigValues {
            nickname: Some("overlay".to_owned()),
            ..Default::default()
        };
        let melded = base.meld(overlay);
        assert_eq!(melded.nickname.as_deref(), Some("overlay"));
        assert_eq!(melded.port, Some(6667));
    }

    #[test]
    fn meld_cli_appends_channels_when_requested() {
        let base = ConfigValues {
            home_channels: Some(vec!["#flerrp".to_owned()]),
            ..Default::default()
        };
        let overlay = ConfigValues {
            home_channels: Some(vec!["#garderoben".to_owned()]),
            ..Default::default()
        };
        let melded = base.meld_cli(overlay, true);
        assert_eq!(
            melded.home_channels,
            Some(vec!["#flerrp".to_owned(), "#garderoben".to_owned()])
        );
    }

    #[test]
    fn into_bot_requires_nickname_and_server() {
        let values = ConfigValues::default();
        assert!(matches!(
                values.into_bot_and_settings(),
                Err(ConfigError::MissingField { field: "nickname" })
        ));
    }

    #[test]
    fn round_trips_core_settings_through_load() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("tern-config-test-{:?}.conf", std::thread::current().id()));
        let rendered = "[Bot]\nnickname kameloso\nadmins zorael\nhomeChannels #flerrp\n\
        \n[Server]\naddress irc.freenode.net\nport 6667\n\
        \n[Core]\nmonochrome false\nbright true\nreconnectOnFailure true\n";
        fs::write(&path, rendered).unwrap();

        let mut plugins: Vec<Box<dyn ConfigSection>> = Vec::new();
        let values = load(&path, &mut plugins).unwrap();
        let (bot, core) = values.into_bot_and_settings().unwrap();
        assert_eq!(bot.nickname, "kameloso");
        assert!(bot.is_admin("zorael"));
        assert!(core.bright);

        let _ = fs::remove_file(&path);
    }
}
