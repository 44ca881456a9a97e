//! The command-line flag contract. Every flag here is also
//! expressible via the config file; `parse` only produces values, it never
//! reads or writes the file itself.

use std::path::PathBuf;

use crate::config::ConfigValues;
use crate::error::CliError;

/// What the CLI asked the process to do, beyond just running the bot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Connect and run normally.
    Run,
    /// Print the melded settings and exit 0.
    PrintSettings,
    /// Write the melded config to `--config` and exit (0, or 2 if
    /// incomplete).
    WriteConfig,
    /// Print the version and exit 0.
    PrintVersion,
    /// Print usage and exit 0.
    PrintHelp,
}

/// A `--set plugin.option=value` override, applied after the plugin's own
/// config-file section is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginOverride {
    pub plugin: String,
    pub option: String,
    pub value: String,
}

/// The parsed result of one command-line invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct CliArgs {
    pub values: ConfigValues,
    pub config_path: PathBuf,
    pub plugin_overrides: Vec<PluginOverride>,
    pub action: Action,
    /// `-a`: the channel-list flags extend the config file's lists instead
    /// of replacing them. Left for the caller to apply when melding, since
    /// only it has the file-layer lists to extend.
    pub append_channels: bool,
}

const CLEAR: &str = "-";

/// Parses `args` (excluding argv\[0\]) per the flag contract.
pub fn parse<I, S>(args: I) -> Result<CliArgs, CliError>
where
I: IntoIterator<Item = S>,
S: Into<String>,
{
    let mut values = ConfigValues::default();
    let mut config_path = PathBuf::from("tern.conf");
    let mut plugin_overrides = Vec::new();
    let mut action = Action::Run;
    let mut append_channels = false;

    let mut iter = args.into_iter().map(Into::into).peekable();
    while let Some(flag) = iter.next() {
        let mut take_value = |flag: &str| -> Result<String, CliError> {
            iter.next().ok_or_else(|| CliError::MissingValue(flag.to_owned()))
        };

        match flag.as_str() {
            "--nickname" => values.nickname = Some(take_value(&flag)?),
            "--server" => values.server_address = Some(take_value(&flag)?),
            "--port" => {
                let raw = take_value(&flag)?;
                values.port = Some(raw.parse().map_err(|_| CliError::NotANumber {
                            flag: "--port".to_owned(),
                            value: raw,
                    })?);
            }
            "--account" => values.account = Some(clearable(take_value(&flag)?)),
            "--password" => values.account_password = Some(clearable(take_value(&flag)?)),
            "--pass" => values.password = Some(clearable(take_value(&flag)?)),
            "--admins" => values.admins = Some(clearable_list(take_value(&flag)?)),
            "--homeChannels" => values.home_channels = Some(clearable_list(take_value(&flag)?)),
            "--guestChannels" => values.guest_channels = Some(clearable_list(take_value(&flag)?)),
            "-a" => append_channels = true,
            "--bright" => values.bright = Some(true),
            "--monochrome" => values.monochrome = Some(true),
            "--config" => config_path = PathBuf::from(take_value(&flag)?),
            "--settings" => action = Action::PrintSettings,
            "--writeconfig" => action = Action::WriteConfig,
            "--version" => action = Action::PrintVersion,
            "--help" => action = Action::PrintHelp,
            "--set" => {
                let raw = take_value(&flag)?;
                plugin_overrides.push(parse_set(&raw)?);
            }
            other => return Err(CliError::UnknownFlag(other.to_owned())),
        }
    }

    Ok(CliArgs {
            values,
            config_path,
            plugin_overrides,
            action,
            append_channels,
    })
}

fn clearable(value: String) -> String {
    if value == CLEAR {
        String::new()
    } else {
        value
    }
}

fn clearable_list(value: String) -> Vec<String> {
    if value == CLEAR {
        Vec::new()
    } else {
        value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect()
    }
}

fn parse_set(raw: &str) -> Result<PluginOverride, CliError> {
    let (left, value) = raw
    .split_once('=')
    .ok_or_else(|| CliError::MalformedSet(raw.to_owned()))?;
    let (plugin, option) = left
    .split_once('.')
    .ok_or_else(|| CliError::MalformedSet(raw.to_owned()))?;
    if plugin.is_empty() || option.is_empty() {
        return Err(CliError::MalformedSet(raw.to_owned()));
    }
    Ok(PluginOverride {
            plugin: plugin.to_owned(),
            option: option.to_owned(),
            value: value.to_owned(),
    })
}
