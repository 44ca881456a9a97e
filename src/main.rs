//! Process entry point: parses the command line, melds it with the config
//! file, then either performs a one-shot action (`--settings`,
//! `--writeconfig`, `--version`, `--help`) or hands off to the connection
//! supervisor loop.

use std::process::ExitCode;

use log::Level;

use tern::awareness::Awareness;
use tern::cli::{self, Action};
use tern::config::{self, ConfigSection, ConfigValues};
use tern::dispatch::Dispatcher;
use tern::error::{ConfigError, CoreError};
use tern::logger::StderrLogger;
use tern::message;
use tern::state::StateStore;
use tern::supervisor::{self, AbortFlag};
use tern::throttle::{Throttle, ThrottleParams};

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_INCOMPLETE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let parsed = match cli::parse(args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("tern: {}", err);
            print_usage();
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match parsed.action {
        Action::PrintHelp => {
            print_usage();
            ExitCode::from(EXIT_OK)
        }
        Action::PrintVersion => {
            println!("tern {}", env!("CARGO_PKG_VERSION"));
            ExitCode::from(EXIT_OK)
        }
        _ => match run(parsed).await {
            Ok(code) => ExitCode::from(code),
            Err(err) => {
                eprintln!("tern: {}", err);
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}

/// Everything that needs the config file and (for `Run`) a live connection.
async fn run(parsed: cli::CliArgs) -> Result<u8, CoreError> {
    let mut plugin_sections: Vec<Box<dyn ConfigSection>> = Vec::new();

    let file_values = match config::load(&parsed.config_path, &mut plugin_sections) {
        Ok(values) => values,
        Err(ConfigError::Io(_)) => ConfigValues::default(),
        Err(err) => return Err(CoreError::Config(err)),
    };

    let melded = ConfigValues::default().meld(file_values).meld_cli(parsed.values, parsed.append_channels);

    match parsed.action {
        Action::PrintSettings => {
            let (bot, core) = melded.into_bot_and_settings().map_err(CoreError::Config)?;
            print_settings(&bot, &core);
            Ok(EXIT_OK)
        }
        Action::WriteConfig => {
            let (bot, core) = match melded.into_bot_and_settings() {
                Ok(pair) => pair,
                Err(err @ ConfigError::MissingField { .. }) => {
                    eprintln!("tern: {}", err);
                    return Ok(EXIT_INCOMPLETE);
                }
                Err(err) => return Err(CoreError::Config(err)),
            };
            match config::save(&parsed.config_path, &bot, &core, &plugin_sections) {
                Ok(()) => {
                    println!("wrote {}", parsed.config_path.display());
                    Ok(EXIT_OK)
                }
                Err(err @ ConfigError::Incomplete) => {
                    eprintln!("tern: {}", err);
                    Ok(EXIT_INCOMPLETE)
                }
                Err(err) => Err(CoreError::Config(err)),
            }
        }
        Action::Run => run_bot(melded, &parsed.plugin_overrides).await,
        Action::PrintHelp | Action::PrintVersion => unreachable!("handled in main"),
    }
}

async fn run_bot(melded: ConfigValues, plugin_overrides: &[cli::PluginOverride]) -> Result<u8, CoreError> {
    let (mut bot, core) = melded.into_bot_and_settings().map_err(CoreError::Config)?;

    let _ = StderrLogger::new(Level::Info, core.monochrome, core.bright).install();

    let mut dispatcher = Dispatcher::new();
    dispatcher.register_awareness(Box::new(Awareness::new()));
    for err in dispatcher.start_plugins(&mut bot) {
        log::error!("{}", err);
    }

    let loaded = dispatcher.plugin_names();
    for override_ in plugin_overrides {
        if !loaded.contains(&override_.plugin.as_str()) {
            log::warn!("--set {}.{}: plugin not loaded, ignoring", override_.plugin, override_.option);
        }
    }

    let mut state = StateStore::new();
    let mut throttle = Throttle::new(ThrottleParams::default());
    let (_sender, mut receiver) = message::channel();

    let abort = AbortFlag::new();
    let sigint_abort = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("received interrupt, shutting down");
            sigint_abort.signal();
        }
    });

    let result = supervisor::run(
        &abort,
        &mut bot,
        &mut state,
        &mut dispatcher,
        &mut throttle,
        &mut receiver,
        core.reconnect_on_failure,
    )
    .await;

    for err in dispatcher.teardown_plugins() {
        log::error!("{}", err);
    }

    result.map(|()| EXIT_OK)
}

fn print_settings(bot: &tern_proto::Bot, core: &config::CoreSettings) {
    println!("nickname        {}", bot.nickname);
    println!("user            {}", bot.user);
    println!("realName        {}", bot.real_name);
    println!("server          {}:{}", bot.server.address, bot.server.port);
    let mut admins: Vec<&str> = bot.admins.iter().map(String::as_str).collect();
    admins.sort_unstable();
    println!("admins          {}", admins.join(","));
    let mut home: Vec<&str> = bot.home_channels.iter().map(String::as_str).collect();
    home.sort_unstable();
    println!("homeChannels    {}", home.join(","));
    let mut guest: Vec<&str> = bot.guest_channels.iter().map(String::as_str).collect();
    guest.sort_unstable();
    println!("guestChannels   {}", guest.join(","));
    println!("monochrome      {}", core.monochrome);
    println!("bright          {}", core.bright);
    println!("reconnectOnFailure {}", core.reconnect_on_failure);
}

fn print_usage() {
    println!(
        "\
tern — a modular IRC client/bot framework

USAGE:
    tern [FLAGS]

FLAGS:
    --nickname <name>        bot nickname
    --server <address>       server to connect to
    --port <number>          server port (default 6667)
    --account <name>         services account (`-` clears)
    --password <pass>        services account password (`-` clears)
    --pass <pass>            server registration password (`-` clears)
    --admins <list>          comma-separated admin accounts (`-` clears)
    --homeChannels <list>    comma-separated home channels (`-` clears)
    --guestChannels <list>   comma-separated guest channels (`-` clears)
    -a                       append rather than replace channel-list flags
    --bright                 use brighter ANSI colours in logging
    --monochrome             disable ANSI colour in logging
    --config <path>          config file to read/write (default tern.conf)
    --settings               print the melded settings and exit
    --writeconfig            write the melded config to --config and exit
    --set <plugin.opt=val>   override one plugin's config-file setting
    --version                print the version and exit
    --help                   print this text and exit"
    );
}
