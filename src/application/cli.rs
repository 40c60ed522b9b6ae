use std::env;
use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::application::ui::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::CredentialStoreName;
use crate::infrastructure::credentials::CredentialStoreManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

pub fn log_path() -> path::PathBuf {
    let log_dir = env::var("PARLEY_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("parley")
            .to_string_lossy()
            .to_string();
    });

    return path::PathBuf::from(log_dir).join("debug.log");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn clear_credential() -> Result<()> {
    let name = match CredentialStoreName::parse(Config::get(ConfigKey::CredentialStore)) {
        Some(name) => name,
        None => bail!(format!(
            "Unknown credential store '{}'",
            Config::get(ConfigKey::CredentialStore)
        )),
    };

    let store = CredentialStoreManager::get(name)?;
    store.clear()?;
    println!("Cleared the stored API key ({})", store.name());

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_credential() -> Command {
    return Command::new("credential")
        .about("Manage the stored API key.")
        .subcommand(
            Command::new("clear").about("Expires the stored API key. The next chat will ask for a new one.")
        )
        .subcommand(
            Command::new("path").about("Returns the path of the cookie file holding the API key.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for parley")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running parley with environment variable RUST_LOG=parley")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("PARLEY_MODEL")
        .num_args(1)
        .help("The model to chat with. Prompts with the configured model list if not set.");
}

fn arg_target_url() -> Arg {
    return Arg::new(ConfigKey::TargetURL.to_string())
        .short('u')
        .long(ConfigKey::TargetURL.to_string())
        .env("PARLEY_TARGET_URL")
        .num_args(1)
        .help("The page URL the chat session is about.");
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start a chat session.")
        .arg(arg_model())
        .arg(arg_target_url());
}

fn arg_bool(key: ConfigKey, env: &'static str, help: &str) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(format!("{help} [default: {}]", Config::default(key)))
        .value_parser(PossibleValuesParser::new(["true", "false"]))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("parley")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_credential())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(arg_model())
        .arg(arg_target_url())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("PARLEY_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .long(ConfigKey::ApiURL.to_string())
                .env("PARLEY_API_URL")
                .num_args(1)
                .help(format!("Base URL of the chat backend. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Models.to_string())
                .long(ConfigKey::Models.to_string())
                .env("PARLEY_MODELS")
                .num_args(1)
                .help(format!("Comma separated list of models offered when no model is set. [default: {}]", Config::default(ConfigKey::Models)))
                .global(true),
        )
        .arg(arg_bool(
            ConfigKey::RequireTargetURL,
            "PARLEY_REQUIRE_TARGET_URL",
            "Refuse to start a chat without a target URL.",
        ))
        .arg(arg_bool(
            ConfigKey::InitPage,
            "PARLEY_INIT_PAGE",
            "Ask the backend to load the target URL before the chat starts.",
        ))
        .arg(
            Arg::new(ConfigKey::CredentialStore.to_string())
                .long(ConfigKey::CredentialStore.to_string())
                .env("PARLEY_CREDENTIAL_STORE")
                .num_args(1)
                .help(format!("Where the API key is kept between runs. [default: {}]", Config::default(ConfigKey::CredentialStore)))
                .value_parser(PossibleValuesParser::new(CredentialStoreName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::CredentialFile.to_string())
                .long(ConfigKey::CredentialFile.to_string())
                .env("PARLEY_CREDENTIAL_FILE")
                .num_args(1)
                .help(format!("Cookie file used by the cookie credential store. [default: {}]", Config::default(ConfigKey::CredentialFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::CookieName.to_string())
                .long(ConfigKey::CookieName.to_string())
                .env("PARLEY_COOKIE_NAME")
                .num_args(1)
                .help(format!("Name of the cookie holding the API key. [default: {}]", Config::default(ConfigKey::CookieName)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("PARLEY_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before a request to the backend times out. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_path().to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("credential", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("clear", _)) => {
                    clear_credential()?;
                }
                Some(("path", _)) => {
                    println!("{}", Config::get(ConfigKey::CredentialFile));
                }
                _ => {
                    subcommand_credential().print_long_help()?;
                }
            }
            return Ok(false);
        }
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
