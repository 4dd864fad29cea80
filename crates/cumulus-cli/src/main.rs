//! cumulus — command-line client for the Cumulus cloud storage service.

mod cmd;

use anyhow::{Context, Result};
use cumulus_client::{ClientConfig, CloudClient};

fn print_usage() {
    println!("Usage: cumulus [--config <path>] [--debug] <command>");
    println!();
    println!("Commands:");
    println!("  init                       Write a default config file if none exists");
    println!("  login [user]               Log in and print the session auth token");
    println!("                             (user defaults to session_user from the config)");
    println!("  list <cloud-path>          List a cloud directory");
    println!("  send <local> <cloud-path>  Upload a file");
    println!("  get <cloud-path> <local>   Download a file");
    println!();
    println!("Options:");
    println!("  --config <path>   Config file (default: ~/.config/cumulus/config.toml)");
    println!("  --debug           Verbose protocol logging");
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "cumulus_cli=debug,cumulus_client=debug,cumulus_core=debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse options
    let mut config_path: Option<String> = None;
    let mut debug = false;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = Some(
                    args.get(i)
                        .context("--config requires a value")?
                        .clone(),
                );
            }
            "--debug" => debug = true,
            other => remaining.push(other),
        }
        i += 1;
    }

    init_tracing(debug);

    // init runs before any config is required.
    if matches!(remaining.as_slice(), ["init"]) {
        return cmd::init();
    }

    let config = match &config_path {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    let session_user = config.session_user.clone();
    let mut client = CloudClient::new(config)?;

    match remaining.as_slice() {
        ["login"] if !session_user.is_empty() => cmd::login::run(&mut client, &session_user),
        ["login", user] => cmd::login::run(&mut client, user),
        ["login"] => {
            eprintln!("login: no user given and no session_user in the config");
            std::process::exit(1);
        }
        ["list", path] => cmd::list::run(&mut client, path),
        ["send", local, remote] => cmd::send::run(&mut client, local, remote),
        ["get", remote, local] => cmd::get::run(&mut client, remote, local),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
