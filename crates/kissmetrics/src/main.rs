//! `kmtrack` - CLI for the KISSmetrics tracking client
//!
//! Sends one-off tracking calls from the command line, using the same
//! configuration sources as the library.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use kissmetrics::cli::{AliasCommand, Cli, Command, ConfigCommand, RecordCommand, SetCommand};
use kissmetrics::{init_logging, Client, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match &cli.command {
        Command::Set(cmd) => handle_set(&cli, &config, cmd).await,
        Command::Record(cmd) => handle_record(&cli, &config, cmd).await,
        Command::Alias(cmd) => handle_alias(&cli, &config, cmd).await,
        Command::Config(cmd) => handle_config(&cli, &config, cmd),
    }
}

fn build_client(cli: &Cli, config: &Config) -> anyhow::Result<Client> {
    let tracker = cli.apply_overrides(config.tracker.clone());
    Client::new(tracker).context("building tracking client")
}

async fn handle_set(cli: &Cli, config: &Config, cmd: &SetCommand) -> anyhow::Result<()> {
    let client = build_client(cli, config)?;
    client
        .set_properties(&cmd.person, &cmd.property_map())
        .await
        .with_context(|| format!("setting properties on '{}'", cmd.person))?;

    if !cli.quiet {
        println!("Set {} properties on {}", cmd.properties.len(), cmd.person);
    }
    Ok(())
}

async fn handle_record(cli: &Cli, config: &Config, cmd: &RecordCommand) -> anyhow::Result<()> {
    let client = build_client(cli, config)?;
    let properties = cmd.property_map();

    let result = if properties.is_empty() {
        client.record(&cmd.person, &cmd.event).await
    } else {
        client
            .record_with_properties(&cmd.person, &cmd.event, &properties)
            .await
    };
    result.with_context(|| format!("recording '{}' for '{}'", cmd.event, cmd.person))?;

    if !cli.quiet {
        println!("Recorded \"{}\" for {}", cmd.event, cmd.person);
    }
    Ok(())
}

async fn handle_alias(cli: &Cli, config: &Config, cmd: &AliasCommand) -> anyhow::Result<()> {
    let client = build_client(cli, config)?;

    if !cmd.detailed {
        client
            .alias(&cmd.person, cmd.aliases.clone())
            .await
            .with_context(|| format!("aliasing '{}'", cmd.person))?;
        if !cli.quiet {
            println!("Aliased {} to {} identities", cmd.person, cmd.aliases.len());
        }
        return Ok(());
    }

    let report = client.alias_detailed(&cmd.person, cmd.aliases.clone()).await;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!("ok      {}", outcome.alias),
            Err(err) => println!("failed  {}: {err}", outcome.alias),
        }
    }
    report
        .into_result()
        .with_context(|| format!("aliasing '{}'", cmd.person))
}

fn handle_config(cli: &Cli, config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut shown = config.clone();
            shown.tracker = cli.apply_overrides(shown.tracker);
            if !shown.tracker.key.is_empty() {
                shown.tracker.key = "********".to_string();
            }

            if *json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                let tracker = &shown.tracker;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Tracker]");
                println!(
                    "  Key:                {}",
                    if tracker.key.is_empty() { "(not set)" } else { tracker.key.as_str() }
                );
                println!("  Host:               {}", tracker.host);
                println!("  Port:               {}", tracker.port);
                match tracker.timeout_ms {
                    Some(ms) => println!("  Timeout (ms):       {ms}"),
                    None => println!("  Timeout (ms):       (transport default)"),
                }
                println!("  Timestamp policy:   {:?}", tracker.timestamp_policy);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
