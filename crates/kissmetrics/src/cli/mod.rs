//! Command-line interface for the `kmtrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{AliasCommand, ConfigCommand, RecordCommand, SetCommand};

use crate::config::TrackerConfig;
use crate::logging::Verbosity;

/// kmtrack - Send tracking calls to KISSmetrics
#[derive(Debug, Parser)]
#[command(name = "kmtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// API key (overrides configuration)
    #[arg(short, long, global = true, env = "KISSMETRICS_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Tracker host (overrides configuration)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Tracker port (overrides configuration)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set properties on a person without recording an event
    Set(SetCommand),

    /// Record an event for a person
    Record(RecordCommand),

    /// Alias a person to one or more identities
    Alias(AliasCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }

    /// Apply `--key`, `--host` and `--port` on top of loaded settings.
    #[must_use]
    pub fn apply_overrides(&self, mut tracker: TrackerConfig) -> TrackerConfig {
        if let Some(key) = &self.key {
            tracker.key.clone_from(key);
        }
        if let Some(host) = &self.host {
            tracker.host.clone_from(host);
        }
        if let Some(port) = self.port {
            tracker.port = port;
        }
        tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyValue;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "kmtrack");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["kmtrack", "-q", "config", "path"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["kmtrack", "config", "path"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["kmtrack", "-v", "config", "path"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["kmtrack", "-vv", "config", "path"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_record_with_properties() {
        let cli = parse(&[
            "kmtrack", "record", "bob", "Signed Up", "-p", "Plan=Pro", "--prop", "seats=3",
        ]);
        let Command::Record(cmd) = cli.command else {
            panic!("expected record command");
        };
        assert_eq!(cmd.person, "bob");
        assert_eq!(cmd.event, "Signed Up");

        let props = cmd.property_map();
        assert_eq!(props["Plan"], PropertyValue::from("Pro"));
        assert_eq!(props["seats"], PropertyValue::Integer(3));
    }

    #[test]
    fn test_parse_record_without_properties() {
        let cli = parse(&["kmtrack", "record", "bob", "Visited"]);
        let Command::Record(cmd) = cli.command else {
            panic!("expected record command");
        };
        assert!(cmd.property_map().is_empty());
    }

    #[test]
    fn test_parse_set() {
        let cli = parse(&["kmtrack", "set", "bob", "-p", "Gender=F"]);
        let Command::Set(cmd) = cli.command else {
            panic!("expected set command");
        };
        assert_eq!(cmd.person, "bob");
        assert_eq!(cmd.property_map()["Gender"], PropertyValue::from("F"));
    }

    #[test]
    fn test_parse_set_rejects_bad_property() {
        let result = Cli::try_parse_from(["kmtrack", "set", "bob", "-p", "novalue"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_alias() {
        let cli = parse(&["kmtrack", "alias", "bob", "bob@example.com", "robert", "--detailed"]);
        let Command::Alias(cmd) = cli.command else {
            panic!("expected alias command");
        };
        assert_eq!(cmd.aliases, vec!["bob@example.com", "robert"]);
        assert!(cmd.detailed);
    }

    #[test]
    fn test_parse_alias_requires_an_alias() {
        assert!(Cli::try_parse_from(["kmtrack", "alias", "bob"]).is_err());
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["kmtrack", "-c", "/custom/config.toml", "config", "show"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_apply_overrides() {
        let cli = parse(&[
            "kmtrack", "--key", "k2", "--host", "localhost", "--port", "8080", "config", "path",
        ]);
        let tracker = cli.apply_overrides(TrackerConfig::new("k1"));

        assert_eq!(tracker.key, "k2");
        assert_eq!(tracker.host, "localhost");
        assert_eq!(tracker.port, 8080);
    }

    #[test]
    fn test_apply_overrides_keeps_unset_fields() {
        let cli = parse(&["kmtrack", "--port", "81", "config", "path"]);
        let base = TrackerConfig::new("k1").with_host("tracker.internal");
        let tracker = cli.apply_overrides(base);

        assert_eq!(tracker.host, "tracker.internal");
        assert_eq!(tracker.port, 81);
    }
}
