//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::properties::{parse_property, Properties, PropertyValue};

/// Set properties on a person.
#[derive(Debug, Args)]
pub struct SetCommand {
    /// Identity of the person
    pub person: String,

    /// Property to set, as KEY=VALUE (repeatable)
    #[arg(short = 'p', long = "prop", value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, PropertyValue)>,
}

/// Record an event.
#[derive(Debug, Args)]
pub struct RecordCommand {
    /// Identity of the person doing the event
    pub person: String,

    /// Name of the event
    pub event: String,

    /// Property to set alongside the event, as KEY=VALUE (repeatable)
    #[arg(short = 'p', long = "prop", value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, PropertyValue)>,
}

/// Alias a person to other identities.
#[derive(Debug, Args)]
pub struct AliasCommand {
    /// Identity of the person
    pub person: String,

    /// Aliases to attach
    #[arg(required = true)]
    pub aliases: Vec<String>,

    /// Report the outcome of every alias instead of the first failure
    #[arg(short, long)]
    pub detailed: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to configuration file (uses default if not specified)
        file: Option<PathBuf>,
    },
}

impl SetCommand {
    /// Collect the repeated `--prop` arguments; later keys win.
    #[must_use]
    pub fn property_map(&self) -> Properties {
        self.properties.iter().cloned().collect()
    }
}

impl RecordCommand {
    /// Collect the repeated `--prop` arguments; later keys win.
    #[must_use]
    pub fn property_map(&self) -> Properties {
        self.properties.iter().cloned().collect()
    }
}
