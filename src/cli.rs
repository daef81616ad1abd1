use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{Protocol, ResourceType};

/// Proxyform - schema-driven configuration forms for reverse-proxy resources
#[derive(Parser, Debug, Clone)]
#[command(name = "proxyform", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "PROXYFORM_CONFIG", default_value = "proxyform.toml", global = true)]
    pub config: PathBuf,

    /// Directory containing `{protocol}_{type}` schema documents
    #[arg(long, env = "PROXYFORM_SCHEMAS_DIR", global = true)]
    pub schemas_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the dereferenced schema (or one oneOf branch) as JSON
    Resolve {
        #[arg(short, long)]
        protocol: Protocol,
        #[arg(short = 't', long = "type")]
        resource_type: ResourceType,
        /// Branch key such as a service subtype or middleware type
        #[arg(short, long)]
        subtype: Option<String>,
    },

    /// Print the form description for a schema and an optional value
    Render {
        #[arg(short, long)]
        protocol: Protocol,
        #[arg(short = 't', long = "type")]
        resource_type: ResourceType,
        #[arg(short, long)]
        subtype: Option<String>,
        /// JSON or YAML file with the current configuration
        #[arg(long)]
        value: Option<PathBuf>,
        #[arg(long)]
        readonly: bool,
        /// Also resolve picker options through the catalogue
        #[arg(long)]
        with_options: bool,
    },

    /// Set (or delete, without --json) the value at a path and print the new tree
    Set {
        #[arg(long)]
        value: PathBuf,
        /// Dotted path such as `loadBalancer.servers[0].url`
        #[arg(long)]
        path: String,
        #[arg(long)]
        json: Option<String>,
    },

    /// Print the expression of a serialised rule draft
    Rule {
        #[arg(long)]
        draft: PathBuf,
    },

    /// List the schema documents available in the schema directory
    Schemas,
}
