//! CLI definitions using clap.

use crate::config::{
    AuthMode, DEFAULT_BIND, DEFAULT_BUCKET, DEFAULT_MAX_BODY_BYTES, DEFAULT_STORAGE_URL,
    ServerConfig,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// YouSoul - a mood-aware task board server
#[derive(Parser, Debug)]
#[command(name = "yousoul", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: $YOUSOUL_DB, else ~/.yousoul/data/yousoul.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Create the database and apply the schema
    Init {
        /// Recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "YOUSOUL_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Base URL of the object storage gateway
    #[arg(long, env = "YOUSOUL_STORAGE_URL", default_value = DEFAULT_STORAGE_URL)]
    pub storage_url: String,

    /// Shared secret for signing storage URLs
    #[arg(long, env = "YOUSOUL_STORAGE_SECRET", default_value = "", hide_env_values = true)]
    pub storage_secret: String,

    /// Bucket holding reflection photos
    #[arg(long, env = "YOUSOUL_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// How callers are identified
    #[arg(long, value_enum, env = "YOUSOUL_AUTH", default_value_t)]
    pub auth: AuthMode,

    /// Bearer tokens as `token=user_id` pairs, comma separated
    #[arg(long, env = "YOUSOUL_TOKENS", hide_env_values = true)]
    pub tokens: Option<String>,

    /// Maximum request body size in bytes
    #[arg(long, env = "YOUSOUL_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl From<&ServeArgs> for ServerConfig {
    fn from(args: &ServeArgs) -> Self {
        Self {
            bind: args.bind.clone(),
            storage_url: args.storage_url.clone(),
            storage_secret: args.storage_secret.clone(),
            bucket: args.bucket.clone(),
            auth: args.auth,
            tokens: args.tokens.clone(),
            max_body_bytes: args.max_body_bytes,
        }
    }
}
