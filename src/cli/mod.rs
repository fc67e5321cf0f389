//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "virtual-ta",
    version,
    author = "neur0map",
    about = "Answers course questions from course content and forum posts",
    long_about = "Virtual TA indexes course content and forum discussions with sentence embeddings \
                  and answers student questions with an extracted answer and links to the \
                  supporting posts, from the command line or over HTTP."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/virtual-ta/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Build the knowledge base before accepting requests
        #[arg(long)]
        warm: bool,
    },

    /// Answer a single question
    Ask {
        /// Question to ask
        question: String,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the knowledge base and print its statistics
    Index {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the documents nearest to a query
    Search {
        /// Search query text
        query: String,

        /// Number of documents to return
        #[arg(short, long, default_value = "5")]
        k: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Write the default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
