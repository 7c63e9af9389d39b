//! CLI module for taskloop.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{Output, TurnRenderer};

use clap::{Parser, Subcommand};

/// taskloop - Chat with a local model that manages your tasks through MCP tools
///
/// Connects to the configured MCP servers, offers their tools to an
/// OpenAI-compatible model (Ollama by default) and runs the tool calling loop.
#[derive(Parser, Debug)]
#[command(name = "taskloop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TASKLOOP_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Conversation thread to use
        #[arg(short, long)]
        thread: Option<String>,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,

        /// Print each answer once complete instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },

    /// Run a single prompt and print the answer
    Run {
        /// The prompt to send (e.g., "Add a task to buy milk due the 25th")
        prompt: String,

        /// Conversation thread to use
        #[arg(short, long)]
        thread: Option<String>,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,

        /// Stream the answer and show tool calls as they happen
        #[arg(short, long)]
        stream: bool,
    },

    /// List the tools exposed by the configured servers
    Tools,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current configuration to the configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
