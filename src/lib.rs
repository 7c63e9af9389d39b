//! taskloop - a tool-calling chat agent over MCP servers
//!
//! Connects an OpenAI-compatible chat model (a local Ollama model by default)
//! to the tools of one or more Model Context Protocol servers, such as a
//! Google Tasks server, and runs the agent loop between them.
//!
//! # Overview
//!
//! taskloop allows you to:
//! - Launch MCP servers as child processes and discover their tools
//! - Offer those tools to a chat model and execute the calls it requests
//! - Keep multi-turn conversations per thread id
//! - Stream answers and tool activity to the terminal
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `mcp` - MCP client over child process stdio
//! - `tools` - Tool descriptors and the connector contract
//! - `llm` - Chat model backends and tool binding
//! - `conversation` - Message histories keyed by thread
//! - `agent` - The turn loop and sessions
//! - `cli` - Command line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskloop::agent::Session;
//! use taskloop::config::Settings;
//! use taskloop::conversation::MemoryConversationStore;
//! use taskloop::llm::{OpenAiCompatModel, ResponseMode};
//! use taskloop::mcp::McpConnector;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let model = Arc::new(OpenAiCompatModel::new(&settings.model)?);
//!     let connector = McpConnector::new(settings.servers.clone());
//!     let store = Arc::new(MemoryConversationStore::new());
//!
//!     let session =
//!         Session::start(&connector, model, store, &settings.agent, ResponseMode::Complete).await?;
//!     let response = session
//!         .agent()
//!         .run_turn("my-thread", "What tasks do I have due this week?", |_| {})
//!         .await;
//!     session.shutdown().await;
//!
//!     println!("{}", response?.content);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod openai;
pub mod tools;

pub use error::{Result, TaskloopError};
