//! MCP (Model Context Protocol) client for Taskloop.
//!
//! Launches tool servers as child processes and speaks JSON-RPC 2.0 over
//! their stdio to discover and call tools.

mod client;
mod connector;
pub mod protocol;
mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use client::McpClient;
pub use connector::{tool_set_from_clients, McpConnector};
pub use transport::Transport;
