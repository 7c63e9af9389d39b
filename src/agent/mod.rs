//! The turn loop.
//!
//! An [`Agent`] drives one user turn: it invokes the bound model, runs any
//! requested tools, feeds their results back and repeats until the model
//! answers without tool calls or the hop limit is reached. A [`Session`]
//! wires the agent to the tools established at startup.

mod events;
mod reasoning;
mod runner;
mod session;

pub use events::TurnEvent;
pub use reasoning::{strip_reasoning, ReasoningFilter};
pub use runner::{Agent, AgentResponse, ToolCallRecord, DEFAULT_MAX_HOPS};
pub use session::Session;
