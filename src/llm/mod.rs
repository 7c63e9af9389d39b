//! Chat model backends and tool binding.

mod binder;
mod client;
mod openai_compat;
mod scripted;
mod types;

pub use binder::{bind, BoundModel};
pub use client::{ChatModel, FragmentSink};
pub use openai_compat::OpenAiCompatModel;
pub use scripted::{ScriptedModel, ScriptedReply};
pub use types::{ModelResponse, ResponseMode, ToolSpec};
