//! Conversation histories keyed by thread id.
//!
//! The store is owned by the caller and handed to the agent, so several
//! threads can share one process without global state.

mod memory;
mod message;

pub use memory::MemoryConversationStore;
pub use message::{check_tool_pairing, Message, ToolCallRequest};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A thread's message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Thread identifier.
    pub thread_id: String,
    /// Ordered, append-only messages.
    pub messages: Vec<Message>,
    /// When the first message was appended.
    pub created_at: DateTime<Utc>,
    /// When the last message was appended.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new(thread_id: &str) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Trait for conversation store implementations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Get the messages of a thread. Unknown threads are empty.
    async fn get(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Append messages to a thread, creating it if needed.
    async fn append(&self, thread_id: &str, messages: &[Message]) -> Result<()>;

    /// Drop a thread's history.
    async fn clear(&self, thread_id: &str) -> Result<()>;

    /// Get the full conversation record of a thread.
    async fn conversation(&self, thread_id: &str) -> Result<Option<Conversation>>;
}
