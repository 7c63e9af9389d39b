//! In-memory conversation store.
//!
//! Histories live for the lifetime of the process.

use super::{check_tool_pairing, Conversation, ConversationStore, Message};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory conversation store.
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl MemoryConversationStore {
    /// Create a new in-memory conversation store.
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get(&self, thread_id: &str) -> Result<Vec<Message>> {
        let conversations = self.conversations.read().unwrap();
        Ok(conversations
            .get(thread_id)
            .map(|c| c.messages.clone())
            .unwrap_or_default())
    }

    async fn append(&self, thread_id: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut conversations = self.conversations.write().unwrap();
        let stored = conversations
            .get(thread_id)
            .map(|c| c.messages.as_slice())
            .unwrap_or_default();

        // Pairing restarts at every non-tool message, so only the open batch matters.
        let open = stored
            .iter()
            .rposition(|m| !matches!(m, Message::Tool { .. }))
            .map_or(stored, |start| &stored[start..]);
        let candidate: Vec<Message> = open.iter().chain(messages).cloned().collect();
        check_tool_pairing(&candidate)?;

        let conversation = conversations
            .entry(thread_id.to_string())
            .or_insert_with(|| Conversation::new(thread_id));
        conversation.messages.extend_from_slice(messages);
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn clear(&self, thread_id: &str) -> Result<()> {
        let mut conversations = self.conversations.write().unwrap();
        conversations.remove(thread_id);
        Ok(())
    }

    async fn conversation(&self, thread_id: &str) -> Result<Option<Conversation>> {
        let conversations = self.conversations.read().unwrap();
        Ok(conversations.get(thread_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ToolCallRequest;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_unknown_thread_is_empty() {
        let store = MemoryConversationStore::new();
        assert!(store.get("nope").await.unwrap().is_empty());
        assert!(store.conversation("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_is_ordered_and_scoped_by_thread() {
        let store = MemoryConversationStore::new();
        assert_ok!(store.append("a", &[Message::user("one")]).await);
        assert_ok!(store.append("b", &[Message::user("other")]).await);
        assert_ok!(store.append("a", &[Message::assistant("two")]).await);

        let a = store.get("a").await.unwrap();
        assert_eq!(a, vec![Message::user("one"), Message::assistant("two")]);
        assert_eq!(store.get("b").await.unwrap().len(), 1);

        let conversation = store.conversation("a").await.unwrap().unwrap();
        assert!(conversation.updated_at >= conversation.created_at);
    }

    #[tokio::test]
    async fn test_clear_only_affects_one_thread() {
        let store = MemoryConversationStore::new();
        store.append("a", &[Message::user("one")]).await.unwrap();
        store.append("b", &[Message::user("two")]).await.unwrap();

        store.clear("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_empty());
        assert_eq!(store.get("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_rejects_unpaired_tool_result() {
        let store = MemoryConversationStore::new();
        store.append("a", &[Message::user("hi")]).await.unwrap();

        assert_err!(
            store
                .append("a", &[Message::tool_result("ghost", "list_tasks", "[]", false)])
                .await
        );
        // Rejected appends leave the history untouched.
        assert_eq!(store.get("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_first_append_creates_no_thread() {
        let store = MemoryConversationStore::new();
        assert_err!(
            store
                .append("a", &[Message::tool_result("ghost", "list_tasks", "[]", false)])
                .await
        );
        assert!(store.conversation("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pairing_checks_against_open_batch_only() {
        let store = MemoryConversationStore::new();
        let first = ToolCallRequest::new("call_1", "list_tasks", "{}");
        store
            .append("a", &[Message::user("hi"), Message::assistant_with_tools("", vec![first])])
            .await
            .unwrap();
        store
            .append("a", &[Message::tool_result("call_1", "list_tasks", "[]", false)])
            .await
            .unwrap();
        store.append("a", &[Message::assistant("Nothing.")]).await.unwrap();

        // The earlier request is answered and closed by the assistant reply.
        assert_err!(
            store
                .append("a", &[Message::tool_result("call_1", "list_tasks", "[]", false)])
                .await
        );

        let second = ToolCallRequest::new("call_2", "list_tasks", "{}");
        store
            .append("a", &[Message::assistant_with_tools("", vec![second])])
            .await
            .unwrap();
        assert_ok!(
            store
                .append("a", &[Message::tool_result("call_2", "list_tasks", "[]", false)])
                .await
        );
        assert_eq!(store.get("a").await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_append_accepts_result_for_stored_request() {
        let store = MemoryConversationStore::new();
        let request = ToolCallRequest::new("call_1", "list_tasks", "{}");
        store
            .append("a", &[Message::assistant_with_tools("", vec![request])])
            .await
            .unwrap();
        assert_ok!(
            store
                .append("a", &[Message::tool_result("call_1", "list_tasks", "[]", false)])
                .await
        );
    }
}
