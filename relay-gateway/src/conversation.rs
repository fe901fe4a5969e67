//! Per-user conversation memory.
//!
//! Logs live only for the lifetime of the process. A user never seen before
//! simply has an empty log; it is created on the first append.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant (AI) response
    Assistant,
    /// System instruction
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered messages of one user, oldest first.
pub type ConversationLog = Vec<Message>;

/// Outcome of clearing a user's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The user had a log and it is now empty.
    Cleared,
    /// The user was never seen; nothing changed.
    NotFound,
}

/// In-memory mapping from user id to conversation log.
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    logs: Arc<RwLock<HashMap<String, ConversationLog>>>,
    turn_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of a user's log, creating the log if absent.
    pub async fn append(&self, user_id: &str, message: Message) {
        let mut logs = self.logs.write().await;
        logs.entry(user_id.to_string()).or_default().push(message);
    }

    /// Append a message and return a snapshot of the whole log, atomically.
    pub async fn append_and_get(&self, user_id: &str, message: Message) -> ConversationLog {
        let mut logs = self.logs.write().await;
        let log = logs.entry(user_id.to_string()).or_default();
        log.push(message);
        log.clone()
    }

    /// Snapshot of a user's log; empty for unknown users.
    pub async fn get(&self, user_id: &str) -> ConversationLog {
        self.logs
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Reset a user's log to empty, keeping the key.
    pub async fn clear(&self, user_id: &str) -> ClearOutcome {
        let mut logs = self.logs.write().await;
        match logs.get_mut(user_id) {
            Some(log) => {
                log.clear();
                ClearOutcome::Cleared
            }
            None => ClearOutcome::NotFound,
        }
    }

    /// Whether the user has ever been written to.
    pub async fn contains(&self, user_id: &str) -> bool {
        self.logs.read().await.contains_key(user_id)
    }

    /// Acquire the turn lock of a user.
    ///
    /// Held for a whole chat turn so that turns of the same user never
    /// interleave. Turns of different users do not contend.
    pub async fn turn_lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.turn_locks.lock().await;
            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn unknown_user_has_empty_log() {
        let store = ConversationStore::new();
        assert!(store.get("nobody").await.is_empty());
        assert!(!store.contains("nobody").await);
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let store = ConversationStore::new();
        store.append("u1", Message::user("first")).await;
        store.append("u1", Message::assistant("second")).await;
        store.append("u1", Message::user("third")).await;

        let log = store.get("u1").await;
        let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
        assert_eq!(log[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = ConversationStore::new();
        store.append("alice", Message::user("hi from alice")).await;
        store.append("bob", Message::user("hi from bob")).await;

        assert_eq!(store.get("alice").await.len(), 1);
        assert_eq!(store.get("bob").await[0].content, "hi from bob");
    }

    #[tokio::test]
    async fn append_and_get_returns_full_log() {
        let store = ConversationStore::new();
        store.append("u1", Message::user("one")).await;
        let log = store.append_and_get("u1", Message::user("two")).await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, "two");
    }

    #[tokio::test]
    async fn clear_distinguishes_unknown_users() {
        let store = ConversationStore::new();
        assert_eq!(store.clear("ghost").await, ClearOutcome::NotFound);
        assert!(!store.contains("ghost").await);

        store.append("u1", Message::user("hello")).await;
        assert_eq!(store.clear("u1").await, ClearOutcome::Cleared);
        assert!(store.get("u1").await.is_empty());
        assert!(store.contains("u1").await);

        // Clearing an already-empty but known log still succeeds.
        assert_eq!(store.clear("u1").await, ClearOutcome::Cleared);

        store.append("u1", Message::user("again")).await;
        assert_eq!(store.get("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let store = ConversationStore::new();
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append("shared", Message::user(format!("m{i}"))).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get("shared").await.len(), 50);
    }

    #[tokio::test]
    async fn turn_lock_serializes_same_user() {
        let store = ConversationStore::new();
        let guard = store.turn_lock("u1").await;

        let other = store.clone();
        let blocked = tokio::time::timeout(Duration::from_millis(50), async move {
            other.turn_lock("u1").await;
        })
        .await;
        assert!(blocked.is_err());

        // A different user is not blocked.
        let free = tokio::time::timeout(Duration::from_millis(50), store.turn_lock("u2")).await;
        assert!(free.is_ok());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(50), store.turn_lock("u1")).await;
        assert!(reacquired.is_ok());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
        assert_eq!(Role::System.to_string(), "system");
    }
}
