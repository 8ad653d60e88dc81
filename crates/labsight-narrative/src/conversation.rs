//! Bounded in-memory conversation history keyed by session id.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use labsight_core::SessionLimits;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::types::ChatMessage;

/// One session's exchanged messages.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    last_used: Instant,
}

impl Conversation {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            last_used: Instant::now(),
        }
    }

    /// Number of user/assistant pairs.
    pub fn turns(&self) -> usize {
        self.messages.len() / 2
    }

    fn push_turn(&mut self, user: &str, assistant: &str, max_turns: usize) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));
        let excess = self.turns().saturating_sub(max_turns);
        if excess > 0 {
            self.messages.drain(..excess * 2);
        }
        self.last_used = Instant::now();
    }
}

/// Thread-safe session table with size, length and idle bounds.
pub struct ConversationStore {
    sessions: Mutex<HashMap<String, Conversation>>,
    limits: SessionLimits,
}

impl ConversationStore {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            limits,
        }
    }

    fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.limits.idle_ttl_secs)
    }

    fn is_expired(&self, conversation: &Conversation) -> bool {
        conversation.last_used.elapsed() >= self.idle_ttl()
    }

    /// Resolve the session to use: the given id if it is still live,
    /// otherwise a fresh one.
    pub fn open(&self, requested: Option<&str>) -> String {
        let mut sessions = self.sessions.lock();
        let ttl = self.idle_ttl();
        sessions.retain(|_, c| c.last_used.elapsed() < ttl);

        if let Some(id) = requested.filter(|id| !id.trim().is_empty()) {
            if let Some(conversation) = sessions.get_mut(id) {
                conversation.last_used = Instant::now();
                return id.to_string();
            }
        }

        while sessions.len() >= self.limits.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, c)| c.last_used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    debug!("Evicting conversation {}", id);
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let id = requested
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        sessions.insert(id.clone(), Conversation::new());
        id
    }

    /// Prior messages for a session, empty when unknown or expired.
    pub fn history(&self, id: &str) -> Vec<ChatMessage> {
        let sessions = self.sessions.lock();
        sessions
            .get(id)
            .filter(|c| !self.is_expired(c))
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    /// Append a completed exchange. Unknown sessions are ignored.
    pub fn record(&self, id: &str, user: &str, assistant: &str) {
        let mut sessions = self.sessions.lock();
        if let Some(conversation) = sessions.get_mut(id) {
            conversation.push_turn(user, assistant, self.limits.max_turns);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_sessions: usize, max_turns: usize, idle_ttl_secs: u64) -> SessionLimits {
        SessionLimits {
            max_sessions,
            max_turns,
            idle_ttl_secs,
        }
    }

    #[test]
    fn test_open_creates_and_reuses() {
        let store = ConversationStore::new(SessionLimits::default());
        let id = store.open(None);
        assert!(!id.is_empty());
        assert_eq!(store.open(Some(&id)), id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_accumulates() {
        let store = ConversationStore::new(SessionLimits::default());
        let id = store.open(None);
        store.record(&id, "I have a headache", "Possibly migraine");
        store.record(&id, "It started yesterday", "Visit a neurologist");

        let history = store.history(&id);
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], ChatMessage::user("I have a headache"));
        assert_eq!(history[3], ChatMessage::assistant("Visit a neurologist"));
    }

    #[test]
    fn test_oldest_turns_dropped() {
        let store = ConversationStore::new(limits(4, 2, 60));
        let id = store.open(None);
        for i in 0..5 {
            store.record(&id, &format!("q{}", i), &format!("a{}", i));
        }
        let history = store.history(&id);
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "q3");
        assert_eq!(history[3].content, "a4");
    }

    #[test]
    fn test_least_recent_session_evicted() {
        let store = ConversationStore::new(limits(2, 5, 60));
        let first = store.open(None);
        std::thread::sleep(Duration::from_millis(5));
        let second = store.open(None);
        std::thread::sleep(Duration::from_millis(5));
        let third = store.open(None);

        assert_eq!(store.len(), 2);
        assert!(store.history(&first).is_empty());
        assert_eq!(store.open(Some(&second)), second);
        assert_eq!(store.open(Some(&third)), third);
    }

    #[test]
    fn test_zero_ttl_never_reuses() {
        let store = ConversationStore::new(limits(4, 5, 0));
        let id = store.open(None);
        store.record(&id, "q", "a");
        assert!(store.history(&id).is_empty());
        // A requested id that expired is recreated empty.
        assert_eq!(store.open(Some(&id)), id);
        assert!(store.history(&id).is_empty());
    }

    #[test]
    fn test_unknown_session_record_ignored() {
        let store = ConversationStore::new(SessionLimits::default());
        store.record("missing", "q", "a");
        assert!(store.is_empty());
    }
}
