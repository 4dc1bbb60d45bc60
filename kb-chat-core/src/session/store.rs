//! In-memory session store

use super::turn::{Role, Turn};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Maximum number of turns kept per session
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Owns every session's conversation history.
///
/// A single lock guards the whole map. Every operation is a short in-memory
/// critical section, and the lock is never held across an await point.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Vec<Turn>>>,
    max_history: usize,
}

impl SessionStore {
    /// Create a store keeping at most `max_history` turns per session
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_history: max_history.max(1),
        }
    }

    /// Retention bound applied on every append
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Get the history of a session, oldest turn first.
    ///
    /// An unknown session is created empty, so the first read of an id makes
    /// it show up in [`SessionStore::list_sessions`].
    pub fn get_history(&self, session_id: &str) -> Vec<Turn> {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", session_id);
                Vec::new()
            })
            .clone()
    }

    /// Append a single turn
    pub fn append(&self, session_id: &str, role: Role, content: impl Into<String>) {
        let mut sessions = self.sessions.lock();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Turn::new(role, content));
        truncate(history, self.max_history);
    }

    /// Append a user turn and the model's reply as one unit
    pub fn append_exchange(
        &self,
        session_id: &str,
        user_text: impl Into<String>,
        model_text: impl Into<String>,
    ) {
        let mut sessions = self.sessions.lock();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Turn::user(user_text));
        history.push(Turn::model(model_text));
        truncate(history, self.max_history);
    }

    /// Remove a session. Unknown ids are ignored.
    pub fn clear(&self, session_id: &str) {
        if self.sessions.lock().remove(session_id).is_some() {
            debug!("Cleared session {}", session_id);
        }
    }

    /// All tracked session ids, in no particular order
    pub fn list_sessions(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

fn truncate(history: &mut Vec<Turn>, max: usize) {
    if history.len() > max {
        let excess = history.len() - max;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_history_creates_empty_session() {
        let store = SessionStore::default();
        assert!(store.list_sessions().is_empty());

        let history = store.get_history("fresh");
        assert!(history.is_empty());
        assert_eq!(store.list_sessions(), vec!["fresh".to_string()]);
    }

    #[test]
    fn test_append_preserves_order() {
        let store = SessionStore::default();
        store.append("s", Role::User, "first");
        store.append("s", Role::Model, "second");
        store.append("s", Role::User, "");

        let history = store.get_history("s");
        let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", ""]);
        assert_eq!(history[1].role, Role::Model);
        assert!(history[0].timestamp <= history[2].timestamp);
    }

    #[test]
    fn test_retention_keeps_most_recent() {
        for n in [0usize, 1, 19, 20, 21, 40] {
            let store = SessionStore::default();
            for i in 0..n {
                store.append("s", Role::User, format!("msg {}", i));
            }

            let history = store.get_history("s");
            assert_eq!(history.len(), n.min(DEFAULT_MAX_HISTORY));
            if let Some(last) = history.last() {
                assert_eq!(last.content, format!("msg {}", n - 1));
            }
        }
    }

    #[test]
    fn test_twenty_five_appends_start_at_sixth() {
        let store = SessionStore::default();
        for i in 1..=25 {
            store.append("s", Role::User, format!("turn {}", i));
        }

        let history = store.get_history("s");
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].content, "turn 6");
        assert_eq!(history[19].content, "turn 25");
    }

    #[test]
    fn test_append_exchange_adds_pair() {
        let store = SessionStore::new(3);
        store.append("s", Role::User, "old");
        store.append_exchange("s", "question", "answer");
        store.append_exchange("s", "question 2", "answer 2");

        let history = store.get_history("s");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "answer");
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[2].role, Role::Model);
        assert_eq!(history[2].content, "answer 2");
    }

    #[test]
    fn test_clear_resets_session() {
        let store = SessionStore::default();
        store.append("s", Role::User, "hello");
        store.append("other", Role::User, "hello");

        store.clear("s");
        assert!(!store.list_sessions().contains(&"s".to_string()));
        assert!(store.get_history("s").is_empty());

        store.clear("never-existed");
        assert_eq!(store.get_history("other").len(), 1);
    }

    #[test]
    fn test_list_sessions() {
        let store = SessionStore::default();
        store.append("a", Role::User, "x");
        store.get_history("b");

        let mut ids = store.list_sessions();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_concurrent_exchanges_do_not_interleave() {
        let store = Arc::new(SessionStore::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.append_exchange("shared", format!("q{}-{}", t, i), format!("a{}-{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = store.get_history("shared");
        assert_eq!(history.len(), 800);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Model);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }
}
