//! Conversation turn data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Wire name used in history payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    /// Human label used when rendering a transcript into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Model => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded message in a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Message role
    pub role: Role,
    /// Message content
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new turn stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::User.label(), "User");
        assert_eq!(Role::Model.label(), "Assistant");
        assert_eq!(Role::Model.to_string(), "model");
    }

    #[test]
    fn test_turn_serializes_lowercase_role() {
        let turn = Turn::model("Hello!");
        let value = serde_json::to_value(&turn).unwrap();

        assert_eq!(value["role"], "model");
        assert_eq!(value["content"], "Hello!");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_turn_round_trips_from_history_payload() {
        let raw = r#"{"role":"user","content":"Hi","timestamp":"2025-01-01T00:00:00Z"}"#;
        let turn: Turn = serde_json::from_str(raw).unwrap();
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hi");
    }
}
